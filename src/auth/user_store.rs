//! User Storage
//! Mission: Durable account records with SQLite, unique email enforcement

use crate::auth::models::{Role, User};
use crate::auth::password;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

/// Store-level failure
#[derive(Debug)]
pub enum UserStoreError {
    /// Unique-index violation on email; raised atomically by the insert
    /// itself, never by a check-then-insert.
    DuplicateEmail,
    NotFound,
    Hash(anyhow::Error),
    Db(rusqlite::Error),
}

impl std::fmt::Display for UserStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStoreError::DuplicateEmail => write!(f, "Email already registered"),
            UserStoreError::NotFound => write!(f, "User not found"),
            UserStoreError::Hash(e) => write!(f, "Hashing error: {}", e),
            UserStoreError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for UserStoreError {}

impl From<rusqlite::Error> for UserStoreError {
    fn from(e: rusqlite::Error) -> Self {
        UserStoreError::Db(e)
    }
}

/// New account parameters; the plaintext password is hashed inside
/// `create_user` and never stored on this struct beyond the call.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub role: Role,
    pub stall_id: Option<i64>,
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self, UserStoreError> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<(), UserStoreError> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                phone TEXT,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                stall_id INTEGER,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.create_default_admin(&conn)?;

        Ok(())
    }

    /// Seed a default admin account for initial setup.
    fn create_default_admin(&self, conn: &Connection) -> Result<(), UserStoreError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;

        if count == 0 {
            let password_hash = password::hash("admin1234").map_err(UserStoreError::Hash)?;
            let admin = User {
                id: Uuid::new_v4(),
                email: "admin@example.com".to_string(),
                name: "Admin".to_string(),
                phone: None,
                password_hash,
                role: Role::Admin,
                stall_id: None,
                created_at: Utc::now().to_rfc3339(),
            };

            conn.execute(
                "INSERT INTO users (id, email, name, phone, password_hash, role, stall_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    admin.id.to_string(),
                    admin.email,
                    admin.name,
                    admin.phone,
                    admin.password_hash,
                    admin.role.as_str(),
                    admin.stall_id,
                    admin.created_at,
                ],
            )?;

            info!("Default admin created (email: admin@example.com, password: admin1234)");
            warn!("Change the default admin password before exposing this service");
        }

        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let id_str: String = row.get(0)?;
        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let role_str: String = row.get(5)?;

        Ok(User {
            id,
            email: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            password_hash: row.get(4)?,
            role: Role::from_str(&role_str).unwrap_or(Role::User),
            stall_id: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    const USER_COLUMNS: &'static str =
        "id, email, name, phone, password_hash, role, stall_id, created_at";

    /// Look up a user by email; `Ok(None)` when absent.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let conn = Connection::open(&self.db_path)?;
        let sql = format!("SELECT {} FROM users WHERE email = ?1", Self::USER_COLUMNS);
        let user = conn
            .query_row(&sql, params![email], Self::row_to_user)
            .optional()?;
        Ok(user)
    }

    /// Look up a user by id; `Ok(None)` when absent.
    pub fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, UserStoreError> {
        let conn = Connection::open(&self.db_path)?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", Self::USER_COLUMNS);
        let user = conn
            .query_row(&sql, params![id.to_string()], Self::row_to_user)
            .optional()?;
        Ok(user)
    }

    /// Create a new account. The hash is computed here, once, at creation
    /// time; the unique index on email rejects a duplicate insert atomically.
    pub fn create_user(&self, new: NewUser<'_>) -> Result<User, UserStoreError> {
        let password_hash = password::hash(new.password).map_err(UserStoreError::Hash)?;

        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            name: new.name.to_string(),
            phone: new.phone.map(|p| p.to_string()),
            password_hash,
            role: new.role,
            stall_id: new.stall_id,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)?;
        let result = conn.execute(
            "INSERT INTO users (id, email, name, phone, password_hash, role, stall_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.email,
                user.name,
                user.phone,
                user.password_hash,
                user.role.as_str(),
                user.stall_id,
                user.created_at,
            ],
        );

        match result {
            Ok(_) => {
                info!("Created user: {} ({})", user.email, user.role.as_str());
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(UserStoreError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update profile fields (name, phone) without touching credentials.
    pub fn update_profile(
        &self,
        id: &Uuid,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, UserStoreError> {
        let conn = Connection::open(&self.db_path)?;

        let rows = conn.execute(
            "UPDATE users SET
                name = COALESCE(?2, name),
                phone = COALESCE(?3, phone)
             WHERE id = ?1",
            params![id.to_string(), name, phone],
        )?;

        if rows == 0 {
            return Err(UserStoreError::NotFound);
        }

        self.get_user_by_id(id)?.ok_or(UserStoreError::NotFound)
    }

    /// List all users (admin only).
    pub fn list_users(&self) -> Result<Vec<User>, UserStoreError> {
        let conn = Connection::open(&self.db_path)?;
        let sql = format!("SELECT {} FROM users ORDER BY created_at", Self::USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Delete a user by id (admin only).
    pub fn delete_user(&self, id: &Uuid) -> Result<(), UserStoreError> {
        let conn = Connection::open(&self.db_path)?;

        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
        if rows == 0 {
            return Err(UserStoreError::NotFound);
        }

        info!("Deleted user: {}", id);
        Ok(())
    }
}

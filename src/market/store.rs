//! Market Storage
//! Mission: Stall and booking persistence with SQLite

use crate::market::models::{Booking, BookingStatus, Stall, StallStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

/// Store-level failure
#[derive(Debug)]
pub enum MarketStoreError {
    DuplicateStallNumber,
    StallNotFound,
    BookingNotFound,
    Db(rusqlite::Error),
}

impl std::fmt::Display for MarketStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketStoreError::DuplicateStallNumber => write!(f, "Stall number already exists"),
            MarketStoreError::StallNotFound => write!(f, "Stall not found"),
            MarketStoreError::BookingNotFound => write!(f, "Booking not found"),
            MarketStoreError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for MarketStoreError {}

impl From<rusqlite::Error> for MarketStoreError {
    fn from(e: rusqlite::Error) -> Self {
        MarketStoreError::Db(e)
    }
}

/// Stall and booking storage with SQLite backend
pub struct MarketStore {
    db_path: String,
}

impl MarketStore {
    /// Create a new market store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self, MarketStoreError> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Open a connection with foreign keys switched on; SQLite leaves them
    /// off per connection unless asked.
    fn open(&self) -> Result<Connection, MarketStoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<(), MarketStoreError> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS stalls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stall_number TEXT UNIQUE NOT NULL,
                size TEXT NOT NULL,
                price_per_day REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'available',
                image_url TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                stall_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                FOREIGN KEY (stall_id) REFERENCES stalls(id) ON DELETE CASCADE
            )",
            [],
        )?;

        Ok(())
    }

    fn row_to_stall(row: &rusqlite::Row<'_>) -> rusqlite::Result<Stall> {
        let status_str: String = row.get(4)?;
        Ok(Stall {
            id: row.get(0)?,
            stall_number: row.get(1)?,
            size: row.get(2)?,
            price_per_day: row.get(3)?,
            status: StallStatus::from_str(&status_str).unwrap_or(StallStatus::Available),
            image_url: row.get(5)?,
        })
    }

    fn row_to_booking(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
        let status_str: String = row.get(5)?;
        Ok(Booking {
            id: row.get(0)?,
            user_id: row.get(1)?,
            stall_id: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            status: BookingStatus::from_str(&status_str).unwrap_or(BookingStatus::Pending),
            created_at: row.get(6)?,
        })
    }

    // ===== Stalls =====

    pub fn list_stalls(&self) -> Result<Vec<Stall>, MarketStoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, stall_number, size, price_per_day, status, image_url
             FROM stalls ORDER BY stall_number",
        )?;
        let stalls = stmt
            .query_map([], Self::row_to_stall)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stalls)
    }

    pub fn get_stall(&self, id: i64) -> Result<Option<Stall>, MarketStoreError> {
        let conn = self.open()?;
        let stall = conn
            .query_row(
                "SELECT id, stall_number, size, price_per_day, status, image_url
                 FROM stalls WHERE id = ?1",
                params![id],
                Self::row_to_stall,
            )
            .optional()?;
        Ok(stall)
    }

    pub fn get_stall_by_number(&self, number: &str) -> Result<Option<Stall>, MarketStoreError> {
        let conn = self.open()?;
        let stall = conn
            .query_row(
                "SELECT id, stall_number, size, price_per_day, status, image_url
                 FROM stalls WHERE stall_number = ?1",
                params![number],
                Self::row_to_stall,
            )
            .optional()?;
        Ok(stall)
    }

    /// Insert a stall; the unique index on stall_number rejects duplicates
    /// atomically.
    pub fn create_stall(
        &self,
        stall_number: &str,
        size: &str,
        price_per_day: f64,
        image_url: Option<&str>,
    ) -> Result<Stall, MarketStoreError> {
        let conn = self.open()?;
        let result = conn.execute(
            "INSERT INTO stalls (stall_number, size, price_per_day, status, image_url)
             VALUES (?1, ?2, ?3, 'available', ?4)",
            params![stall_number, size, price_per_day, image_url],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                info!("Created stall {} ({})", stall_number, id);
                self.get_stall(id)?.ok_or(MarketStoreError::StallNotFound)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(MarketStoreError::DuplicateStallNumber)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Partial update; `None` fields keep their current value.
    pub fn update_stall(
        &self,
        id: i64,
        stall_number: Option<&str>,
        size: Option<&str>,
        price_per_day: Option<f64>,
        status: Option<StallStatus>,
        image_url: Option<&str>,
    ) -> Result<Stall, MarketStoreError> {
        let conn = self.open()?;
        let result = conn.execute(
            "UPDATE stalls SET
                stall_number = COALESCE(?2, stall_number),
                size = COALESCE(?3, size),
                price_per_day = COALESCE(?4, price_per_day),
                status = COALESCE(?5, status),
                image_url = COALESCE(?6, image_url)
             WHERE id = ?1",
            params![
                id,
                stall_number,
                size,
                price_per_day,
                status.map(|s| s.as_str().to_string()),
                image_url,
            ],
        );

        match result {
            Ok(0) => Err(MarketStoreError::StallNotFound),
            Ok(_) => self.get_stall(id)?.ok_or(MarketStoreError::StallNotFound),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(MarketStoreError::DuplicateStallNumber)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_stall(&self, id: i64) -> Result<(), MarketStoreError> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM stalls WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(MarketStoreError::StallNotFound);
        }
        info!("Deleted stall {}", id);
        Ok(())
    }

    // ===== Bookings =====

    /// Create a pending booking for an existing stall.
    pub fn create_booking(
        &self,
        user_id: &Uuid,
        stall_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> Result<Booking, MarketStoreError> {
        let conn = self.open()?;

        // The FK constraint rejects unknown stalls atomically on insert;
        // no separate existence check that could race with a deletion.
        let result = conn.execute(
            "INSERT INTO bookings (user_id, stall_id, start_date, end_date, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            params![
                user_id.to_string(),
                stall_id,
                start_date,
                end_date,
                Utc::now().to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(MarketStoreError::StallNotFound);
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        info!("Created booking {} (user {}, stall {})", id, user_id, stall_id);
        self.get_booking(id)?.ok_or(MarketStoreError::BookingNotFound)
    }

    pub fn get_booking(&self, id: i64) -> Result<Option<Booking>, MarketStoreError> {
        let conn = self.open()?;
        let booking = conn
            .query_row(
                "SELECT id, user_id, stall_id, start_date, end_date, status, created_at
                 FROM bookings WHERE id = ?1",
                params![id],
                Self::row_to_booking,
            )
            .optional()?;
        Ok(booking)
    }

    /// All bookings, newest first (admin view).
    pub fn list_bookings(&self) -> Result<Vec<Booking>, MarketStoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, stall_id, start_date, end_date, status, created_at
             FROM bookings ORDER BY created_at DESC",
        )?;
        let bookings = stmt
            .query_map([], Self::row_to_booking)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    /// Bookings belonging to one user, newest first.
    pub fn list_bookings_for_user(&self, user_id: &Uuid) -> Result<Vec<Booking>, MarketStoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, stall_id, start_date, end_date, status, created_at
             FROM bookings WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let bookings = stmt
            .query_map(params![user_id.to_string()], Self::row_to_booking)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    pub fn update_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> Result<Booking, MarketStoreError> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE bookings SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if rows == 0 {
            return Err(MarketStoreError::BookingNotFound);
        }

        info!("Booking {} -> {}", id, status.as_str());
        self.get_booking(id)?.ok_or(MarketStoreError::BookingNotFound)
    }
}

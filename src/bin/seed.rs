//! Seed tool: loads a sample user and stalls into the database.
//!
//! Idempotent; records that already exist are skipped.

use anyhow::Result;
use marketstall_backend::auth::models::Role;
use marketstall_backend::auth::user_store::{NewUser, UserStore, UserStoreError};
use marketstall_backend::config::Config;
use marketstall_backend::market::store::{MarketStore, MarketStoreError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    // UserStore::new seeds the default admin on first run
    let users = UserStore::new(&config.database_path)?;
    let market = MarketStore::new(&config.database_path)?;

    match users.create_user(NewUser {
        email: "user1@example.com",
        password: "user1234",
        name: "User One",
        phone: Some("0812345678"),
        role: Role::User,
        stall_id: None,
    }) {
        Ok(u) => println!("Created user: {}", u.email),
        Err(UserStoreError::DuplicateEmail) => println!("User exists: user1@example.com"),
        Err(e) => return Err(e.into()),
    }

    let stalls = [
        ("A1", "2x2", 100.0, "/uploads/1.jpg"),
        ("A2", "2x2", 120.0, "/uploads/2.jpg"),
        ("B1", "3x2", 150.0, "/uploads/3.jpg"),
        ("C1", "2x3", 130.0, "/uploads/4.jpg"),
        ("C2", "2x3", 140.0, "/uploads/5.jpg"),
    ];

    for (number, size, price, image) in stalls {
        match market.create_stall(number, size, price, Some(image)) {
            Ok(_) => println!("Created stall: {}", number),
            Err(MarketStoreError::DuplicateStallNumber) => println!("Stall exists: {}", number),
            Err(e) => return Err(e.into()),
        }
    }

    println!("Seed complete: {}", config.database_path);
    Ok(())
}

//! Demo seed script
//!
//! Seeds the database with demo accounts and one week of menus:
//! - 1 admin (admin@kantine.example) and 2 employees, one per location
//! - Two menu options per weekday for the current calendar week, with
//!   ordering deadlines at 09:00 UTC of the respective day
//!
//! Usage:
//!   DATABASE_URL=... DEMO_PASSWORD=Kantine2026! ./seed-demo
//!
//! Environment variables:
//!   DATABASE_URL   — PostgreSQL connection string (required)
//!   DEMO_PASSWORD  — Password for all demo accounts (default: Kantine2026!)

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use std::env;
use uuid::Uuid;

use kantine_api::models::menu::Weekday;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let demo_password = env::var("DEMO_PASSWORD").unwrap_or_else(|_| "Kantine2026!".to_string());

    println!("=== Seed Demo Data ===");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let password_hash = bcrypt::hash(&demo_password, 12)?;

    let accounts: [(&str, &str, &str, &str, &str); 3] = [
        ("admin@kantine.example", "Karin", "Admin", "Südpol", "admin"),
        ("erika@kantine.example", "Erika", "Muster", "Südpol", "user"),
        ("max@kantine.example", "Max", "Muster", "Nordpol", "user"),
    ];

    for (email, firstname, lastname, location, role) in accounts {
        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&pool)
            .await?;
        if existing.is_some() {
            println!("  {email} already exists, skipping");
            continue;
        }

        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&pool)
        .await?;
        sqlx::query(
            "INSERT INTO profiles (user_id, firstname, lastname, location) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(firstname)
        .bind(lastname)
        .bind(location)
        .execute(&pool)
        .await?;
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role)
            .execute(&pool)
            .await?;
        println!("  Created {role} {email} ({firstname} {lastname}, {location})");
    }

    // Menus for the current calendar week
    let now = Utc::now();
    let week = now.iso_week().week().min(52) as i32;
    let year = now.iso_week().year();

    let dishes = [
        ("Spaghetti Bolognese", "Gemüselasagne"),
        ("Hähnchencurry", "Linsensuppe"),
        ("Schnitzel mit Pommes", "Käsespätzle"),
        ("Fischfilet", "Gemüsepfanne"),
        ("Pizza Margherita", "Salatteller"),
    ];

    for (i, day) in Weekday::ALL.iter().enumerate() {
        let date = NaiveDate::from_isoywd_opt(year, week as u32, weekday_of(i))
            .context("invalid ISO week date")?;
        let deadline = Utc
            .from_utc_datetime(&date.and_hms_opt(9, 0, 0).context("invalid time")?);

        let (dish1, dish2) = dishes[i];
        for (label, name) in [("Menü 1", dish1), ("Menü 2", dish2)] {
            sqlx::query(
                "INSERT INTO menu_options (week, weekday, label, name, deadline)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (week, weekday, label) DO UPDATE SET
                     name = EXCLUDED.name,
                     deadline = EXCLUDED.deadline,
                     updated_at = NOW()",
            )
            .bind(week)
            .bind(day.as_str())
            .bind(label)
            .bind(name)
            .bind(deadline)
            .execute(&pool)
            .await?;
        }
        println!("  KW {week} {day}: {dish1} / {dish2} (Frist {deadline})");
    }

    println!("Done.");
    Ok(())
}

fn weekday_of(index: usize) -> chrono::Weekday {
    match index {
        0 => chrono::Weekday::Mon,
        1 => chrono::Weekday::Tue,
        2 => chrono::Weekday::Wed,
        3 => chrono::Weekday::Thu,
        _ => chrono::Weekday::Fri,
    }
}

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::{
    menu::{MenuOption, Weekday},
    order::{DaySelection, Order},
};
use crate::services::ordering::{
    self, MenuIndex, OrderIdentity, OrderRecord, Selection,
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Ungültige Kalenderwoche: {0}")]
    InvalidWeek(i32),
    #[error("Unbekannter Wochentag: {0}")]
    UnknownWeekday(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub struct OrderService;

impl OrderService {
    /// A user's orders for one week, ordered by primary key so that the
    /// reconciler's "last row wins" rule is deterministic.
    pub async fn for_user(pool: &PgPool, name: &str, week: i32) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, Order>(
            "SELECT id, name, week, location, weekday, menu, menu_number, status, updated_at
             FROM orders WHERE name = $1 AND week = $2
             ORDER BY id",
        )
        .bind(name)
        .bind(week)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// All orders, for the admin table and the CSV export.
    pub async fn list_all(pool: &PgPool) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, Order>(
            "SELECT id, name, week, location, weekday, menu, menu_number, status, updated_at
             FROM orders
             ORDER BY week, name, id",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Compile and persist a submission. The week's menu is re-queried inside
    /// the transaction so deadlines are checked against submit time, and all
    /// compiled records are upserted atomically — either the whole submission
    /// applies or none of it does.
    pub async fn submit(
        pool: &PgPool,
        name: &str,
        location: &str,
        week: i32,
        selections: &[DaySelection],
    ) -> Result<Vec<OrderRecord>, SubmitError> {
        if !(1..=52).contains(&week) {
            return Err(SubmitError::InvalidWeek(week));
        }

        let mut by_day: BTreeMap<Weekday, Selection> = BTreeMap::new();
        for sel in selections {
            let day: Weekday = sel
                .weekday
                .parse()
                .map_err(|_| SubmitError::UnknownWeekday(sel.weekday.clone()))?;
            let choice = match &sel.menu {
                Some(menu) => Selection::Meal(menu.clone()),
                None => Selection::NoMeal,
            };
            by_day.insert(day, choice);
        }

        let mut tx = pool.begin().await?;

        let options = sqlx::query_as::<_, MenuOption>(
            "SELECT id, week, weekday, label, name, deadline, created_at, updated_at
             FROM menu_options WHERE week = $1
             ORDER BY id",
        )
        .bind(week)
        .fetch_all(&mut *tx)
        .await?;

        let index = MenuIndex::build(options);
        let identity = OrderIdentity { name, week, location };
        let records = ordering::compile_orders(&index, &by_day, identity, Utc::now());

        for record in &records {
            sqlx::query(
                "INSERT INTO orders (name, week, location, weekday, menu, menu_number, status)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (name, week, location, weekday) DO UPDATE SET
                     menu = EXCLUDED.menu,
                     menu_number = EXCLUDED.menu_number,
                     status = EXCLUDED.status,
                     updated_at = NOW()",
            )
            .bind(&record.name)
            .bind(record.week)
            .bind(&record.location)
            .bind(record.weekday.as_str())
            .bind(&record.menu)
            .bind(record.menu_number)
            .bind(record.status.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(records)
    }
}

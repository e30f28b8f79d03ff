use sqlx::PgPool;

use crate::models::menu::{MenuOption, UpsertMenuRequest};

pub struct MenuService;

impl MenuService {
    /// All options of one week, ordered by primary key — the menu index
    /// preserves this order, so with duplicate names the lowest id wins.
    pub async fn list_week(pool: &PgPool, week: i32) -> anyhow::Result<Vec<MenuOption>> {
        let options = sqlx::query_as::<_, MenuOption>(
            "SELECT id, week, weekday, label, name, deadline, created_at, updated_at
             FROM menu_options WHERE week = $1
             ORDER BY id",
        )
        .bind(week)
        .fetch_all(pool)
        .await?;
        Ok(options)
    }

    /// Insert or update the option in the (week, weekday, label) slot.
    pub async fn upsert(pool: &PgPool, req: &UpsertMenuRequest) -> anyhow::Result<MenuOption> {
        let option = sqlx::query_as::<_, MenuOption>(
            "INSERT INTO menu_options (week, weekday, label, name, deadline)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (week, weekday, label) DO UPDATE SET
                 name = EXCLUDED.name,
                 deadline = EXCLUDED.deadline,
                 updated_at = NOW()
             RETURNING id, week, weekday, label, name, deadline, created_at, updated_at",
        )
        .bind(req.week)
        .bind(&req.weekday)
        .bind(&req.label)
        .bind(&req.name)
        .bind(req.deadline)
        .fetch_one(pool)
        .await?;
        Ok(option)
    }

    /// Returns false when no row had this id.
    pub async fn delete(pool: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM menu_options WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Gauge, GaugeVec,
};
use sqlx::PgPool;
use tracing::warn;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login-Versuche nach Status",
        &["status"]
    ).unwrap();

    pub static ref REGISTRATIONS_COUNTER: Counter = register_counter!(
        "api_registrations_total",
        "Abgeschlossene Registrierungen"
    ).unwrap();

    pub static ref PASSWORD_RESETS_COUNTER: Counter = register_counter!(
        "api_password_resets_total",
        "Angeforderte Passwort-Zurücksetzungen"
    ).unwrap();

    pub static ref ORDERS_SUBMITTED_COUNTER: CounterVec = register_counter_vec!(
        "api_orders_submitted_total",
        "Gespeicherte Bestelltage nach Standort",
        &["location"]
    ).unwrap();

    pub static ref EXPORTS_COUNTER: Counter = register_counter!(
        "api_order_exports_total",
        "Heruntergeladene CSV-Exporte"
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref USERS_GAUGE: GaugeVec = register_gauge_vec!(
        "kantine_users_total",
        "Benutzer nach Rolle",
        &["role"]
    ).unwrap();

    pub static ref ORDERS_GAUGE: GaugeVec = register_gauge_vec!(
        "kantine_orders_total",
        "Bestellungen nach Status",
        &["status"]
    ).unwrap();

    pub static ref MENU_OPTIONS_GAUGE: Gauge = register_gauge!(
        "kantine_menu_options_total",
        "Angelegte Menüoptionen"
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        // Initial collection on startup
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    // Users by role; a missing user_roles row counts as "user"
    let user_counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT COALESCE(r.role, 'user'), COUNT(*)::BIGINT
         FROM users u LEFT JOIN user_roles r ON u.id = r.user_id
         GROUP BY 1",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();
    for (role, count) in user_counts {
        USERS_GAUGE.with_label_values(&[&role]).set(count as f64);
    }

    let order_counts: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*)::BIGINT FROM orders GROUP BY status")
            .fetch_all(pool)
            .await
            .unwrap_or_default();
    for (status, count) in order_counts {
        ORDERS_GAUGE.with_label_values(&[&status]).set(count as f64);
    }

    let menu_options: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM menu_options")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    MENU_OPTIONS_GAUGE.set(menu_options as f64);

    Ok(())
}

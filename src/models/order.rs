use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    #[serde(rename = "bestellt")]
    Bestellt,
    #[serde(rename = "abbestellt")]
    Abbestellt,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Bestellt => "bestellt",
            OrderStatus::Abbestellt => "abbestellt",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bestellt" => Ok(OrderStatus::Bestellt),
            "abbestellt" => Ok(OrderStatus::Abbestellt),
            _ => Err(anyhow::anyhow!("Unbekannter Status: {s}")),
        }
    }
}

/// Persisted order row. Unique per (name, week, location, weekday); an empty
/// `menu` together with status "abbestellt" means "no meal". Never deleted by
/// users — re-submission overwrites via the conflict key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub name: String,
    pub week: i32,
    pub location: String,
    pub weekday: String,
    pub menu: String,
    pub menu_number: i32,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// One submitted weekday choice. `menu: None` is the explicit "Kein Essen"
/// selection; a weekday absent from the submission writes nothing for that day.
#[derive(Debug, Clone, Deserialize)]
pub struct DaySelection {
    pub weekday: String,
    pub menu: Option<String>,
}

/// Body for POST /orders.
#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub week: i32,
    pub selections: Vec<DaySelection>,
}

/// Query params for GET /orders.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub week: i32,
}

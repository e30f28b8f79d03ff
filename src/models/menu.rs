use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ordering weekdays, Montag through Freitag. The derived `Ord` follows the
/// declaration order, so Montag sorts first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Montag,
    Dienstag,
    Mittwoch,
    Donnerstag,
    Freitag,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Montag,
        Weekday::Dienstag,
        Weekday::Mittwoch,
        Weekday::Donnerstag,
        Weekday::Freitag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Montag => "Montag",
            Weekday::Dienstag => "Dienstag",
            Weekday::Mittwoch => "Mittwoch",
            Weekday::Donnerstag => "Donnerstag",
            Weekday::Freitag => "Freitag",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Weekday {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Montag" => Ok(Weekday::Montag),
            "Dienstag" => Ok(Weekday::Dienstag),
            "Mittwoch" => Ok(Weekday::Mittwoch),
            "Donnerstag" => Ok(Weekday::Donnerstag),
            "Freitag" => Ok(Weekday::Freitag),
            _ => Err(anyhow::anyhow!("Unbekannter Wochentag: {s}")),
        }
    }
}

/// One selectable dish for a given week and weekday. Weekday is stored as
/// TEXT and parsed at the boundaries; `deadline`, if present and passed,
/// closes the option for ordering.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuOption {
    pub id: i64,
    pub week: i32,
    pub weekday: String,
    pub label: String,
    pub name: String,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for PUT /menus — conflict key is (week, weekday, label).
#[derive(Debug, Deserialize)]
pub struct UpsertMenuRequest {
    pub week: i32,
    pub weekday: String,
    pub label: String,
    pub name: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// Query params for GET /menus.
#[derive(Debug, Deserialize)]
pub struct MenuWeekQuery {
    /// Calendar week number (1–52).
    pub week: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(day.as_str().parse::<Weekday>().unwrap(), day);
        }
        assert!("Samstag".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_weekday_order() {
        let mut days = vec![Weekday::Freitag, Weekday::Montag, Weekday::Mittwoch];
        days.sort();
        assert_eq!(days, vec![Weekday::Montag, Weekday::Mittwoch, Weekday::Freitag]);
    }
}

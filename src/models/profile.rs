use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The two cafeteria sites.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Location {
    #[serde(rename = "Südpol")]
    Suedpol,
    #[serde(rename = "Nordpol")]
    Nordpol,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Location::Suedpol => "Südpol",
            Location::Nordpol => "Nordpol",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Südpol" => Ok(Location::Suedpol),
            "Nordpol" => Ok(Location::Nordpol),
            _ => Err(anyhow::anyhow!("Unbekannter Standort: {s}")),
        }
    }
}

/// Created at registration together with the user row; never edited in-app.
/// Location is stored as TEXT and parsed at the boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Orders are keyed by this display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_round_trip() {
        assert_eq!("Südpol".parse::<Location>().unwrap(), Location::Suedpol);
        assert_eq!(Location::Nordpol.to_string(), "Nordpol");
        assert!("Westpol".parse::<Location>().is_err());
    }
}

//! Order-eligibility and reconciliation logic, kept free of I/O so it can be
//! exercised directly in tests. The service layer queries rows, calls in here
//! and persists whatever comes back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::models::menu::{MenuOption, Weekday};
use crate::models::order::{Order, OrderStatus};

/// True once a deadline has passed. Absent deadlines never expire.
pub fn is_expired(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| now > d)
}

/// A user's choice for one weekday. "Kein Essen" is an explicit choice,
/// distinct from not having selected anything for the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Meal(String),
    NoMeal,
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::Meal(name) => serializer.serialize_str(name),
            Selection::NoMeal => serializer.serialize_none(),
        }
    }
}

/// Menu option rows of one week grouped by weekday. Insertion order (rows
/// arrive ordered by primary key) is preserved; duplicates are allowed.
/// The "Kein Essen" choice is an implicit member of every weekday and never
/// expires, so it is not materialized here.
#[derive(Debug, Default)]
pub struct MenuIndex {
    by_day: BTreeMap<Weekday, Vec<MenuOption>>,
}

impl MenuIndex {
    pub fn build(options: Vec<MenuOption>) -> Self {
        let mut by_day: BTreeMap<Weekday, Vec<MenuOption>> = BTreeMap::new();
        for opt in options {
            // Weekday values are constrained in the schema; rows that fail to
            // parse cannot come from our own writes and are skipped.
            let Ok(day) = opt.weekday.parse::<Weekday>() else {
                continue;
            };
            by_day.entry(day).or_default().push(opt);
        }
        Self { by_day }
    }

    pub fn options_for(&self, day: Weekday) -> &[MenuOption] {
        self.by_day.get(&day).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// First option matching `name` for the day. With duplicate names the
    /// lowest id wins, which pins down the deadline and label used for the
    /// submission.
    pub fn find(&self, day: Weekday, name: &str) -> Option<&MenuOption> {
        self.options_for(day).iter().find(|o| o.name == name)
    }
}

/// Identity fields stamped onto every compiled record.
#[derive(Debug, Clone, Copy)]
pub struct OrderIdentity<'a> {
    pub name: &'a str,
    pub week: i32,
    pub location: &'a str,
}

/// Upsert-ready order record; conflict key is (name, week, location, weekday).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub name: String,
    pub week: i32,
    pub location: String,
    pub weekday: Weekday,
    pub menu: String,
    pub menu_number: i32,
    pub status: OrderStatus,
}

/// Map prior order rows to pre-selection state. Rows arrive in id-ascending
/// query order; the last row per weekday wins, so with duplicates the highest
/// id (most recent write) decides.
pub fn reconcile_selections(orders: &[Order]) -> BTreeMap<Weekday, Selection> {
    let mut out = BTreeMap::new();
    for order in orders {
        let Ok(day) = order.weekday.parse::<Weekday>() else {
            continue;
        };
        let selection = if order.menu.is_empty() {
            Selection::NoMeal
        } else {
            Selection::Meal(order.menu.clone())
        };
        out.insert(day, selection);
    }
    out
}

/// Turn the submitted selections into upsert records. Emits one record per
/// weekday that has both a selection and an open matching option; everything
/// else is skipped so prior persisted state stays untouched. Deadlines are
/// evaluated against `now`, not against whatever the client saw at load time.
pub fn compile_orders(
    index: &MenuIndex,
    selections: &BTreeMap<Weekday, Selection>,
    identity: OrderIdentity<'_>,
    now: DateTime<Utc>,
) -> Vec<OrderRecord> {
    let mut records = Vec::new();
    for day in Weekday::ALL {
        let Some(selection) = selections.get(&day) else {
            continue;
        };
        let record = match selection {
            Selection::NoMeal => OrderRecord {
                name: identity.name.to_string(),
                week: identity.week,
                location: identity.location.to_string(),
                weekday: day,
                menu: String::new(),
                menu_number: 0,
                status: OrderStatus::Abbestellt,
            },
            Selection::Meal(menu) => {
                // No matching option means the client submitted against a menu
                // that no longer exists for this day; skip.
                let Some(option) = index.find(day, menu) else {
                    continue;
                };
                if is_expired(option.deadline, now) {
                    continue;
                }
                OrderRecord {
                    name: identity.name.to_string(),
                    week: identity.week,
                    location: identity.location.to_string(),
                    weekday: day,
                    menu: menu.clone(),
                    menu_number: menu_number_from_label(&option.label),
                    status: OrderStatus::Bestellt,
                }
            }
        };
        records.push(record);
    }
    records
}

/// "Menü 1" → 1, "Menü 2" → 2; anything else → 0.
fn menu_number_from_label(label: &str) -> i32 {
    label
        .strip_prefix("Menü ")
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewLine {
    pub weekday: Weekday,
    pub menu: String,
    pub status: String,
}

/// Overview of a user's week. An empty query result is the explicit NoOrders
/// sentinel rather than an empty list, so the caller can tell "nothing found"
/// apart from "not yet queried".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overview {
    NoOrders,
    Days(Vec<OverviewLine>),
}

/// Project order rows into a Montag..Freitag display list. Input order is
/// irrelevant; duplicate rows per weekday collapse to the last in query order.
pub fn project_overview(orders: &[Order]) -> Overview {
    if orders.is_empty() {
        return Overview::NoOrders;
    }
    let mut latest: BTreeMap<Weekday, &Order> = BTreeMap::new();
    for order in orders {
        let Ok(day) = order.weekday.parse::<Weekday>() else {
            continue;
        };
        latest.insert(day, order);
    }
    let lines = Weekday::ALL
        .iter()
        .filter_map(|day| {
            latest.get(day).map(|order| OverviewLine {
                weekday: *day,
                menu: if order.menu.is_empty() {
                    "-".to_string()
                } else {
                    order.menu.clone()
                },
                status: order.status.clone(),
            })
        })
        .collect();
    Overview::Days(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn option(id: i64, weekday: &str, label: &str, name: &str, deadline: Option<DateTime<Utc>>) -> MenuOption {
        MenuOption {
            id,
            week: 28,
            weekday: weekday.to_string(),
            label: label.to_string(),
            name: name.to_string(),
            deadline,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order_row(id: i64, weekday: &str, menu: &str, status: &str) -> Order {
        Order {
            id,
            name: "Erika Muster".to_string(),
            week: 28,
            location: "Südpol".to_string(),
            weekday: weekday.to_string(),
            menu: menu.to_string(),
            menu_number: 0,
            status: status.to_string(),
            updated_at: Utc::now(),
        }
    }

    fn identity() -> OrderIdentity<'static> {
        OrderIdentity {
            name: "Erika Muster",
            week: 28,
            location: "Südpol",
        }
    }

    #[test]
    fn test_expired_none_never_expires() {
        let now = Utc::now();
        assert!(!is_expired(None, now));
        assert!(!is_expired(None, now + Duration::days(365)));
    }

    #[test]
    fn test_expired_matches_comparison() {
        let now = Utc::now();
        assert!(is_expired(Some(now - Duration::hours(1)), now));
        assert!(!is_expired(Some(now + Duration::hours(1)), now));
        // Exactly at the deadline is still open
        assert!(!is_expired(Some(now), now));
    }

    #[test]
    fn test_menu_index_groups_and_preserves_order() {
        let index = MenuIndex::build(vec![
            option(1, "Montag", "Menü 1", "Spaghetti", None),
            option(2, "Dienstag", "Menü 1", "Eintopf", None),
            option(3, "Montag", "Menü 2", "Salat", None),
        ]);
        let montag: Vec<&str> = index
            .options_for(Weekday::Montag)
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(montag, vec!["Spaghetti", "Salat"]);
        assert!(index.options_for(Weekday::Freitag).is_empty());
    }

    #[test]
    fn test_menu_index_duplicate_names_lowest_id_wins() {
        let now = Utc::now();
        let index = MenuIndex::build(vec![
            option(1, "Montag", "Menü 1", "Spaghetti", Some(now - Duration::hours(1))),
            option(2, "Montag", "Menü 2", "Spaghetti", Some(now + Duration::hours(1))),
        ]);
        // The first row decides; its deadline has passed.
        let found = index.find(Weekday::Montag, "Spaghetti").unwrap();
        assert_eq!(found.id, 1);
    }

    #[test]
    fn test_reconcile_round_trip() {
        let rows = vec![
            order_row(1, "Montag", "Spaghetti", "bestellt"),
            order_row(2, "Dienstag", "", "abbestellt"),
            order_row(3, "Mittwoch", "Eintopf", "bestellt"),
        ];
        let selections = reconcile_selections(&rows);
        assert_eq!(
            selections.get(&Weekday::Montag),
            Some(&Selection::Meal("Spaghetti".to_string()))
        );
        assert_eq!(selections.get(&Weekday::Dienstag), Some(&Selection::NoMeal));
        assert_eq!(
            selections.get(&Weekday::Mittwoch),
            Some(&Selection::Meal("Eintopf".to_string()))
        );
        assert_eq!(selections.get(&Weekday::Donnerstag), None);
    }

    #[test]
    fn test_reconcile_duplicate_rows_last_wins() {
        let rows = vec![
            order_row(1, "Montag", "Spaghetti", "bestellt"),
            order_row(7, "Montag", "Salat", "bestellt"),
        ];
        let selections = reconcile_selections(&rows);
        assert_eq!(
            selections.get(&Weekday::Montag),
            Some(&Selection::Meal("Salat".to_string()))
        );
    }

    #[test]
    fn test_compile_skips_expired_day() {
        // Week 28, Südpol, Montag with deadline yesterday: selecting it must
        // produce nothing, even though the option was selectable at load time.
        let now = Utc::now();
        let index = MenuIndex::build(vec![option(
            1,
            "Montag",
            "Menü 1",
            "Menü 1",
            Some(now - Duration::days(1)),
        )]);
        let mut selections = BTreeMap::new();
        selections.insert(Weekday::Montag, Selection::Meal("Menü 1".to_string()));
        let records = compile_orders(&index, &selections, identity(), now);
        assert!(records.is_empty());
    }

    #[test]
    fn test_compile_open_day_emits_record() {
        let now = Utc::now();
        let index = MenuIndex::build(vec![option(
            1,
            "Montag",
            "Menü 1",
            "Menü 1",
            Some(now + Duration::days(1)),
        )]);
        let mut selections = BTreeMap::new();
        selections.insert(Weekday::Montag, Selection::Meal("Menü 1".to_string()));
        let records = compile_orders(&index, &selections, identity(), now);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weekday, Weekday::Montag);
        assert_eq!(records[0].menu, "Menü 1");
        assert_eq!(records[0].menu_number, 1);
        assert_eq!(records[0].status, OrderStatus::Bestellt);
        assert_eq!(records[0].name, "Erika Muster");
        assert_eq!(records[0].location, "Südpol");
    }

    #[test]
    fn test_compile_no_meal_emits_cancellation() {
        let index = MenuIndex::build(vec![option(1, "Dienstag", "Menü 1", "Eintopf", None)]);
        let mut selections = BTreeMap::new();
        selections.insert(Weekday::Dienstag, Selection::NoMeal);
        let records = compile_orders(&index, &selections, identity(), Utc::now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weekday, Weekday::Dienstag);
        assert_eq!(records[0].menu, "");
        assert_eq!(records[0].menu_number, 0);
        assert_eq!(records[0].status, OrderStatus::Abbestellt);
    }

    #[test]
    fn test_compile_unselected_days_emit_nothing() {
        let now = Utc::now();
        let index = MenuIndex::build(vec![
            option(1, "Montag", "Menü 1", "Spaghetti", None),
            option(2, "Dienstag", "Menü 1", "Eintopf", None),
        ]);
        let mut selections = BTreeMap::new();
        selections.insert(Weekday::Montag, Selection::Meal("Spaghetti".to_string()));
        let records = compile_orders(&index, &selections, identity(), now);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weekday, Weekday::Montag);
    }

    #[test]
    fn test_compile_unknown_menu_name_is_skipped() {
        let index = MenuIndex::build(vec![option(1, "Montag", "Menü 1", "Spaghetti", None)]);
        let mut selections = BTreeMap::new();
        selections.insert(Weekday::Montag, Selection::Meal("Pizza".to_string()));
        assert!(compile_orders(&index, &selections, identity(), Utc::now()).is_empty());
    }

    #[test]
    fn test_compile_deadline_crossing_between_load_and_submit() {
        // The option is open when the menu is loaded, expired by the time the
        // submission is compiled.
        let load_time = Utc::now();
        let deadline = load_time + Duration::minutes(5);
        let index = MenuIndex::build(vec![option(
            1,
            "Montag",
            "Menü 1",
            "Menü 1",
            Some(deadline),
        )]);
        assert!(!is_expired(Some(deadline), load_time));

        let mut selections = BTreeMap::new();
        selections.insert(Weekday::Montag, Selection::Meal("Menü 1".to_string()));
        let submit_time = load_time + Duration::minutes(10);
        assert!(compile_orders(&index, &selections, identity(), submit_time).is_empty());
    }

    #[test]
    fn test_menu_number_from_label() {
        assert_eq!(menu_number_from_label("Menü 1"), 1);
        assert_eq!(menu_number_from_label("Menü 2"), 2);
        assert_eq!(menu_number_from_label("Tagessuppe"), 0);
        assert_eq!(menu_number_from_label("Menü zwei"), 0);
    }

    #[test]
    fn test_overview_empty_is_sentinel() {
        assert_eq!(project_overview(&[]), Overview::NoOrders);
    }

    #[test]
    fn test_overview_orders_weekdays_regardless_of_input_order() {
        let rows = vec![
            order_row(3, "Freitag", "Fisch", "bestellt"),
            order_row(1, "Montag", "Spaghetti", "bestellt"),
            order_row(2, "Mittwoch", "", "abbestellt"),
        ];
        let Overview::Days(lines) = project_overview(&rows) else {
            panic!("expected Days");
        };
        let days: Vec<Weekday> = lines.iter().map(|l| l.weekday).collect();
        assert_eq!(days, vec![Weekday::Montag, Weekday::Mittwoch, Weekday::Freitag]);
        assert_eq!(lines[1].menu, "-");
        assert_eq!(lines[1].status, "abbestellt");
    }
}

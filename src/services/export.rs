use sqlx::PgPool;

use crate::models::order::Order;
use crate::services::orders::OrderService;

pub struct ExportService;

impl ExportService {
    /// CSV of all orders, computed in-service. Column layout matches the
    /// admin table: name, week, location, weekday, menu, menu_number, status.
    pub async fn orders_csv(pool: &PgPool) -> anyhow::Result<Vec<u8>> {
        let orders = OrderService::list_all(pool).await?;
        write_csv(&orders)
    }
}

fn write_csv(orders: &[Order]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "week", "location", "weekday", "menu", "menu_number", "status"])?;
    for order in orders {
        let week = order.week.to_string();
        let menu_number = order.menu_number.to_string();
        writer.write_record([
            order.name.as_str(),
            week.as_str(),
            order.location.as_str(),
            order.weekday.as_str(),
            order.menu.as_str(),
            menu_number.as_str(),
            order.status.as_str(),
        ])?;
    }
    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(name: &str, weekday: &str, menu: &str, menu_number: i32, status: &str) -> Order {
        Order {
            id: 1,
            name: name.to_string(),
            week: 28,
            location: "Südpol".to_string(),
            weekday: weekday.to_string(),
            menu: menu.to_string(),
            menu_number,
            status: status.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_csv_layout() {
        let rows = vec![
            order("Erika Muster", "Montag", "Menü 1", 1, "bestellt"),
            order("Max Muster", "Dienstag", "", 0, "abbestellt"),
        ];
        let bytes = write_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,week,location,weekday,menu,menu_number,status");
        assert_eq!(lines[1], "Erika Muster,28,Südpol,Montag,Menü 1,1,bestellt");
        assert_eq!(lines[2], "Max Muster,28,Südpol,Dienstag,,0,abbestellt");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let text = String::from_utf8(write_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.trim_end(), "name,week,location,weekday,menu,menu_number,status");
    }
}

pub mod bookings;
pub mod cart;
pub mod equipment;
pub mod fields;
pub mod login;
pub mod marketplace;
pub mod register;
pub mod transport;

use std::time::SystemTime;

use time::{macros::format_description, OffsetDateTime};

pub use bookings::BookingsPage;
pub use cart::CartPage;
pub use equipment::EquipmentPage;
pub use fields::FieldsPage;
pub use login::LoginPage;
pub use marketplace::MarketplacePage;
pub use register::RegisterPage;
pub use transport::TransportPage;

pub fn humanize_age(updated_at: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(updated_at)
        .unwrap_or_default()
        .as_secs();
    if age < 60 {
        format!("{age}s ago")
    } else if age < 3_600 {
        format!("{}m ago", age / 60)
    } else if age < 86_400 {
        format!("{}h ago", age / 3_600)
    } else {
        format!("{}d ago", age / 86_400)
    }
}

/// `12 Mar 2025, 09:30` in UTC.
pub fn format_date(at: OffsetDateTime) -> String {
    let format = format_description!("[day] [month repr:short] [year], [hour]:[minute]");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::datetime;

    #[test]
    fn ages_round_down_to_the_largest_unit() {
        let now = SystemTime::now();
        assert_eq!(humanize_age(now - Duration::from_secs(90)), "1m ago");
        assert_eq!(humanize_age(now - Duration::from_secs(7_200)), "2h ago");
        assert_eq!(humanize_age(now - Duration::from_secs(3 * 86_400)), "3d ago");
    }

    #[test]
    fn future_timestamps_read_as_just_now() {
        let ahead = SystemTime::now() + Duration::from_secs(120);
        assert_eq!(humanize_age(ahead), "0s ago");
    }

    #[test]
    fn dates_use_short_month_names() {
        assert_eq!(format_date(datetime!(2025-03-12 09:30 UTC)), "12 Mar 2025, 09:30");
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::cart::UnitKind;

/// Whole currency units (rupees). Every price in the app is integral.
pub type Rupees = i64;

/// Largest price accepted from the server for a listing or a day of rental.
pub const MAX_LISTED_PRICE: Rupees = 100_000_000;

/// Opaque identifier handed out by the server.
pub type EntityId = String;

pub const DEFAULT_COUNTRY: &str = "India";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Owner => "owner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Farmer",
            Role::Owner => "Equipment owner",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    /// Fixed once assigned.
    pub mobile_number: String,
    pub role: Role,
    /// Fixed once assigned at registration.
    pub farmer_id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub aadhaar_number: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl User {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentType {
    Tractor,
    Weeder,
    Tiller,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 3] = [
        EquipmentType::Tractor,
        EquipmentType::Weeder,
        EquipmentType::Tiller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Tractor => "tractor",
            EquipmentType::Weeder => "weeder",
            EquipmentType::Tiller => "tiller",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EquipmentType::Tractor => "Tractors",
            EquipmentType::Weeder => "Weeders",
            EquipmentType::Tiller => "Tillers",
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for EquipmentType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tractor" | "tractors" => Ok(EquipmentType::Tractor),
            "weeder" | "weeders" => Ok(EquipmentType::Weeder),
            "tiller" | "tillers" => Ok(EquipmentType::Tiller),
            _ => Err(UnknownVariant {
                kind: "equipment type",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Available,
    Rented,
    Maintenance,
}

impl Availability {
    pub fn label(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Rented => "Rented",
            Availability::Maintenance => "Under maintenance",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EntityId,
    pub owner_id: EntityId,
    pub equipment_type: EquipmentType,
    pub name: String,
    pub model_number: String,
    pub chassis_number: String,
    pub power: Option<String>,
    pub year: Option<i32>,
    pub price_per_day: Option<Rupees>,
    pub location: Option<String>,
    pub availability: Availability,
    pub image: Option<String>,
}

impl Equipment {
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }
}

/// Booking progress. `Completed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (*self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Payment pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: EntityId,
    pub user_id: EntityId,
    pub equipment_id: EntityId,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub total_cost: Rupees,
    pub security_deposit: Rupees,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Vehicle offered on the transport page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportVehicle {
    pub id: EntityId,
    pub name: String,
    pub vehicle_type: String,
    pub capacity: Option<String>,
    pub price_per_km: f64,
    /// Explicit trip duration in hours; derived from distance when absent.
    pub estimated_hours: Option<u32>,
    pub driver_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    pub seller: String,
    /// Price for one stored unit of `unit`.
    pub price: Rupees,
    pub unit: UnitKind,
    pub category: String,
    pub location: Option<String>,
    pub image: Option<String>,
}

/// Payload for listing a new product on the marketplace.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Rupees,
    pub unit: UnitKind,
    pub category: String,
    pub location: Option<String>,
}

/// A farm plot saved by the user, kept on the device only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarmField {
    pub id: String,
    pub name: String,
    pub crop: String,
    pub area_acres: f64,
    #[serde(default)]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BookingStatus::Pending, BookingStatus::Confirmed, true)]
    #[case(BookingStatus::Pending, BookingStatus::Cancelled, true)]
    #[case(BookingStatus::Confirmed, BookingStatus::Completed, true)]
    #[case(BookingStatus::Confirmed, BookingStatus::Cancelled, true)]
    #[case(BookingStatus::Pending, BookingStatus::Completed, false)]
    #[case(BookingStatus::Completed, BookingStatus::Cancelled, false)]
    #[case(BookingStatus::Cancelled, BookingStatus::Confirmed, false)]
    fn booking_status_transitions(
        #[case] from: BookingStatus,
        #[case] to: BookingStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn payment_status_moves_forward_only() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Paid));
    }

    #[rstest]
    #[case("tractor", EquipmentType::Tractor)]
    #[case("Weeders", EquipmentType::Weeder)]
    #[case(" TILLER ", EquipmentType::Tiller)]
    fn equipment_type_parses_route_segments(#[case] raw: &str, #[case] expected: EquipmentType) {
        assert_eq!(raw.parse::<EquipmentType>().unwrap(), expected);
    }

    #[test]
    fn unknown_equipment_type_is_rejected() {
        let err = "harvester".parse::<EquipmentType>().unwrap_err();
        assert_eq!(err.value, "harvester");
    }

    #[test]
    fn user_round_trips_through_json_with_missing_optionals() {
        let raw = r#"{
            "id": "u-1",
            "mobile_number": "9876543210",
            "role": "owner",
            "farmer_id": "FRM-1001",
            "name": "Lakshmi",
            "city": "Madurai",
            "country": "India"
        }"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert!(user.is_owner());
        assert!(user.aadhaar_number.is_none());
        assert!(user.created_at.is_none());
        assert!(!user.is_verified);
    }
}

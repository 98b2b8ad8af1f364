//! Port for the HARVTECH REST server.
//!
//! Flows in the domain talk to the server only through [`HarvtechApi`], so the
//! login and booking state machines run against a mock in tests.

use async_trait::async_trait;
use thiserror::Error;

use super::{
    booking::BookingRequest,
    entities::{Booking, Equipment, EquipmentType, NewProduct, Product, Role, TransportVehicle, User},
    session::Session,
};

/// Typed failure from the server or the transport underneath it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("request rejected: {0}")]
    Validation(String),
    #[error("not signed in or session expired")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the same request may succeed if the user tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Server { .. })
    }

    /// Short text for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(message) => format!("Please check your details: {message}"),
            ApiError::Unauthorized => "Please log in again.".to_string(),
            ApiError::NotFound(_) => "That item is no longer listed.".to_string(),
            ApiError::Conflict(message) => format!("Not possible right now: {message}"),
            ApiError::Server { .. } => "The server had a problem. Please try again.".to_string(),
            ApiError::Transport(_) => "No connection. Check your network and retry.".to_string(),
            ApiError::Decode(_) => "Received an unexpected reply from the server.".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub name: String,
    pub city: String,
    pub country: String,
    pub aadhaar_number: Option<String>,
    pub mobile_number: String,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OtpVerification {
    pub success: bool,
    pub user: Option<User>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HarvtechApi: Send + Sync {
    /// `POST /api/check-mobile`
    async fn check_mobile(&self, mobile_number: &str) -> Result<bool, ApiError>;

    /// `POST /api/send-otp`
    async fn send_otp(&self, mobile_number: &str) -> Result<(), ApiError>;

    /// `POST /api/verify-otp`
    async fn verify_otp(&self, mobile_number: &str, otp: &str) -> Result<OtpVerification, ApiError>;

    /// `POST /api/register`, returns the user with its farmer id.
    async fn register(&self, registration: &Registration) -> Result<User, ApiError>;

    /// `GET /api/equipment/:type`
    async fn equipment_by_type(&self, kind: EquipmentType) -> Result<Vec<Equipment>, ApiError>;

    /// `GET /api/equipment/details/:id`
    async fn equipment_details(&self, id: &str) -> Result<Equipment, ApiError>;

    /// `POST /api/bookings`
    async fn create_booking(&self, session: &Session, request: &BookingRequest) -> Result<Booking, ApiError>;

    /// `GET /api/user/bookings`
    async fn user_bookings(&self, session: &Session) -> Result<Vec<Booking>, ApiError>;

    /// `GET /api/transport/vehicles`
    async fn transport_vehicles(&self) -> Result<Vec<TransportVehicle>, ApiError>;

    /// `GET /api/marketplace/products`
    async fn marketplace_products(&self) -> Result<Vec<Product>, ApiError>;

    /// `POST /api/marketplace/products`
    async fn create_product(&self, session: &Session, product: &NewProduct) -> Result<Product, ApiError>;

    /// `DELETE /api/marketplace/products/:id`
    async fn delete_product(&self, session: &Session, id: &str) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(ApiError::Transport("timed out".into()).is_retryable());
        assert!(ApiError::Server {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ApiError::Conflict("rented".into()).is_retryable());
        assert!(!ApiError::Validation("bad date".into()).is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
    }

    #[test]
    fn conflict_message_keeps_server_reason() {
        let message = ApiError::Conflict("equipment already rented".into()).user_message();
        assert!(message.contains("equipment already rented"));
    }
}

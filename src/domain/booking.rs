//! Equipment rental checkout: selection, simulated payment, booking creation.
//!
//! Browsing -> Selected -> AwaitingPayment -> PaymentConfirmed -> Booked
//!                               ^                     |
//!                               +--- PaymentFailed <--+
//!
//! Every rental is exactly one day long. The booking schema accepts arbitrary
//! ranges but pricing has no proration, so the flow never asks for more.

use serde::Serialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
    entities::{Availability, Booking, BookingStatus, EntityId, Equipment, PaymentStatus, Rupees},
    ports::{ApiError, HarvtechApi},
    session::Session,
};

pub const FIXED_SECURITY_DEPOSIT: Rupees = 2000;

pub const RENTAL_DURATION: Duration = Duration::days(1);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("{0} has no daily price yet")]
    PriceUnavailable(String),
    #[error("{name} is not available ({availability:?})")]
    Unavailable {
        name: String,
        availability: Availability,
    },
    #[error("a payment is already being confirmed")]
    AlreadySubmitting,
    #[error("cannot {action} while {stage}")]
    InvalidTransition {
        action: &'static str,
        stage: &'static str,
    },
    #[error("booking failed: {0}")]
    Payment(ApiError),
    #[error("booking record is inconsistent: {0}")]
    InvalidBooking(String),
}

impl BookingError {
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Payment(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

/// Rental price plus the fixed deposit. A missing, negative or unrepresentable
/// total leaves the equipment unpriced.
pub fn compute_cost(equipment: &Equipment) -> Result<Rupees, BookingError> {
    equipment
        .price_per_day
        .filter(|price| *price >= 0)
        .and_then(|price| price.checked_add(FIXED_SECURITY_DEPOSIT))
        .ok_or_else(|| BookingError::PriceUnavailable(equipment.name.clone()))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub equipment: Equipment,
    pub rental: Rupees,
    pub deposit: Rupees,
    pub total: Rupees,
}

impl Quote {
    pub fn for_equipment(equipment: Equipment) -> Result<Self, BookingError> {
        if !equipment.is_available() {
            return Err(BookingError::Unavailable {
                name: equipment.name.clone(),
                availability: equipment.availability,
            });
        }
        let total = compute_cost(&equipment)?;
        Ok(Self {
            rental: total - FIXED_SECURITY_DEPOSIT,
            deposit: FIXED_SECURITY_DEPOSIT,
            total,
            equipment,
        })
    }
}

/// Body of `POST /api/bookings`. The idempotency key travels as a header.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub equipment_id: EntityId,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub total_cost: Rupees,
    pub security_deposit: Rupees,
    #[serde(skip)]
    pub idempotency_key: Uuid,
}

/// One checkout attempt. Retries reuse the key so the server can deduplicate.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentAttempt {
    pub quote: Quote,
    pub idempotency_key: Uuid,
}

impl PaymentAttempt {
    /// Reference printed under the pseudo-QR code.
    pub fn payment_reference(&self) -> String {
        format!(
            "HARV-{}-{}",
            self.quote.equipment.id,
            self.idempotency_key.simple()
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Receipt {
    pub booking_id: EntityId,
    pub equipment_name: String,
    pub rental: Rupees,
    pub deposit: Rupees,
    pub total: Rupees,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

impl Receipt {
    fn new(quote: &Quote, booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            equipment_name: quote.equipment.name.clone(),
            rental: quote.rental,
            deposit: booking.security_deposit,
            total: booking.total_cost,
            start_date: booking.start_date,
            end_date: booking.end_date,
            status: booking.status,
            payment_status: booking.payment_status,
        }
    }

    /// Label/value rows for the receipt modal.
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Booking ID", self.booking_id.clone()),
            ("Equipment", self.equipment_name.clone()),
            ("Rental (1 day)", format!("₹{}", self.rental)),
            ("Security deposit", format!("₹{}", self.deposit)),
            ("Total paid", format!("₹{}", self.total)),
            ("From", format_date(self.start_date)),
            ("To", format_date(self.end_date)),
            ("Status", self.status.label().to_string()),
            ("Payment", self.payment_status.label().to_string()),
        ]
    }
}

fn format_date(value: OffsetDateTime) -> String {
    format!(
        "{:02} {} {} {:02}:{:02}",
        value.day(),
        value.month(),
        value.year(),
        value.hour(),
        value.minute()
    )
}

impl Booking {
    /// Checks a booking against the one-day pricing rule for `equipment`.
    pub fn validate(&self, equipment: &Equipment) -> Result<(), BookingError> {
        if self.end_date <= self.start_date {
            return Err(BookingError::InvalidBooking(
                "end date must be after start date".to_string(),
            ));
        }
        if self.end_date - self.start_date != RENTAL_DURATION {
            return Err(BookingError::InvalidBooking(
                "only single-day rentals are supported".to_string(),
            ));
        }
        if self.security_deposit != FIXED_SECURITY_DEPOSIT {
            return Err(BookingError::InvalidBooking(format!(
                "deposit {} differs from {FIXED_SECURITY_DEPOSIT}",
                self.security_deposit
            )));
        }
        let expected = compute_cost(equipment)?;
        if self.total_cost != expected {
            return Err(BookingError::InvalidBooking(format!(
                "total {} differs from expected {expected}",
                self.total_cost
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum BookingStage {
    #[default]
    Browsing,
    Selected(Quote),
    AwaitingPayment(PaymentAttempt),
    PaymentConfirmed(PaymentAttempt),
    Booked(Receipt),
    PaymentFailed {
        attempt: PaymentAttempt,
        error: ApiError,
    },
}

impl BookingStage {
    pub fn name(&self) -> &'static str {
        match self {
            BookingStage::Browsing => "browsing",
            BookingStage::Selected(_) => "equipment selected",
            BookingStage::AwaitingPayment(_) => "awaiting payment",
            BookingStage::PaymentConfirmed(_) => "confirming payment",
            BookingStage::Booked(_) => "booked",
            BookingStage::PaymentFailed { .. } => "payment failed",
        }
    }
}

/// What happened to a booking response handed to [`BookingFlow::complete`].
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Booked(Receipt),
    Failed(ApiError),
    /// The response belongs to an attempt the user already left.
    Stale,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingFlow {
    stage: BookingStage,
}

impl BookingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> &BookingStage {
        &self.stage
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.stage, BookingStage::PaymentConfirmed(_))
    }

    pub fn quote(&self) -> Option<&Quote> {
        match &self.stage {
            BookingStage::Selected(quote) => Some(quote),
            BookingStage::AwaitingPayment(attempt)
            | BookingStage::PaymentConfirmed(attempt)
            | BookingStage::PaymentFailed { attempt, .. } => Some(&attempt.quote),
            BookingStage::Browsing | BookingStage::Booked(_) => None,
        }
    }

    pub fn select(&mut self, equipment: Equipment) -> Result<Quote, BookingError> {
        if self.is_submitting() {
            return Err(BookingError::AlreadySubmitting);
        }
        let quote = Quote::for_equipment(equipment)?;
        tracing::info!(
            equipment = %quote.equipment.id,
            total = quote.total,
            "equipment selected"
        );
        self.stage = BookingStage::Selected(quote.clone());
        Ok(quote)
    }

    /// Shows the pseudo-QR for the selected equipment and opens a new attempt.
    pub fn open_payment(&mut self) -> Result<PaymentAttempt, BookingError> {
        let stage = std::mem::take(&mut self.stage);
        let BookingStage::Selected(quote) = stage else {
            let name = stage.name();
            self.stage = stage;
            return Err(BookingError::InvalidTransition {
                action: "open payment",
                stage: name,
            });
        };
        let attempt = PaymentAttempt {
            quote,
            idempotency_key: Uuid::new_v4(),
        };
        tracing::debug!(key = %attempt.idempotency_key, "payment attempt opened");
        self.stage = BookingStage::AwaitingPayment(attempt.clone());
        Ok(attempt)
    }

    /// Marks the attempt in flight and builds the request to send.
    pub fn begin_payment(&mut self, now: OffsetDateTime) -> Result<BookingRequest, BookingError> {
        let attempt = match &self.stage {
            BookingStage::AwaitingPayment(attempt) => attempt.clone(),
            BookingStage::PaymentConfirmed(_) => return Err(BookingError::AlreadySubmitting),
            other => {
                return Err(BookingError::InvalidTransition {
                    action: "confirm payment",
                    stage: other.name(),
                })
            }
        };

        let request = BookingRequest {
            equipment_id: attempt.quote.equipment.id.clone(),
            start_date: now,
            end_date: now + RENTAL_DURATION,
            total_cost: attempt.quote.total,
            security_deposit: attempt.quote.deposit,
            idempotency_key: attempt.idempotency_key,
        };
        tracing::info!(
            equipment = %request.equipment_id,
            total = request.total_cost,
            key = %request.idempotency_key,
            "confirming payment"
        );
        self.stage = BookingStage::PaymentConfirmed(attempt);
        Ok(request)
    }

    /// Applies the server's answer for the attempt identified by `key`.
    pub fn complete(&mut self, key: Uuid, result: Result<Booking, ApiError>) -> Completion {
        let attempt = match &self.stage {
            BookingStage::PaymentConfirmed(attempt) if attempt.idempotency_key == key => attempt.clone(),
            _ => {
                tracing::debug!(%key, stage = self.stage.name(), "ignoring stale booking response");
                return Completion::Stale;
            }
        };

        match result {
            Ok(booking) => {
                if let Err(err) = booking.validate(&attempt.quote.equipment) {
                    tracing::warn!(booking = %booking.id, "server booking differs from quote: {err}");
                }
                let receipt = Receipt::new(&attempt.quote, &booking);
                tracing::info!(booking = %booking.id, "booking created");
                self.stage = BookingStage::Booked(receipt.clone());
                Completion::Booked(receipt)
            }
            Err(error) => {
                tracing::warn!(%key, "booking failed: {error}");
                self.stage = BookingStage::PaymentFailed {
                    attempt,
                    error: error.clone(),
                };
                Completion::Failed(error)
            }
        }
    }

    /// Returns to the payment screen keeping the attempt's idempotency key.
    pub fn retry(&mut self) -> Result<(), BookingError> {
        let stage = std::mem::take(&mut self.stage);
        match stage {
            BookingStage::PaymentFailed { attempt, .. } => {
                self.stage = BookingStage::AwaitingPayment(attempt);
                Ok(())
            }
            other => {
                let name = other.name();
                self.stage = other;
                Err(BookingError::InvalidTransition {
                    action: "retry",
                    stage: name,
                })
            }
        }
    }

    /// Abandons the flow; a response still in flight becomes stale.
    pub fn reset(&mut self) {
        self.stage = BookingStage::Browsing;
    }

    /// Confirms payment and creates the booking in one step.
    pub async fn confirm_payment<A>(
        &mut self,
        api: &A,
        session: &Session,
        now: OffsetDateTime,
    ) -> Result<Receipt, BookingError>
    where
        A: HarvtechApi + ?Sized,
    {
        let request = self.begin_payment(now)?;
        let result = api.create_booking(session, &request).await;
        match self.complete(request.idempotency_key, result) {
            Completion::Booked(receipt) => Ok(receipt),
            Completion::Failed(error) => Err(BookingError::Payment(error)),
            Completion::Stale => Err(BookingError::InvalidTransition {
                action: "complete payment",
                stage: self.stage.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::{
        entities::{EquipmentType, Role, User},
        ports::MockHarvtechApi,
    };
    use rstest::{fixture, rstest};
    use time::macros::datetime;

    fn equipment(price: Option<Rupees>) -> Equipment {
        Equipment {
            id: "eq-7".to_string(),
            owner_id: "owner-1".to_string(),
            equipment_type: EquipmentType::Tractor,
            name: "Mahindra 575 DI".to_string(),
            model_number: "575DI".to_string(),
            chassis_number: "CH-1234".to_string(),
            power: Some("45 HP".to_string()),
            year: Some(2021),
            price_per_day: price,
            location: Some("Erode".to_string()),
            availability: Availability::Available,
            image: None,
        }
    }

    #[fixture]
    fn session() -> Session {
        Session::new(User {
            id: "user-42".to_string(),
            mobile_number: "9876543210".to_string(),
            role: Role::User,
            farmer_id: "FRM-42".to_string(),
            name: "Ravi".to_string(),
            city: "Salem".to_string(),
            country: "India".to_string(),
            aadhaar_number: None,
            is_verified: true,
            created_at: None,
            updated_at: None,
        })
    }

    fn booking_for(request: &BookingRequest) -> Booking {
        Booking {
            id: "bk-1".to_string(),
            user_id: "user-42".to_string(),
            equipment_id: request.equipment_id.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            total_cost: request.total_cost,
            security_deposit: request.security_deposit,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Paid,
            created_at: None,
        }
    }

    const NOW: OffsetDateTime = datetime!(2026-03-01 09:30 UTC);

    fn flow_awaiting_payment(price: Rupees) -> BookingFlow {
        let mut flow = BookingFlow::new();
        flow.select(equipment(Some(price))).unwrap();
        flow.open_payment().unwrap();
        flow
    }

    #[rstest]
    #[case(1500, 3500)]
    #[case(0, 2000)]
    #[case(800, 2800)]
    fn cost_is_daily_price_plus_deposit(#[case] price: Rupees, #[case] expected: Rupees) {
        assert_eq!(compute_cost(&equipment(Some(price))), Ok(expected));
    }

    #[rstest]
    #[case(-5000)]
    #[case(-1)]
    #[case(Rupees::MAX)]
    #[case(Rupees::MAX - FIXED_SECURITY_DEPOSIT + 1)]
    fn unusable_prices_leave_equipment_unpriced(#[case] price: Rupees) {
        assert_eq!(
            compute_cost(&equipment(Some(price))),
            Err(BookingError::PriceUnavailable("Mahindra 575 DI".to_string()))
        );
        let mut flow = BookingFlow::new();
        assert!(flow.select(equipment(Some(price))).is_err());
        assert_eq!(flow.stage(), &BookingStage::Browsing);
    }

    #[test]
    fn largest_representable_total_is_still_priced() {
        let price = Rupees::MAX - FIXED_SECURITY_DEPOSIT;
        assert_eq!(compute_cost(&equipment(Some(price))), Ok(Rupees::MAX));
    }

    #[test]
    fn unpriced_equipment_cannot_be_selected() {
        let mut flow = BookingFlow::new();
        let err = flow.select(equipment(None)).unwrap_err();
        assert_eq!(err, BookingError::PriceUnavailable("Mahindra 575 DI".to_string()));
        assert_eq!(flow.stage(), &BookingStage::Browsing);
    }

    #[test]
    fn rented_equipment_cannot_be_selected() {
        let mut rented = equipment(Some(1500));
        rented.availability = Availability::Rented;
        let err = BookingFlow::new().select(rented).unwrap_err();
        assert!(matches!(err, BookingError::Unavailable { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn confirm_payment_books_one_day_at_price_plus_deposit(session: Session) {
        let mut api = MockHarvtechApi::new();
        api.expect_create_booking()
            .times(1)
            .withf(|session, request| {
                session.bearer_token() == "user-42"
                    && request.total_cost == 3500
                    && request.security_deposit == FIXED_SECURITY_DEPOSIT
                    && request.end_date - request.start_date == Duration::days(1)
            })
            .returning(|_, request| Ok(booking_for(request)));

        let mut flow = flow_awaiting_payment(1500);
        let receipt = flow.confirm_payment(&api, &session, NOW).await.unwrap();

        assert_eq!(receipt.total, 3500);
        assert_eq!(receipt.rental, 1500);
        assert_eq!(receipt.deposit, 2000);
        assert_eq!(receipt.start_date, NOW);
        assert!(matches!(flow.stage(), BookingStage::Booked(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn failure_then_retry_reuses_idempotency_key(session: Session) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::clone(&seen);
        let mut api = MockHarvtechApi::new();
        api.expect_create_booking()
            .times(2)
            .returning(move |_, request| {
                let mut calls = calls.lock().unwrap();
                calls.push(request.idempotency_key);
                if calls.len() == 1 {
                    Err(ApiError::Transport("connection reset".into()))
                } else {
                    Ok(booking_for(request))
                }
            });

        let mut flow = flow_awaiting_payment(1500);
        let err = flow.confirm_payment(&api, &session, NOW).await.unwrap_err();
        assert_eq!(
            err,
            BookingError::Payment(ApiError::Transport("connection reset".into()))
        );
        assert!(matches!(flow.stage(), BookingStage::PaymentFailed { .. }));

        flow.retry().unwrap();
        flow.confirm_payment(&api, &session, NOW).await.unwrap();

        let keys = seen.lock().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
    }

    #[test]
    fn second_confirmation_while_in_flight_is_refused() {
        let mut flow = flow_awaiting_payment(1500);
        flow.begin_payment(NOW).unwrap();
        assert!(flow.is_submitting());
        assert_eq!(flow.begin_payment(NOW), Err(BookingError::AlreadySubmitting));
        assert!(matches!(
            flow.select(equipment(Some(10))),
            Err(BookingError::AlreadySubmitting)
        ));
    }

    #[test]
    fn response_after_reset_is_stale() {
        let mut flow = flow_awaiting_payment(1500);
        let request = flow.begin_payment(NOW).unwrap();
        flow.reset();
        let outcome = flow.complete(request.idempotency_key, Ok(booking_for(&request)));
        assert_eq!(outcome, Completion::Stale);
        assert_eq!(flow.stage(), &BookingStage::Browsing);
    }

    #[test]
    fn response_for_another_attempt_is_stale() {
        let mut flow = flow_awaiting_payment(1500);
        let request = flow.begin_payment(NOW).unwrap();
        let outcome = flow.complete(Uuid::new_v4(), Ok(booking_for(&request)));
        assert_eq!(outcome, Completion::Stale);
        assert!(flow.is_submitting());
    }

    #[test]
    fn payment_cannot_start_without_selection() {
        let mut flow = BookingFlow::new();
        assert!(matches!(
            flow.open_payment(),
            Err(BookingError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.begin_payment(NOW),
            Err(BookingError::InvalidTransition { .. })
        ));
        assert!(flow.retry().is_err());
        assert_eq!(flow.stage(), &BookingStage::Browsing);
    }

    #[test]
    fn validate_rejects_multi_day_and_wrong_totals() {
        let eq = equipment(Some(1500));
        let mut flow = flow_awaiting_payment(1500);
        let request = flow.begin_payment(NOW).unwrap();

        let good = booking_for(&request);
        assert!(good.validate(&eq).is_ok());

        let mut long = good.clone();
        long.end_date = long.start_date + Duration::days(3);
        assert!(long.validate(&eq).is_err());

        let mut backwards = good.clone();
        backwards.end_date = backwards.start_date;
        assert!(backwards.validate(&eq).is_err());

        let mut cheap = good;
        cheap.total_cost = 1500;
        assert!(cheap.validate(&eq).is_err());
    }

    #[test]
    fn receipt_lists_breakdown() {
        let mut flow = flow_awaiting_payment(1500);
        let request = flow.begin_payment(NOW).unwrap();
        let Completion::Booked(receipt) = flow.complete(request.idempotency_key, Ok(booking_for(&request)))
        else {
            panic!("expected booking");
        };
        let lines = receipt.lines();
        assert!(lines.contains(&("Total paid", "₹3500".to_string())));
        assert!(lines.contains(&("From", "01 March 2026 09:30".to_string())));
    }
}

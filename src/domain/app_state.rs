use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};

use super::{
    booking::BookingFlow,
    cart::Cart,
    entities::{Booking, Equipment, EquipmentType, FarmField, Product, TransportVehicle, User},
    session::Session,
};

/// Everything the running app holds for the current device session.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    session: Option<Session>,
    pub cart: Cart,
    pub booking: BookingFlow,
    pub fields: Vec<FarmField>,
    pub equipment: HashMap<EquipmentType, Vec<Equipment>>,
    pub products: Vec<Product>,
    pub vehicles: Vec<TransportVehicle>,
    pub bookings: Vec<Booking>,
    pub cache: CacheTimestamps,
    pub requests: RequestGuard,
}

impl AppState {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn sign_in(&mut self, session: Session) {
        tracing::info!(user = %session.user_id(), "session started");
        self.session = Some(session);
    }

    /// Ends the session and drops everything tied to the user.
    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(user = %session.user_id(), "session ended");
        }
        self.cart.clear();
        self.booking.reset();
        self.bookings.clear();
        self.requests.invalidate_all();
    }

    pub fn is_stale(&self, resource: &CacheResource, ttl: Duration) -> bool {
        self.cache.is_stale(resource, ttl)
    }

    pub fn apply_persisted(&mut self, persisted: PersistedState) {
        if let Some(user) = persisted.user {
            self.session = Some(Session::new(user));
        }
        self.fields = persisted.fields;
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            user: self.session.as_ref().map(|session| session.user().clone()),
            fields: self.fields.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CacheTimestamps {
    entries: HashMap<CacheResource, SystemTime>,
}

impl CacheTimestamps {
    pub fn record_fetch(&mut self, resource: CacheResource, fetched_at: SystemTime) {
        self.entries.insert(resource, fetched_at);
    }

    pub fn fetched_at(&self, resource: &CacheResource) -> Option<SystemTime> {
        self.entries.get(resource).copied()
    }

    pub fn is_stale(&self, resource: &CacheResource, ttl: Duration) -> bool {
        self.fetched_at(resource)
            .map(|time| time.elapsed().map(|elapsed| elapsed > ttl).unwrap_or(true))
            .unwrap_or(true)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheResource {
    Equipment(EquipmentType),
    Products,
    Vehicles,
}

/// Actions that hit the server and must not be fired twice concurrently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestAction {
    CheckMobile,
    VerifyOtp,
    Register,
    LoadEquipment,
    LoadBookings,
    LoadVehicles,
    LoadProducts,
    ListProduct,
    DeleteProduct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    action: RequestAction,
    generation: u64,
}

impl RequestTicket {
    pub fn action(&self) -> RequestAction {
        self.action
    }
}

/// Tracks in-flight requests so controls stay disabled while one is pending
/// and late responses can be told apart from current ones.
#[derive(Clone, Debug, Default)]
pub struct RequestGuard {
    in_flight: HashMap<RequestAction, u64>,
    next_generation: u64,
}

impl RequestGuard {
    /// `None` while the same action is still in flight.
    pub fn try_begin(&mut self, action: RequestAction) -> Option<RequestTicket> {
        if self.in_flight.contains_key(&action) {
            tracing::debug!(?action, "request already in flight");
            return None;
        }
        self.next_generation += 1;
        self.in_flight.insert(action, self.next_generation);
        Some(RequestTicket {
            action,
            generation: self.next_generation,
        })
    }

    pub fn is_pending(&self, action: RequestAction) -> bool {
        self.in_flight.contains_key(&action)
    }

    /// Releases the ticket. Returns false when the response is stale and
    /// should be dropped.
    pub fn finish(&mut self, ticket: RequestTicket) -> bool {
        match self.in_flight.get(&ticket.action) {
            Some(generation) if *generation == ticket.generation => {
                self.in_flight.remove(&ticket.action);
                true
            }
            _ => {
                tracing::debug!(action = ?ticket.action, "dropping stale response");
                false
            }
        }
    }

    /// Called on navigation and logout; everything in flight becomes stale.
    pub fn invalidate_all(&mut self) {
        self.in_flight.clear();
    }
}

/// State written to the device between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub fields: Vec<FarmField>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        cart::UnitKind,
        entities::{Product, Role},
    };

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            mobile_number: "9000000001".to_string(),
            role: Role::User,
            farmer_id: "FRM-1".to_string(),
            name: "Arun".to_string(),
            city: "Karur".to_string(),
            country: "India".to_string(),
            aadhaar_number: None,
            is_verified: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn second_request_for_same_action_is_blocked() {
        let mut guard = RequestGuard::default();
        let ticket = guard.try_begin(RequestAction::Register).unwrap();
        assert!(guard.try_begin(RequestAction::Register).is_none());
        assert!(guard.try_begin(RequestAction::LoadVehicles).is_some());
        assert!(guard.finish(ticket));
        assert!(!guard.is_pending(RequestAction::Register));
    }

    #[test]
    fn responses_after_navigation_are_stale() {
        let mut guard = RequestGuard::default();
        let old = guard.try_begin(RequestAction::LoadProducts).unwrap();
        guard.invalidate_all();
        let fresh = guard.try_begin(RequestAction::LoadProducts).unwrap();
        assert!(!guard.finish(old));
        assert!(guard.is_pending(RequestAction::LoadProducts));
        assert!(guard.finish(fresh));
    }

    #[test]
    fn sign_out_clears_user_scoped_state() {
        let mut state = AppState::default();
        state.sign_in(Session::new(user()));
        state.cart.add_item(
            &Product {
                id: "p".to_string(),
                name: "Tomato".to_string(),
                seller: "Local".to_string(),
                price: 30,
                unit: UnitKind::Kg,
                category: "Vegetables".to_string(),
                location: None,
                image: None,
            },
            1,
        );
        state.sign_out();
        assert!(!state.is_signed_in());
        assert!(state.cart.is_empty());
        assert!(state.to_persisted().user.is_none());
    }

    #[test]
    fn persisted_user_restores_session() {
        let mut state = AppState::default();
        state.apply_persisted(PersistedState {
            user: Some(user()),
            fields: Vec::new(),
        });
        assert_eq!(state.session().map(Session::bearer_token), Some("u-1"));
    }

    #[test]
    fn unknown_resource_is_stale() {
        let mut cache = CacheTimestamps::default();
        assert!(cache.is_stale(&CacheResource::Vehicles, Duration::from_secs(60)));
        cache.record_fetch(CacheResource::Vehicles, SystemTime::now());
        assert!(!cache.is_stale(&CacheResource::Vehicles, Duration::from_secs(60)));
    }
}

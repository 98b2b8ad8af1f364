//! Client-side rules of the app: cart, rental checkout, trip pricing, login.

pub mod app_state;
pub mod auth;
pub mod booking;
pub mod cart;
pub mod entities;
pub mod ports;
pub mod session;
pub mod transport;
pub mod validation;

pub use app_state::{AppState, CacheResource, PersistedState, RequestAction};
pub use auth::{AuthError, LoginFlow, LoginStep, RegistrationForm};
pub use booking::{
    compute_cost, BookingError, BookingFlow, BookingStage, Completion, Receipt,
    FIXED_SECURITY_DEPOSIT,
};
pub use cart::{format_quantity, Cart, CartError, CartItem, UnitKind};
pub use entities::{
    Availability, Booking, Equipment, EquipmentType, FarmField, NewProduct, Product, Role, Rupees,
    TransportVehicle, User,
};
pub use ports::{ApiError, HarvtechApi};
pub use session::Session;
pub use transport::{quote_vehicles, Coordinates, TransportError, TripEstimate};

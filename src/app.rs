use dioxus::{prelude::*, signals::Signal};

use crate::{
    domain::{AppState, EquipmentType},
    ui::{
        components::toast::{Toast, ToastMessage},
        pages::{
            BookingsPage, CartPage, EquipmentPage, FieldsPage, MarketplacePage, RegisterPage,
            TransportPage,
        },
        shell::Shell,
    },
    util::{
        assets,
        persistence::{load_persisted_state, save_persisted_state},
    },
};

#[derive(Routable, Clone, PartialEq)]
pub enum Route {
    #[route("/")]
    #[route("/marketplace")]
    Marketplace {},
    #[route("/cart")]
    ShoppingCart {},
    #[route("/rent/:kind")]
    Rentals { kind: EquipmentType },
    #[route("/bookings")]
    Bookings {},
    #[route("/transport")]
    Transport {},
    #[route("/fields")]
    Fields {},
    #[route("/register?:mobile")]
    Register { mobile: String },
}

/// Root component. `AppConfig` and `HarvtechClient` arrive as launch contexts.
#[component]
pub fn App() -> Element {
    let state = use_signal(|| {
        let mut state = AppState::default();
        state.apply_persisted(load_persisted_state());
        state
    });
    use_context_provider(|| state);

    let toasts = use_signal(Vec::<ToastMessage>::new);
    use_context_provider(|| toasts);

    rsx! {
        document::Link { rel: "icon", href: assets::favicon_data_uri() }
        document::Style { "{assets::main_css()}" }
        Router::<Route> {}
        Toast {}
    }
}

pub fn persist_user_state(state: &Signal<AppState>) {
    let snapshot = state.with(|st| st.to_persisted());
    if let Err(err) = save_persisted_state(&snapshot) {
        tracing::error!(%err, "failed to persist user state");
    }
}

#[component]
pub fn Marketplace() -> Element {
    rsx! { Shell { MarketplacePage {} } }
}

#[component]
pub fn ShoppingCart() -> Element {
    rsx! { Shell { CartPage {} } }
}

#[component]
pub fn Rentals(kind: EquipmentType) -> Element {
    // Keyed so switching type remounts the page and reloads its list.
    rsx! { Shell { EquipmentPage { key: "{kind}", kind } } }
}

#[component]
pub fn Bookings() -> Element {
    rsx! { Shell { BookingsPage {} } }
}

#[component]
pub fn Transport() -> Element {
    rsx! { Shell { TransportPage {} } }
}

#[component]
pub fn Fields() -> Element {
    rsx! { Shell { FieldsPage {} } }
}

#[component]
pub fn Register(mobile: String) -> Element {
    rsx! { Shell { allow_guest: true, RegisterPage { mobile } } }
}

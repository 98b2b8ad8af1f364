use dioxus::prelude::*;

use crate::app::{persist_user_state, Route};
use crate::domain::{AppState, EquipmentType};
use crate::ui::components::toast::{push_toast, ToastKind, ToastMessage};
use crate::ui::pages::LoginPage;
use crate::util::{
    assets,
    version::{version_label, APP_NAME, APP_TAGLINE},
};

#[component]
pub fn Shell(children: Element, #[props(default)] allow_guest: bool) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let nav = use_navigator();
    let current_route = use_route::<Route>();

    let session = state.with(|st| st.session().cloned());

    // Everything except registration sits behind login.
    let Some(session) = session else {
        return rsx! {
            div { class: "app-shell",
                header { class: "app-header", Brand {} }
                main { class: "content narrow",
                    if allow_guest {
                        {children}
                    } else {
                        LoginPage {}
                    }
                }
                Footer {}
            }
        };
    };

    let user = session.user().clone();
    let cart_count = state.with(|st| st.cart.total_items());

    let on_logout = move |_| {
        state.with_mut(|st| st.sign_out());
        persist_user_state(&state);
        push_toast(toasts, ToastKind::Info, "Logged out.");
        nav.push(Route::Marketplace {});
    };

    rsx! {
        div { class: "app-shell",
            header { class: "app-header",
                Brand {}
                nav { class: "app-nav",
                    NavButton { active: matches!(current_route, Route::Marketplace {}), target: Route::Marketplace {}, label: "🛒 Marketplace".to_string() }
                    NavButton {
                        active: matches!(current_route, Route::ShoppingCart {}),
                        target: Route::ShoppingCart {},
                        label: if cart_count > 0 { format!("🧺 Cart ({cart_count})") } else { "🧺 Cart".to_string() },
                    }
                    NavButton { active: matches!(current_route, Route::Rentals { .. }), target: Route::Rentals { kind: EquipmentType::Tractor }, label: "🚜 Rent equipment".to_string() }
                    NavButton { active: matches!(current_route, Route::Bookings {}), target: Route::Bookings {}, label: "📋 My bookings".to_string() }
                    NavButton { active: matches!(current_route, Route::Transport {}), target: Route::Transport {}, label: "🚚 Transport".to_string() }
                    NavButton { active: matches!(current_route, Route::Fields {}), target: Route::Fields {}, label: "🌾 My fields".to_string() }
                }
                div { class: "user-chip",
                    div {
                        p { class: "strong", "{user.name}" }
                        p { class: "muted small", "{user.farmer_id} · {user.role.label()}" }
                    }
                    button { class: "button ghost", onclick: on_logout, "Log out" }
                }
            }
            main { class: "content",
                {children}
            }
            Footer {}
        }
    }
}

#[component]
fn Brand() -> Element {
    rsx! {
        div { class: "brand",
            img { src: assets::logo_data_uri(), alt: "{APP_NAME} logo", width: "36", height: "36" }
            div {
                h1 { "{APP_NAME}" }
                p { class: "muted small", "{APP_TAGLINE}" }
            }
        }
    }
}

#[component]
fn Footer() -> Element {
    rsx! {
        footer { class: "app-footer muted small", "{APP_NAME} {version_label()}" }
    }
}

/// Navigation drops responses still in flight for the page being left.
#[component]
fn NavButton(active: bool, target: Route, label: String) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let nav = use_navigator();
    let class = if active { "nav-button active" } else { "nav-button" };

    rsx! {
        button {
            class: "{class}",
            onclick: move |_| {
                state.with_mut(|st| st.requests.invalidate_all());
                nav.push(target.clone());
            },
            "{label}"
        }
    }
}

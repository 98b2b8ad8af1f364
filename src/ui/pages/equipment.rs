use dioxus::prelude::*;
use time::OffsetDateTime;

use crate::{
    app::Route,
    config::AppConfig,
    domain::{
        Availability, AppState, BookingStage, CacheResource, Completion, Equipment, EquipmentType,
        HarvtechApi, RequestAction, FIXED_SECURITY_DEPOSIT,
    },
    infra::{CacheStatus, HarvtechClient},
    ui::{
        components::{
            availability_badge::AvailabilityBadge,
            payment_qr::PaymentQr,
            toast::{push_toast, ToastKind, ToastMessage},
        },
        pages::humanize_age,
    },
};

#[component]
pub fn EquipmentPage(kind: EquipmentType) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let config = use_context::<AppConfig>();
    let nav = use_navigator();

    use_hook({
        let client = client.clone();
        move || {
            if state.peek().is_stale(&CacheResource::Equipment(kind), config.cache_ttl) {
                load_equipment(state, toasts, client, kind);
            }
        }
    });

    let loading = state.with(|st| st.requests.is_pending(RequestAction::LoadEquipment));
    let listing = state.with(|st| st.equipment.get(&kind).cloned().unwrap_or_default());
    let updated = state.with(|st| {
        st.cache
            .fetched_at(&CacheResource::Equipment(kind))
            .map(humanize_age)
    });
    let modal_open = state.with(|st| !matches!(st.booking.stage(), BookingStage::Browsing));

    let on_select = move |equipment: Equipment| {
        if let Err(err) = state.with_mut(|st| st.booking.select(equipment)) {
            push_toast(toasts, ToastKind::Warning, err.user_message());
        }
    };

    rsx! {
        section { class: "stack",
            div { class: "page-header",
                div {
                    h2 { "Rent {kind.label().to_lowercase()}" }
                    p { class: "muted small",
                        "Daily rate plus a refundable ₹{FIXED_SECURITY_DEPOSIT} deposit."
                        if let Some(age) = updated {
                            " Updated {age}."
                        }
                    }
                }
                button {
                    class: "button",
                    disabled: loading,
                    onclick: {
                        let client = client.clone();
                        move |_| load_equipment(state, toasts, client.clone(), kind)
                    },
                    if loading { "Loading…" } else { "Refresh" }
                }
            }
            div { class: "segmented",
                for other in EquipmentType::ALL {
                    button {
                        key: "{other}",
                        class: if other == kind { "segment active" } else { "segment" },
                        onclick: move |_| {
                            state.with_mut(|st| st.requests.invalidate_all());
                            nav.push(Route::Rentals { kind: other });
                        },
                        "{other.label()}"
                    }
                }
            }
            if listing.is_empty() && !loading {
                p { class: "empty", "No {kind.label().to_lowercase()} listed right now." }
            }
            div { class: "card-grid",
                for equipment in listing {
                    EquipmentCard { key: "{equipment.id}", equipment, on_select }
                }
            }
        }
        if modal_open {
            BookingModal {}
        }
    }
}

fn load_equipment(
    mut state: Signal<AppState>,
    toasts: Signal<Vec<ToastMessage>>,
    client: HarvtechClient,
    kind: EquipmentType,
) {
    spawn(async move {
        let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::LoadEquipment))
        else {
            return;
        };
        let result = client.equipment_cached(kind).await;
        if !state.with_mut(|st| st.requests.finish(ticket)) {
            return;
        }
        match result {
            Ok(payload) => {
                state.with_mut(|st| {
                    st.equipment.insert(kind, payload.data);
                    st.cache
                        .record_fetch(CacheResource::Equipment(kind), payload.fetched_at);
                });
                if payload.status == CacheStatus::Stale {
                    push_toast(
                        toasts,
                        ToastKind::Warning,
                        "You seem to be offline. Availability may have changed.",
                    );
                }
            }
            Err(err) => push_toast(
                toasts,
                ToastKind::Error,
                format!("Could not load {}. {}", kind.label().to_lowercase(), err.user_message()),
            ),
        }
    });
}

#[component]
fn EquipmentCard(equipment: Equipment, on_select: EventHandler<Equipment>) -> Element {
    let bookable = equipment.is_available() && equipment.price_per_day.is_some();
    let price = match equipment.price_per_day {
        Some(price) => format!("₹{price} / day"),
        None => "Price on request".to_string(),
    };
    let details = [
        equipment.power.clone(),
        equipment.year.map(|year| year.to_string()),
        equipment.location.clone().map(|location| format!("📍 {location}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" · ");
    let action = match equipment.availability {
        Availability::Available => "Book now",
        Availability::Rented => "Currently rented",
        Availability::Maintenance => "Under maintenance",
    };

    rsx! {
        article { class: "card",
            if let Some(image) = equipment.image.clone() {
                img { class: "card-image", src: "{image}", alt: "{equipment.name}" }
            }
            div { class: "row spread",
                h3 { "{equipment.name}" }
                AvailabilityBadge { availability: equipment.availability }
            }
            p { class: "muted small", "Model {equipment.model_number}" }
            if !details.is_empty() {
                p { class: "muted small", "{details}" }
            }
            p { class: "price", "{price}" }
            button {
                class: "button primary",
                disabled: !bookable,
                onclick: {
                    let equipment = equipment.clone();
                    move |_| on_select.call(equipment.clone())
                },
                "{action}"
            }
        }
    }
}

#[component]
fn BookingModal() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let nav = use_navigator();

    let stage = state.with(|st| st.booking.stage().clone());

    let on_close = move |_| state.with_mut(|st| st.booking.reset());

    let on_proceed = move |_| {
        if let Err(err) = state.with_mut(|st| st.booking.open_payment()) {
            push_toast(toasts, ToastKind::Warning, err.user_message());
        }
    };

    let on_paid = move |_| {
        let Some(session) = state.with(|st| st.session().cloned()) else {
            push_toast(toasts, ToastKind::Error, "Please log in again.");
            return;
        };
        let request = match state.with_mut(|st| st.booking.begin_payment(OffsetDateTime::now_utc())) {
            Ok(request) => request,
            Err(err) => {
                push_toast(toasts, ToastKind::Warning, err.user_message());
                return;
            }
        };
        let client = client.clone();
        spawn(async move {
            let key = request.idempotency_key;
            let result = client.create_booking(&session, &request).await;
            match state.with_mut(|st| st.booking.complete(key, result)) {
                Completion::Booked(receipt) => {
                    state.with_mut(|st| {
                        for listing in st.equipment.values_mut() {
                            for equipment in listing.iter_mut() {
                                if equipment.id == request.equipment_id {
                                    equipment.availability = Availability::Rented;
                                }
                            }
                        }
                    });
                    client.clear_cache().await;
                    push_toast(
                        toasts,
                        ToastKind::Success,
                        format!("Booked {}. Booking ID {}.", receipt.equipment_name, receipt.booking_id),
                    );
                }
                Completion::Failed(error) => {
                    push_toast(toasts, ToastKind::Error, error.user_message());
                }
                Completion::Stale => {}
            }
        });
    };

    let on_retry = move |_| {
        if let Err(err) = state.with_mut(|st| st.booking.retry()) {
            push_toast(toasts, ToastKind::Warning, err.user_message());
        }
    };

    let on_view_bookings = move |_| {
        state.with_mut(|st| st.booking.reset());
        nav.push(Route::Bookings {});
    };

    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal", role: "dialog",
                match stage {
                    BookingStage::Browsing => rsx! {},
                    BookingStage::Selected(quote) => rsx! {
                        h3 { "Book {quote.equipment.name}" }
                        dl { class: "summary",
                            dt { "Rental (1 day)" } dd { "₹{quote.rental}" }
                            dt { "Security deposit" } dd { "₹{quote.deposit}" }
                            dt { class: "strong", "Total" } dd { class: "strong", "₹{quote.total}" }
                        }
                        p { class: "muted small", "Rentals start now and run for one day." }
                        div { class: "row",
                            button { class: "button primary", onclick: on_proceed, "Proceed to pay" }
                            button { class: "button ghost", onclick: on_close, "Cancel" }
                        }
                    },
                    BookingStage::AwaitingPayment(attempt) => rsx! {
                        h3 { "Scan to pay" }
                        PaymentQr { reference: attempt.payment_reference(), amount: attempt.quote.total }
                        div { class: "row",
                            button { class: "button primary", onclick: on_paid, "I have paid" }
                            button { class: "button ghost", onclick: on_close, "Cancel" }
                        }
                    },
                    BookingStage::PaymentConfirmed(attempt) => rsx! {
                        h3 { "Confirming payment…" }
                        p { class: "muted", "Creating your booking for {attempt.quote.equipment.name}." }
                        button { class: "button primary", disabled: true, "Please wait" }
                    },
                    BookingStage::Booked(receipt) => rsx! {
                        h3 { "Booking confirmed ✅" }
                        dl { class: "summary",
                            for (label, value) in receipt.lines() {
                                dt { "{label}" }
                                dd { "{value}" }
                            }
                        }
                        div { class: "row",
                            button { class: "button primary", onclick: on_view_bookings, "View my bookings" }
                            button { class: "button ghost", onclick: on_close, "Done" }
                        }
                    },
                    BookingStage::PaymentFailed { attempt, error } => rsx! {
                        h3 { "Booking failed" }
                        p { class: "notice error", "{error.user_message()}" }
                        p { class: "muted small",
                            "Retrying reuses reference {attempt.payment_reference()}, so you will not be booked twice."
                        }
                        div { class: "row",
                            button { class: "button primary", onclick: on_retry, "Try again" }
                            button { class: "button ghost", onclick: on_close, "Cancel" }
                        }
                    },
                }
            }
        }
    }
}

use std::collections::HashMap;

use dioxus::prelude::*;

use crate::{
    app::{persist_user_state, Route},
    domain::{
        entities::{BookingStatus, PaymentStatus},
        ApiError, AppState, Booking, EquipmentType, HarvtechApi, RequestAction,
    },
    infra::HarvtechClient,
    ui::{
        components::{
            kpi_card::KpiCard,
            toast::{push_toast, ToastKind, ToastMessage},
        },
        pages::format_date,
    },
};

#[component]
pub fn BookingsPage() -> Element {
    let state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let names = use_signal(HashMap::<String, String>::new);

    use_hook({
        let client = client.clone();
        move || load_bookings(state, toasts, names, client)
    });

    let loading = state.with(|st| st.requests.is_pending(RequestAction::LoadBookings));
    let bookings = state.with(|st| st.bookings.clone());
    let active = bookings
        .iter()
        .filter(|booking| !booking.status.is_terminal())
        .count();
    let spent: i64 = bookings
        .iter()
        .filter(|booking| booking.payment_status == PaymentStatus::Paid)
        .map(|booking| booking.total_cost)
        .fold(0, i64::saturating_add);

    rsx! {
        section { class: "stack",
            div { class: "page-header",
                h2 { "My bookings" }
                button {
                    class: "button",
                    disabled: loading,
                    onclick: {
                        let client = client.clone();
                        move |_| load_bookings(state, toasts, names, client.clone())
                    },
                    if loading { "Loading…" } else { "Refresh" }
                }
            }
            div { class: "kpi-row",
                KpiCard { title: "Bookings".to_string(), value: bookings.len().to_string(), description: None }
                KpiCard { title: "Active".to_string(), value: active.to_string(), description: Some("Pending or confirmed".to_string()) }
                KpiCard { title: "Paid".to_string(), value: format!("₹{spent}"), description: Some("Rental plus deposits".to_string()) }
            }
            if bookings.is_empty() && !loading {
                div { class: "empty",
                    p { "No bookings yet." }
                    Link { class: "button primary", to: Route::Rentals { kind: EquipmentType::Tractor }, "Rent equipment" }
                }
            }
            for booking in bookings {
                BookingRow {
                    key: "{booking.id}",
                    equipment_name: equipment_name(&state.read(), &names.read(), &booking.equipment_id),
                    booking,
                }
            }
        }
    }
}

fn equipment_name(state: &AppState, names: &HashMap<String, String>, id: &str) -> String {
    state
        .equipment
        .values()
        .flatten()
        .find(|equipment| equipment.id == id)
        .map(|equipment| equipment.name.clone())
        .or_else(|| names.get(id).cloned())
        .unwrap_or_else(|| format!("Equipment {id}"))
}

fn load_bookings(
    mut state: Signal<AppState>,
    toasts: Signal<Vec<ToastMessage>>,
    mut names: Signal<HashMap<String, String>>,
    client: HarvtechClient,
) {
    spawn(async move {
        let Some(session) = state.with(|st| st.session().cloned()) else {
            return;
        };
        let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::LoadBookings))
        else {
            return;
        };
        let result = client.user_bookings(&session).await;
        if !state.with_mut(|st| st.requests.finish(ticket)) {
            return;
        }
        let bookings = match result {
            Ok(bookings) => bookings,
            Err(ApiError::Unauthorized) => {
                state.with_mut(|st| st.sign_out());
                persist_user_state(&state);
                push_toast(toasts, ToastKind::Warning, "Your session expired. Please log in again.");
                return;
            }
            Err(err) => {
                push_toast(
                    toasts,
                    ToastKind::Error,
                    format!("Could not load bookings. {}", err.user_message()),
                );
                return;
            }
        };

        let mut unknown: Vec<String> = bookings
            .iter()
            .map(|booking| booking.equipment_id.clone())
            .filter(|id| {
                let known = state.with(|st| st.equipment.values().flatten().any(|e| &e.id == id));
                !known && !names.peek().contains_key(id)
            })
            .collect();
        unknown.sort();
        unknown.dedup();
        state.with_mut(|st| st.bookings = bookings);

        for id in unknown {
            match client.equipment_details(&id).await {
                Ok(equipment) => {
                    names.with_mut(|map| map.insert(id, equipment.name));
                }
                Err(err) => tracing::debug!(equipment = %id, "no details for booked equipment: {err}"),
            }
        }
    });
}

#[component]
fn BookingRow(booking: Booking, equipment_name: String) -> Element {
    let status_class = match booking.status {
        BookingStatus::Confirmed | BookingStatus::Completed => "badge badge-green",
        BookingStatus::Pending => "badge badge-amber",
        BookingStatus::Cancelled => "badge badge-grey",
    };
    let payment_class = match booking.payment_status {
        PaymentStatus::Paid => "badge badge-green",
        PaymentStatus::Pending => "badge badge-amber",
        PaymentStatus::Refunded => "badge badge-grey",
    };

    rsx! {
        article { class: "card",
            div { class: "row spread",
                h3 { "{equipment_name}" }
                span { class: status_class, "{booking.status.label()}" }
            }
            p { class: "muted small mono", "Booking {booking.id}" }
            p { "{format_date(booking.start_date)} → {format_date(booking.end_date)}" }
            div { class: "row spread",
                span { class: "price", "₹{booking.total_cost}" }
                span { class: payment_class, "{booking.payment_status.label()}" }
            }
            p { class: "muted small", "Includes ₹{booking.security_deposit} refundable deposit" }
            if let Some(step) = next_step(&booking) {
                p { class: "notice", "{step}" }
            }
        }
    }
}

/// What the farmer is waiting on, read off the status transition tables.
fn next_step(booking: &Booking) -> Option<String> {
    if booking.status.can_transition_to(BookingStatus::Confirmed) {
        Some("Waiting for the owner to confirm.".to_string())
    } else if booking.status.can_transition_to(BookingStatus::Completed) {
        Some("Return the equipment to complete this rental.".to_string())
    } else if booking.status.is_terminal()
        && booking.payment_status.can_transition_to(PaymentStatus::Refunded)
    {
        Some(format!("Deposit refund of ₹{} is due.", booking.security_deposit))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, Equipment};
    use rstest::rstest;

    fn tractor(id: &str, name: &str) -> Equipment {
        Equipment {
            id: id.to_string(),
            owner_id: "o1".to_string(),
            equipment_type: EquipmentType::Tractor,
            name: name.to_string(),
            model_number: "M1".to_string(),
            chassis_number: "C1".to_string(),
            power: None,
            year: None,
            price_per_day: Some(1500),
            location: None,
            availability: Availability::Available,
            image: None,
        }
    }

    fn booking(status: BookingStatus, payment_status: PaymentStatus) -> Booking {
        let start = time::macros::datetime!(2026-03-01 09:30 UTC);
        Booking {
            id: "bk-1".to_string(),
            user_id: "u".to_string(),
            equipment_id: "e1".to_string(),
            start_date: start,
            end_date: start + time::Duration::days(1),
            total_cost: 3500,
            security_deposit: 2000,
            status,
            payment_status,
            created_at: None,
        }
    }

    #[rstest]
    #[case(BookingStatus::Pending, PaymentStatus::Paid, Some("Waiting for the owner to confirm."))]
    #[case(BookingStatus::Confirmed, PaymentStatus::Paid, Some("Return the equipment to complete this rental."))]
    #[case(BookingStatus::Completed, PaymentStatus::Paid, Some("Deposit refund of ₹2000 is due."))]
    #[case(BookingStatus::Cancelled, PaymentStatus::Pending, None)]
    #[case(BookingStatus::Completed, PaymentStatus::Refunded, None)]
    fn next_step_follows_status_transitions(
        #[case] status: BookingStatus,
        #[case] payment_status: PaymentStatus,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            next_step(&booking(status, payment_status)).as_deref(),
            expected
        );
    }

    #[test]
    fn equipment_names_prefer_loaded_listings_then_fetched_details() {
        let mut state = AppState::default();
        state
            .equipment
            .insert(EquipmentType::Tractor, vec![tractor("e1", "Mahindra 575")]);
        let mut names = HashMap::new();
        names.insert("e2".to_string(), "Kubota Tiller".to_string());

        assert_eq!(equipment_name(&state, &names, "e1"), "Mahindra 575");
        assert_eq!(equipment_name(&state, &names, "e2"), "Kubota Tiller");
        assert_eq!(equipment_name(&state, &names, "e9"), "Equipment e9");
    }
}

use dioxus::prelude::*;

use crate::{
    config::AppConfig,
    domain::{
        quote_vehicles, AppState, CacheResource, Coordinates, RequestAction, TransportError,
        TripEstimate,
    },
    infra::{CacheStatus, HarvtechClient},
    ui::components::toast::{push_toast, ToastKind, ToastMessage},
};

#[component]
pub fn TransportPage() -> Element {
    let state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let config = use_context::<AppConfig>();

    let mut pickup_lat = use_signal(String::new);
    let mut pickup_lon = use_signal(String::new);
    let mut drop_lat = use_signal(String::new);
    let mut drop_lon = use_signal(String::new);
    let mut estimates = use_signal(|| None::<Vec<TripEstimate>>);

    use_hook({
        let client = client.clone();
        move || {
            if state.peek().is_stale(&CacheResource::Vehicles, config.cache_ttl) {
                load_vehicles(state, toasts, client);
            }
        }
    });

    let loading = state.with(|st| st.requests.is_pending(RequestAction::LoadVehicles));
    let vehicle_count = state.with(|st| st.vehicles.len());

    let on_estimate = move |evt: FormEvent| {
        evt.prevent_default();
        let trip = read_trip(&pickup_lat(), &pickup_lon(), &drop_lat(), &drop_lon());
        match trip {
            Ok((pickup, drop)) => {
                let quotes = state.with(|st| quote_vehicles(pickup, drop, &st.vehicles));
                if quotes.is_empty() {
                    push_toast(toasts, ToastKind::Info, "No vehicles are available to quote.");
                }
                estimates.set(Some(quotes));
            }
            Err(err) => {
                estimates.set(None);
                push_toast(toasts, ToastKind::Warning, format!("Check the coordinates: {err}"));
            }
        }
    };

    rsx! {
        section { class: "stack",
            div { class: "page-header",
                div {
                    h2 { "Transport" }
                    p { class: "muted small",
                        "Straight-line estimate for {vehicle_count} vehicles. Road distance will be longer."
                    }
                }
                button {
                    class: "button",
                    disabled: loading,
                    onclick: {
                        let client = client.clone();
                        move |_| load_vehicles(state, toasts, client.clone())
                    },
                    if loading { "Loading…" } else { "Refresh" }
                }
            }
            form { class: "form panel", onsubmit: on_estimate,
                label { "Pickup (latitude, longitude)" }
                div { class: "row",
                    input { inputmode: "decimal", placeholder: "13.0827", value: pickup_lat(), oninput: move |evt| pickup_lat.set(evt.value()) }
                    input { inputmode: "decimal", placeholder: "80.2707", value: pickup_lon(), oninput: move |evt| pickup_lon.set(evt.value()) }
                }
                label { "Drop (latitude, longitude)" }
                div { class: "row",
                    input { inputmode: "decimal", placeholder: "11.0168", value: drop_lat(), oninput: move |evt| drop_lat.set(evt.value()) }
                    input { inputmode: "decimal", placeholder: "76.9558", value: drop_lon(), oninput: move |evt| drop_lon.set(evt.value()) }
                }
                button { class: "button primary", r#type: "submit", disabled: vehicle_count == 0, "Estimate cost" }
            }
            if let Some(quotes) = estimates() {
                if !quotes.is_empty() {
                    table { class: "table",
                        thead {
                            tr {
                                th { "Vehicle" }
                                th { class: "numeric", "Distance" }
                                th { class: "numeric", "Time" }
                                th { class: "numeric", "Cost" }
                            }
                        }
                        tbody {
                            for quote in quotes {
                                tr { key: "{quote.vehicle_id}",
                                    td { "{quote.vehicle_name}" }
                                    td { class: "numeric", "{quote.distance_km} km" }
                                    td { class: "numeric", "~{quote.hours} h" }
                                    td { class: "numeric strong", "₹{quote.cost}" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn read_trip(
    pickup_lat: &str,
    pickup_lon: &str,
    drop_lat: &str,
    drop_lon: &str,
) -> Result<(Coordinates, Coordinates), TransportError> {
    Ok((
        Coordinates::parse(pickup_lat, pickup_lon)?,
        Coordinates::parse(drop_lat, drop_lon)?,
    ))
}

fn load_vehicles(
    mut state: Signal<AppState>,
    toasts: Signal<Vec<ToastMessage>>,
    client: HarvtechClient,
) {
    spawn(async move {
        let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::LoadVehicles))
        else {
            return;
        };
        let result = client.vehicles_cached().await;
        if !state.with_mut(|st| st.requests.finish(ticket)) {
            return;
        }
        match result {
            Ok(payload) => {
                state.with_mut(|st| {
                    st.vehicles = payload.data;
                    st.cache
                        .record_fetch(CacheResource::Vehicles, payload.fetched_at);
                });
                if payload.status == CacheStatus::Stale {
                    push_toast(
                        toasts,
                        ToastKind::Warning,
                        "You seem to be offline. Rates shown may be out of date.",
                    );
                }
            }
            Err(err) => push_toast(
                toasts,
                ToastKind::Error,
                format!("Could not load vehicles. {}", err.user_message()),
            ),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_inputs_must_both_parse() {
        let (pickup, drop) = read_trip("13.0827", " 80.2707 ", "11.0168", "76.9558").unwrap();
        assert_eq!(pickup.lat(), 13.0827);
        assert_eq!(drop.lon(), 76.9558);

        assert_eq!(
            read_trip("13.0", "80.2", "north", "76.9"),
            Err(TransportError::Unparseable("north".to_string()))
        );
        assert!(matches!(
            read_trip("95.0", "80.2", "11.0", "76.9"),
            Err(TransportError::InvalidCoordinate { axis: "latitude", .. })
        ));
    }
}

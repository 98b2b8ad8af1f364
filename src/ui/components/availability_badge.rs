use dioxus::prelude::*;

use crate::domain::Availability;

#[component]
pub fn AvailabilityBadge(availability: Availability) -> Element {
    let color = match availability {
        Availability::Available => "badge-green",
        Availability::Rented => "badge-amber",
        Availability::Maintenance => "badge-grey",
    };

    rsx! {
        span { class: "badge {color}", "{availability.label()}" }
    }
}

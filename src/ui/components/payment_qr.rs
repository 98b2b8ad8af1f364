use dioxus::prelude::*;

use crate::util::{assets, pseudo_qr::PseudoQr};

/// Simulated payment code. Nothing is charged; the picture only identifies the attempt.
#[component]
pub fn PaymentQr(reference: String, amount: i64) -> Element {
    let image = assets::svg_data_uri(&PseudoQr::for_reference(&reference).to_svg());

    rsx! {
        figure { class: "payment-qr",
            img { src: "{image}", alt: "Demo payment code", width: "232", height: "232" }
            figcaption {
                p { class: "kpi-value", "₹{amount}" }
                p { class: "mono small", "{reference}" }
                p { class: "notice", "Demo payment: no money is charged. Tap \"I have paid\" to continue." }
            }
        }
    }
}

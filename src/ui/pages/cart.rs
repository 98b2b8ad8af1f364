use dioxus::prelude::*;

use crate::{
    app::Route,
    domain::{cart::parse_quantity, cart::OrderSummary, AppState, CartItem},
    ui::components::{
        kpi_card::KpiCard,
        toast::{push_toast, ToastKind, ToastMessage},
    },
};

#[component]
pub fn CartPage() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let mut last_order = use_signal(|| None::<OrderSummary>);

    let items = state.with(|st| st.cart.items().to_vec());
    let total = state.with(|st| st.cart.total_price());
    let line_count = state.with(|st| st.cart.total_items());

    let on_checkout = move |_| match state.with_mut(|st| st.cart.checkout()) {
        Ok(summary) => {
            push_toast(
                toasts,
                ToastKind::Success,
                format!("Order placed for ₹{}. Sellers will contact you.", summary.total),
            );
            last_order.set(Some(summary));
        }
        Err(err) => push_toast(toasts, ToastKind::Warning, err.to_string()),
    };

    let on_clear = move |_| {
        state.with_mut(|st| st.cart.clear());
        push_toast(toasts, ToastKind::Info, "Cart cleared.");
    };

    rsx! {
        section { class: "stack",
            div { class: "page-header",
                h2 { "Your cart" }
                Link { class: "button ghost", to: Route::Marketplace {}, "Continue shopping" }
            }
            div { class: "kpi-row",
                KpiCard { title: "Items".to_string(), value: line_count.to_string(), description: None }
                KpiCard { title: "Total".to_string(), value: format!("₹{total}"), description: Some("Pay the seller on delivery".to_string()) }
            }
            if items.is_empty() {
                p { class: "empty", "Your cart is empty." }
            } else {
                table { class: "table",
                    thead {
                        tr {
                            th { "Product" }
                            th { "Price" }
                            th { "Quantity" }
                            th { class: "numeric", "Line total" }
                            th {}
                        }
                    }
                    tbody {
                        for item in items {
                            CartRow { key: "{item.id}", item }
                        }
                    }
                }
            }
            div { class: "row",
                button { class: "button primary", disabled: line_count == 0, onclick: on_checkout, "Checkout" }
                button { class: "button ghost", disabled: line_count == 0, onclick: on_clear, "Clear cart" }
            }
            if let Some(order) = last_order() {
                div { class: "panel success",
                    h3 { "Order summary" }
                    ul {
                        for line in order.items.iter() {
                            li { key: "{line.id}", "{line.name}: {line.quantity_label()} = ₹{line.line_total()}" }
                        }
                    }
                    p { class: "strong", "Total ₹{order.total}" }
                }
            }
        }
    }
}

#[component]
fn CartRow(item: CartItem) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let mut editing = use_signal(|| None::<String>);

    let id = item.id.clone();
    let unit = item.unit;

    let step = {
        let id = id.clone();
        move |up: bool| {
            if let Err(err) = state.with_mut(|st| st.cart.step_quantity(&id, up)) {
                push_toast(toasts, ToastKind::Warning, err.to_string());
            }
        }
    };
    let mut step_down = step.clone();
    let mut step_up = step;

    let on_set = {
        let id = id.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            let Some(text) = editing() else {
                return;
            };
            let result = parse_quantity(&text, unit).and_then(|quantity| {
                state.with_mut(|st| st.cart.update_quantity(&id, i64::from(quantity)))
            });
            match result {
                Ok(()) => editing.set(None),
                Err(err) => push_toast(toasts, ToastKind::Warning, err.to_string()),
            }
        }
    };

    let on_remove = move |_| state.with_mut(|st| st.cart.remove_from_cart(&id));

    rsx! {
        tr {
            td {
                p { class: "strong", "{item.name}" }
                p { class: "muted small", "{item.seller}" }
            }
            td { "₹{item.unit_price} / {unit.symbol()}" }
            td {
                match editing() {
                    Some(text) => rsx! {
                        form { class: "row", onsubmit: on_set,
                            input { class: "quantity", value: "{text}", oninput: move |evt| editing.set(Some(evt.value())) }
                            button { class: "button small", r#type: "submit", "Set" }
                        }
                    },
                    None => rsx! {
                        div { class: "stepper",
                            button { class: "button small", onclick: move |_| step_down(false), "−" }
                            button {
                                class: "link-button",
                                title: "Type a quantity",
                                onclick: {
                                    let label = item.quantity_label();
                                    move |_| editing.set(Some(label.clone()))
                                },
                                "{item.quantity_label()}"
                            }
                            button { class: "button small", onclick: move |_| step_up(true), "+" }
                        }
                    },
                }
            }
            td { class: "numeric", "₹{item.line_total()}" }
            td {
                button { class: "button danger small", onclick: on_remove, "Remove" }
            }
        }
    }
}

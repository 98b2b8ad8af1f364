use dioxus::prelude::*;

use crate::{
    app::Route,
    config::AppConfig,
    domain::{
        cart::parse_quantity, validation, AppState, CacheResource, HarvtechApi, NewProduct,
        Product, RequestAction, UnitKind,
    },
    infra::{CacheStatus, HarvtechClient},
    ui::{
        components::toast::{push_toast, ToastKind, ToastMessage},
        pages::humanize_age,
    },
};

#[component]
pub fn MarketplacePage() -> Element {
    let state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let config = use_context::<AppConfig>();

    let mut search = use_signal(String::new);

    use_hook({
        let client = client.clone();
        move || {
            if state.peek().is_stale(&CacheResource::Products, config.cache_ttl) {
                load_products(state, toasts, client);
            }
        }
    });

    let loading = state.with(|st| st.requests.is_pending(RequestAction::LoadProducts));
    let is_owner = state.with(|st| st.session().is_some_and(|s| s.user().is_owner()));
    let updated = state.with(|st| st.cache.fetched_at(&CacheResource::Products).map(humanize_age));
    let query = search().trim().to_lowercase();
    let products: Vec<Product> = state.with(|st| {
        st.products
            .iter()
            .filter(|p| {
                query.is_empty()
                    || p.name.to_lowercase().contains(&query)
                    || p.category.to_lowercase().contains(&query)
                    || p.seller.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    });

    rsx! {
        section { class: "stack",
            div { class: "page-header",
                div {
                    h2 { "Marketplace" }
                    p { class: "muted small",
                        match updated {
                            Some(age) => rsx! { "Updated {age}" },
                            None => rsx! { "Fresh produce and farm supplies near you" },
                        }
                    }
                }
                div { class: "row",
                    Link { class: "button ghost", to: Route::ShoppingCart {}, "View cart" }
                    button {
                        class: "button",
                        disabled: loading,
                        onclick: {
                            let client = client.clone();
                            move |_| load_products(state, toasts, client.clone())
                        },
                        if loading { "Loading…" } else { "Refresh" }
                    }
                }
            }
            input {
                class: "search",
                placeholder: "Search by product, category or seller",
                value: search(),
                oninput: move |evt| search.set(evt.value()),
            }
            if is_owner {
                ListProductForm {}
            }
            if products.is_empty() && !loading {
                p { class: "empty", "No products to show." }
            }
            div { class: "card-grid",
                for product in products {
                    ProductCard { key: "{product.id}", product, can_delete: is_owner }
                }
            }
        }
    }
}

pub(crate) fn load_products(
    mut state: Signal<AppState>,
    toasts: Signal<Vec<ToastMessage>>,
    client: HarvtechClient,
) {
    spawn(async move {
        let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::LoadProducts))
        else {
            return;
        };
        let result = client.products_cached().await;
        if !state.with_mut(|st| st.requests.finish(ticket)) {
            return;
        }
        match result {
            Ok(payload) => {
                tracing::debug!(count = payload.data.len(), status = ?payload.status, "products loaded");
                state.with_mut(|st| {
                    st.products = payload.data;
                    st.cache
                        .record_fetch(CacheResource::Products, payload.fetched_at);
                });
                if payload.status == CacheStatus::Stale {
                    push_toast(
                        toasts,
                        ToastKind::Warning,
                        "You seem to be offline. Showing products saved earlier.",
                    );
                }
            }
            Err(err) => push_toast(
                toasts,
                ToastKind::Error,
                format!("Could not load products. {}", err.user_message()),
            ),
        }
    });
}

#[component]
fn ProductCard(product: Product, can_delete: bool) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();

    let unit = product.unit;
    let mut quantity_input = use_signal(move || unit.step().to_string());
    let deleting = state.with(|st| st.requests.is_pending(RequestAction::DeleteProduct));

    let on_add = {
        let product = product.clone();
        move |_| match parse_quantity(&quantity_input(), unit) {
            Ok(quantity) => {
                state.with_mut(|st| st.cart.add_item(&product, quantity));
                push_toast(toasts, ToastKind::Success, format!("{} added to cart.", product.name));
            }
            Err(err) => push_toast(toasts, ToastKind::Warning, err.to_string()),
        }
    };

    let on_delete = {
        let id = product.id.clone();
        let name = product.name.clone();
        move |_| {
            let client = client.clone();
            let id = id.clone();
            let name = name.clone();
            spawn(async move {
                let Some(session) = state.with(|st| st.session().cloned()) else {
                    return;
                };
                let Some(ticket) =
                    state.with_mut(|st| st.requests.try_begin(RequestAction::DeleteProduct))
                else {
                    return;
                };
                let result = client.delete_product(&session, &id).await;
                if !state.with_mut(|st| st.requests.finish(ticket)) {
                    return;
                }
                match result {
                    Ok(()) => {
                        state.with_mut(|st| {
                            st.products.retain(|p| p.id != id);
                            st.cart.remove_from_cart(&id);
                        });
                        push_toast(toasts, ToastKind::Info, format!("Removed {name}."));
                    }
                    Err(err) => push_toast(toasts, ToastKind::Error, err.user_message()),
                }
            });
        }
    };

    rsx! {
        article { class: "card",
            if let Some(image) = product.image.clone() {
                img { class: "card-image", src: "{image}", alt: "{product.name}" }
            }
            h3 { "{product.name}" }
            p { class: "muted small", "{product.category} · {product.seller}" }
            if let Some(location) = product.location.clone() {
                p { class: "muted small", "📍 {location}" }
            }
            p { class: "price", "₹{product.price} / {unit.symbol()}" }
            div { class: "row",
                input {
                    class: "quantity",
                    inputmode: "decimal",
                    value: quantity_input(),
                    oninput: move |evt| quantity_input.set(evt.value()),
                }
                span { class: "muted", "{unit.symbol()}" }
                button { class: "button primary", onclick: on_add, "Add to cart" }
            }
            if can_delete {
                button { class: "button danger small", disabled: deleting, onclick: on_delete, "Delete listing" }
            }
        }
    }
}

#[component]
fn ListProductForm() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();

    let mut name = use_signal(String::new);
    let mut price = use_signal(String::new);
    let mut unit = use_signal(|| UnitKind::Kg);
    let mut category = use_signal(String::new);
    let mut location = use_signal(String::new);
    let submitting = state.with(|st| st.requests.is_pending(RequestAction::ListProduct));

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let product = match read_listing(&name(), &price(), unit(), &category(), &location()) {
            Ok(product) => product,
            Err(err) => {
                push_toast(toasts, ToastKind::Warning, err.to_string());
                return;
            }
        };
        let client = client.clone();
        spawn(async move {
            let Some(session) = state.with(|st| st.session().cloned()) else {
                return;
            };
            let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::ListProduct))
            else {
                return;
            };
            let result = client.create_product(&session, &product).await;
            if !state.with_mut(|st| st.requests.finish(ticket)) {
                return;
            }
            match result {
                Ok(created) => {
                    push_toast(toasts, ToastKind::Success, format!("{} is now listed.", created.name));
                    state.with_mut(|st| st.products.insert(0, created));
                    name.set(String::new());
                    price.set(String::new());
                }
                Err(err) => push_toast(toasts, ToastKind::Error, err.user_message()),
            }
        });
    };

    rsx! {
        details { class: "panel",
            summary { "List a product for sale" }
            form { class: "form inline", onsubmit: on_submit,
                input { placeholder: "Product name", value: name(), oninput: move |evt| name.set(evt.value()) }
                input { placeholder: "Price (₹)", inputmode: "numeric", value: price(), oninput: move |evt| price.set(evt.value()) }
                select {
                    value: unit().symbol(),
                    onchange: move |evt| {
                        if let Ok(parsed) = evt.value().parse::<UnitKind>() {
                            unit.set(parsed);
                        }
                    },
                    for choice in UnitKind::ALL {
                        option { key: "{choice.symbol()}", value: choice.symbol(), "per {choice.symbol()}" }
                    }
                }
                input { placeholder: "Category", value: category(), oninput: move |evt| category.set(evt.value()) }
                input { placeholder: "Location (optional)", value: location(), oninput: move |evt| location.set(evt.value()) }
                button { class: "button primary", r#type: "submit", disabled: submitting,
                    if submitting { "Listing…" } else { "List product" }
                }
            }
        }
    }
}

fn read_listing(
    name: &str,
    price: &str,
    unit: UnitKind,
    category: &str,
    location: &str,
) -> Result<NewProduct, validation::ValidationError> {
    let location = location.trim();
    Ok(NewProduct {
        name: validation::required("product name", name)?,
        price: validation::positive_price("price", price)?,
        unit,
        category: validation::required("category", category)?,
        location: (!location.is_empty()).then(|| location.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_requires_name_and_positive_price() {
        let listing = read_listing("Tomato", "30", UnitKind::Kg, "Vegetables", " ").unwrap();
        assert_eq!(listing.price, 30);
        assert_eq!(listing.location, None);

        assert!(read_listing("", "30", UnitKind::Kg, "Vegetables", "").is_err());
        assert!(read_listing("Tomato", "-5", UnitKind::Kg, "Vegetables", "").is_err());
    }
}

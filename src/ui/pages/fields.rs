use dioxus::prelude::*;

use crate::{
    app::persist_user_state,
    domain::{validation, AppState, FarmField},
    ui::components::{
        kpi_card::KpiCard,
        toast::{push_toast, ToastKind, ToastMessage},
    },
    util::generate_id,
};

#[component]
pub fn FieldsPage() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();

    let mut name = use_signal(String::new);
    let mut crop = use_signal(String::new);
    let mut area = use_signal(String::new);
    let mut location = use_signal(String::new);

    let fields = state.with(|st| st.fields.clone());
    let total_area: f64 = fields.iter().map(|field| field.area_acres).sum();

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        match read_field(&name(), &crop(), &area(), &location()) {
            Ok(field) => {
                let label = field.name.clone();
                state.with_mut(|st| st.fields.push(field));
                persist_user_state(&state);
                push_toast(toasts, ToastKind::Success, format!("Saved {label}."));
                name.set(String::new());
                crop.set(String::new());
                area.set(String::new());
                location.set(String::new());
            }
            Err(err) => push_toast(toasts, ToastKind::Warning, err.to_string()),
        }
    };

    rsx! {
        section { class: "stack",
            div { class: "page-header",
                div {
                    h2 { "My fields" }
                    p { class: "muted small", "Saved on this device only." }
                }
            }
            div { class: "kpi-row",
                KpiCard { title: "Fields".to_string(), value: fields.len().to_string(), description: None }
                KpiCard { title: "Total area".to_string(), value: format!("{total_area:.1} acres"), description: None }
            }
            form { class: "form panel", onsubmit: on_submit,
                label { "Field name" }
                input { value: name(), oninput: move |evt| name.set(evt.value()) }
                label { "Crop" }
                input { placeholder: "Paddy, sugarcane…", value: crop(), oninput: move |evt| crop.set(evt.value()) }
                label { "Area (acres)" }
                input { inputmode: "decimal", value: area(), oninput: move |evt| area.set(evt.value()) }
                label { "Location (optional)" }
                input { value: location(), oninput: move |evt| location.set(evt.value()) }
                button { class: "button primary", r#type: "submit", "Add field" }
            }
            if fields.is_empty() {
                p { class: "empty", "No fields yet." }
            }
            div { class: "card-grid",
                for field in fields {
                    article { key: "{field.id}", class: "card",
                        h3 { "{field.name}" }
                        p { "{field.crop} · {field.area_acres:.1} acres" }
                        if let Some(place) = field.location.clone() {
                            p { class: "muted small", "📍 {place}" }
                        }
                        button {
                            class: "button danger small",
                            onclick: {
                                let id = field.id.clone();
                                move |_| {
                                    state.with_mut(|st| st.fields.retain(|f| f.id != id));
                                    persist_user_state(&state);
                                }
                            },
                            "Remove"
                        }
                    }
                }
            }
        }
    }
}

fn read_field(
    name: &str,
    crop: &str,
    area: &str,
    location: &str,
) -> Result<FarmField, validation::ValidationError> {
    let location = location.trim();
    Ok(FarmField {
        id: generate_id("field"),
        name: validation::required("field name", name)?,
        crop: validation::required("crop", crop)?,
        area_acres: validation::positive_area("area", area)?,
        location: (!location.is_empty()).then(|| location.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::ValidationError;

    #[test]
    fn fields_need_a_name_crop_and_positive_area() {
        let field = read_field(" North plot ", "Paddy", "2.5", "").unwrap();
        assert_eq!(field.name, "North plot");
        assert_eq!(field.area_acres, 2.5);
        assert!(field.id.starts_with("field-"));

        assert_eq!(
            read_field("", "Paddy", "2", "").unwrap_err(),
            ValidationError::Required("field name")
        );
        assert_eq!(
            read_field("Plot", "Paddy", "0", "").unwrap_err(),
            ValidationError::NotPositive("area")
        );
    }
}

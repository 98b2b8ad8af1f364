use dioxus::prelude::*;

use crate::{
    app::Route,
    domain::{auth, AppState, RegistrationForm, RequestAction, Role},
    infra::HarvtechClient,
    ui::components::toast::{push_toast, ToastKind, ToastMessage},
};

#[component]
pub fn RegisterPage(mobile: String) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let nav = use_navigator();

    let mut form = use_signal(|| RegistrationForm {
        mobile_number: mobile.clone(),
        country: "India".to_string(),
        ..RegistrationForm::default()
    });
    let submitting = state.with(|st| st.requests.is_pending(RequestAction::Register));

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::Register)) else {
            return;
        };
        let client = client.clone();
        let submitted = form();
        spawn(async move {
            let result = auth::register(&client, &submitted).await;
            if !state.with_mut(|st| st.requests.finish(ticket)) {
                return;
            }
            match result {
                Ok(user) => {
                    push_toast(
                        toasts,
                        ToastKind::Success,
                        format!(
                            "Registered! Your farmer ID is {}. Log in with your mobile number.",
                            user.farmer_id
                        ),
                    );
                    nav.push(Route::Marketplace {});
                }
                Err(err) => push_toast(toasts, ToastKind::Error, err.user_message()),
            }
        });
    };

    let current = form();

    rsx! {
        section { class: "panel",
            h2 { "Create your account" }
            form { class: "form", onsubmit: on_submit,
                label { "Full name" }
                input {
                    value: current.name.clone(),
                    oninput: move |evt| form.with_mut(|f| f.name = evt.value()),
                }
                label { "City / village" }
                input {
                    value: current.city.clone(),
                    oninput: move |evt| form.with_mut(|f| f.city = evt.value()),
                }
                label { "Country" }
                input {
                    value: current.country.clone(),
                    oninput: move |evt| form.with_mut(|f| f.country = evt.value()),
                }
                label { "Mobile number" }
                input {
                    r#type: "tel",
                    inputmode: "numeric",
                    maxlength: "10",
                    value: current.mobile_number.clone(),
                    oninput: move |evt| form.with_mut(|f| f.mobile_number = evt.value()),
                }
                label { "Aadhaar number (optional)" }
                input {
                    inputmode: "numeric",
                    placeholder: "1234 5678 9012",
                    value: current.aadhaar_number.clone(),
                    oninput: move |evt| form.with_mut(|f| f.aadhaar_number = evt.value()),
                }
                label { "I am" }
                div { class: "segmented",
                    for role in [Role::User, Role::Owner] {
                        button {
                            key: "{role.as_str()}",
                            r#type: "button",
                            class: if current.role == role { "segment active" } else { "segment" },
                            onclick: move |_| form.with_mut(|f| f.role = role),
                            "{role.label()}"
                        }
                    }
                }
                button { class: "button primary", r#type: "submit", disabled: submitting,
                    if submitting { "Registering…" } else { "Register" }
                }
            }
            p { class: "muted small",
                "Already registered? "
                Link { to: Route::Marketplace {}, "Log in" }
            }
        }
    }
}

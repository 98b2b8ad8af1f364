use dioxus::prelude::*;

use crate::{
    app::{persist_user_state, Route},
    domain::{AppState, LoginFlow, LoginStep, RequestAction},
    infra::HarvtechClient,
    ui::components::toast::{push_toast, ToastKind, ToastMessage},
};

#[component]
pub fn LoginPage() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<HarvtechClient>();
    let nav = use_navigator();

    let mut mobile_input = use_signal(String::new);
    let mut otp_input = use_signal(String::new);
    let mut otp_sent_to = use_signal(|| None::<String>);

    let checking = state.with(|st| st.requests.is_pending(RequestAction::CheckMobile));
    let verifying = state.with(|st| st.requests.is_pending(RequestAction::VerifyOtp));

    let on_request_otp = {
        let client = client.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::CheckMobile))
            else {
                return;
            };
            let client = client.clone();
            let raw = mobile_input();
            spawn(async move {
                let result = LoginFlow::request_otp(&client, &raw).await;
                if !state.with_mut(|st| st.requests.finish(ticket)) {
                    return;
                }
                match result {
                    Ok(LoginStep::OtpSent { mobile_number }) => {
                        push_toast(toasts, ToastKind::Success, format!("OTP sent to {mobile_number}."));
                        otp_sent_to.set(Some(mobile_number));
                    }
                    Ok(LoginStep::RegistrationRequired { mobile_number }) => {
                        push_toast(
                            toasts,
                            ToastKind::Info,
                            "This number is not registered yet. Please sign up first.",
                        );
                        nav.push(Route::Register { mobile: mobile_number });
                    }
                    Err(err) => push_toast(toasts, ToastKind::Error, err.user_message()),
                }
            });
        }
    };

    let on_verify = {
        let client = client.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            let Some(mobile_number) = otp_sent_to() else {
                return;
            };
            let Some(ticket) = state.with_mut(|st| st.requests.try_begin(RequestAction::VerifyOtp))
            else {
                return;
            };
            let client = client.clone();
            let otp = otp_input();
            spawn(async move {
                let result = LoginFlow::verify(&client, &mobile_number, &otp).await;
                if !state.with_mut(|st| st.requests.finish(ticket)) {
                    return;
                }
                match result {
                    Ok(session) => {
                        let name = session.user().name.clone();
                        state.with_mut(|st| st.sign_in(session));
                        persist_user_state(&state);
                        push_toast(toasts, ToastKind::Success, format!("Welcome, {name}!"));
                    }
                    Err(err) => push_toast(toasts, ToastKind::Error, err.user_message()),
                }
            });
        }
    };

    rsx! {
        section { class: "panel",
            h2 { "Log in" }
            p { class: "muted", "Use your registered mobile number. We will send a one-time password." }
            match otp_sent_to() {
                None => rsx! {
                    form { class: "form", onsubmit: on_request_otp,
                        label { "Mobile number" }
                        input {
                            r#type: "tel",
                            inputmode: "numeric",
                            maxlength: "10",
                            placeholder: "10-digit mobile number",
                            value: mobile_input(),
                            oninput: move |evt| mobile_input.set(evt.value()),
                        }
                        button { class: "button primary", r#type: "submit", disabled: checking,
                            if checking { "Checking…" } else { "Send OTP" }
                        }
                    }
                    p { class: "muted small",
                        "New to HARVTECH? "
                        Link { to: Route::Register { mobile: mobile_input() }, "Create an account" }
                    }
                },
                Some(sent_to) => rsx! {
                    form { class: "form", onsubmit: on_verify,
                        label { "OTP sent to {sent_to}" }
                        input {
                            inputmode: "numeric",
                            maxlength: "6",
                            placeholder: "6-digit OTP",
                            value: otp_input(),
                            oninput: move |evt| otp_input.set(evt.value()),
                        }
                        button { class: "button primary", r#type: "submit", disabled: verifying,
                            if verifying { "Verifying…" } else { "Verify and log in" }
                        }
                        button {
                            class: "button ghost",
                            r#type: "button",
                            onclick: move |_| {
                                otp_sent_to.set(None);
                                otp_input.set(String::new());
                            },
                            "Use a different number"
                        }
                    }
                },
            }
        }
    }
}

//! Mobile number + OTP login and farmer registration.

use thiserror::Error;

use super::{
    entities::{Role, User, DEFAULT_COUNTRY},
    ports::{ApiError, HarvtechApi, Registration},
    session::Session,
    validation::{self, ValidationError},
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("incorrect OTP")]
    OtpRejected,
    #[error("this mobile number is already registered")]
    AlreadyRegistered,
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginStep {
    /// Number unknown to the server; no OTP was sent.
    RegistrationRequired { mobile_number: String },
    OtpSent { mobile_number: String },
}

/// Login runs `check-mobile` before `send-otp` so unknown numbers never get an OTP.
pub struct LoginFlow;

impl LoginFlow {
    pub async fn request_otp<A>(api: &A, raw_mobile: &str) -> Result<LoginStep, AuthError>
    where
        A: HarvtechApi + ?Sized,
    {
        let mobile_number = validation::mobile_number(raw_mobile)?;
        if !api.check_mobile(&mobile_number).await? {
            tracing::info!("mobile number not registered; redirecting to registration");
            return Ok(LoginStep::RegistrationRequired { mobile_number });
        }
        api.send_otp(&mobile_number).await?;
        tracing::info!("OTP sent");
        Ok(LoginStep::OtpSent { mobile_number })
    }

    pub async fn verify<A>(api: &A, mobile_number: &str, raw_otp: &str) -> Result<Session, AuthError>
    where
        A: HarvtechApi + ?Sized,
    {
        let mobile_number = validation::mobile_number(mobile_number)?;
        let otp = validation::otp(raw_otp)?;
        let verification = api.verify_otp(&mobile_number, &otp).await?;
        match verification.user {
            Some(user) if verification.success => {
                tracing::info!(user = %user.id, "signed in");
                Ok(Session::new(user))
            }
            _ => Err(AuthError::OtpRejected),
        }
    }
}

/// Raw registration form input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistrationForm {
    pub name: String,
    pub city: String,
    pub country: String,
    pub aadhaar_number: String,
    pub mobile_number: String,
    pub role: Role,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Registration, ValidationError> {
        let country = self.country.trim();
        Ok(Registration {
            name: validation::required("name", &self.name)?,
            city: validation::required("city", &self.city)?,
            country: if country.is_empty() {
                DEFAULT_COUNTRY.to_string()
            } else {
                country.to_string()
            },
            aadhaar_number: validation::aadhaar(&self.aadhaar_number)?,
            mobile_number: validation::mobile_number(&self.mobile_number)?,
            role: self.role,
        })
    }
}

/// Registers a new farmer or owner. Numbers already known to the server are refused
/// before the registration call.
pub async fn register<A>(api: &A, form: &RegistrationForm) -> Result<User, AuthError>
where
    A: HarvtechApi + ?Sized,
{
    let registration = form.validate()?;
    if api.check_mobile(&registration.mobile_number).await? {
        return Err(AuthError::AlreadyRegistered);
    }
    let user = api.register(&registration).await?;
    tracing::info!(farmer_id = %user.farmer_id, role = user.role.as_str(), "registered");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockHarvtechApi, OtpVerification};

    fn user() -> User {
        User {
            id: "u-9".to_string(),
            mobile_number: "9876543210".to_string(),
            role: Role::User,
            farmer_id: "FRM-9".to_string(),
            name: "Selvi".to_string(),
            city: "Trichy".to_string(),
            country: "India".to_string(),
            aadhaar_number: None,
            is_verified: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn unregistered_number_never_gets_an_otp() {
        let mut api = MockHarvtechApi::new();
        api.expect_check_mobile()
            .times(1)
            .returning(|_| Ok(false));
        api.expect_send_otp().times(0);

        let step = LoginFlow::request_otp(&api, "9876543210").await.unwrap();
        assert_eq!(
            step,
            LoginStep::RegistrationRequired {
                mobile_number: "9876543210".to_string()
            }
        );
    }

    #[tokio::test]
    async fn registered_number_gets_an_otp() {
        let mut api = MockHarvtechApi::new();
        api.expect_check_mobile().returning(|_| Ok(true));
        api.expect_send_otp()
            .times(1)
            .withf(|mobile| mobile == "9876543210")
            .returning(|_| Ok(()));

        let step = LoginFlow::request_otp(&api, " 9876543210 ").await.unwrap();
        assert!(matches!(step, LoginStep::OtpSent { .. }));
    }

    #[tokio::test]
    async fn malformed_number_makes_no_calls() {
        let mut api = MockHarvtechApi::new();
        api.expect_check_mobile().times(0);
        api.expect_send_otp().times(0);

        let err = LoginFlow::request_otp(&api, "12345").await.unwrap_err();
        assert_eq!(err, AuthError::Invalid(ValidationError::MobileNumber));
    }

    #[tokio::test]
    async fn verified_otp_opens_a_session() {
        let mut api = MockHarvtechApi::new();
        api.expect_verify_otp().returning(|_, _| {
            Ok(OtpVerification {
                success: true,
                user: Some(user()),
            })
        });

        let session = LoginFlow::verify(&api, "9876543210", "123456").await.unwrap();
        assert_eq!(session.bearer_token(), "u-9");
    }

    #[tokio::test]
    async fn rejected_otp_is_reported() {
        let mut api = MockHarvtechApi::new();
        api.expect_verify_otp().returning(|_, _| {
            Ok(OtpVerification {
                success: false,
                user: None,
            })
        });

        let err = LoginFlow::verify(&api, "9876543210", "000000").await.unwrap_err();
        assert_eq!(err, AuthError::OtpRejected);
    }

    #[tokio::test]
    async fn registration_defaults_country_and_refuses_known_numbers() {
        let form = RegistrationForm {
            name: "Selvi".to_string(),
            city: "Trichy".to_string(),
            mobile_number: "9876543210".to_string(),
            ..RegistrationForm::default()
        };
        assert_eq!(form.validate().unwrap().country, "India");

        let mut api = MockHarvtechApi::new();
        api.expect_check_mobile().returning(|_| Ok(true));
        api.expect_register().times(0);
        assert_eq!(
            register(&api, &form).await.unwrap_err(),
            AuthError::AlreadyRegistered
        );
    }

    #[tokio::test]
    async fn registration_returns_assigned_farmer_id() {
        let form = RegistrationForm {
            name: "Selvi".to_string(),
            city: "Trichy".to_string(),
            mobile_number: "9876543210".to_string(),
            aadhaar_number: "1234 5678 9012".to_string(),
            ..RegistrationForm::default()
        };
        let mut api = MockHarvtechApi::new();
        api.expect_check_mobile().returning(|_| Ok(false));
        api.expect_register()
            .withf(|registration| registration.aadhaar_number.as_deref() == Some("123456789012"))
            .returning(|_| Ok(user()));

        let user = register(&api, &form).await.unwrap();
        assert_eq!(user.farmer_id, "FRM-9");
    }
}

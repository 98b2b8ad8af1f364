//! Asynchronous client for the HARVTECH REST server.
//!
//! - Implements [`HarvtechApi`] over `reqwest` with camelCase JSON bodies.
//! - Catalogue reads (equipment, vehicles, products) sit behind an in-memory
//!   TTL cache that falls back to stale data when the network is down.

use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::domain::{
    booking::BookingRequest,
    entities::{
        Availability, Booking, BookingStatus, Equipment, EquipmentType, NewProduct, PaymentStatus,
        Product, Role, Rupees, TransportVehicle, User, DEFAULT_COUNTRY, MAX_LISTED_PRICE,
    },
    ports::{ApiError, HarvtechApi, OtpVerification, Registration},
    session::Session,
    UnitKind,
};

const USER_AGENT: &str = concat!("harvtech/", env!("CARGO_PKG_VERSION"));
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }
}

#[derive(Default)]
struct CatalogueCache {
    equipment: HashMap<EquipmentType, Option<Cached<Vec<Equipment>>>>,
    vehicles: Option<Cached<Vec<TransportVehicle>>>,
    products: Option<Cached<Vec<Product>>>,
}

#[derive(Clone)]
pub struct HarvtechClient {
    http: Client,
    base_url: Url,
    cache: Arc<Mutex<CatalogueCache>>,
    ttl: Duration,
}

impl HarvtechClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClientBuildError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            cache: Arc::new(Mutex::new(CatalogueCache::default())),
            ttl: config.cache_ttl,
        })
    }

    pub async fn equipment_cached(
        &self,
        kind: EquipmentType,
    ) -> Result<CachedPayload<Vec<Equipment>>, ApiError> {
        self.cached_or_fetch(
            "equipment",
            move |cache| cache.equipment.entry(kind).or_default(),
            || async move {
                let url = self.url(&["api", "equipment", kind.as_str()])?;
                let dtos: Vec<EquipmentDto> = self.send_json(self.http.get(url)).await?;
                Ok(dtos.into_iter().map(Equipment::from).collect())
            },
        )
        .await
    }

    pub async fn vehicles_cached(&self) -> Result<CachedPayload<Vec<TransportVehicle>>, ApiError> {
        self.cached_or_fetch(
            "vehicles",
            |cache| &mut cache.vehicles,
            || async move {
                let url = self.url(&["api", "transport", "vehicles"])?;
                let dtos: Vec<VehicleDto> = self.send_json(self.http.get(url)).await?;
                Ok(dtos.into_iter().map(TransportVehicle::from).collect())
            },
        )
        .await
    }

    pub async fn products_cached(&self) -> Result<CachedPayload<Vec<Product>>, ApiError> {
        self.cached_or_fetch(
            "products",
            |cache| &mut cache.products,
            || async move {
                let url = self.url(&["api", "marketplace", "products"])?;
                let dtos: Vec<ProductDto> = self.send_json(self.http.get(url)).await?;
                Ok(dtos
                    .into_iter()
                    .filter_map(|dto| match Product::try_from(dto) {
                        Ok(product) => Some(product),
                        Err(reason) => {
                            tracing::warn!(%reason, "skipping product");
                            None
                        }
                    })
                    .collect())
            },
        )
        .await
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.lock().await;
        *cache = CatalogueCache::default();
    }

    async fn cached_or_fetch<T, S, F, Fut>(
        &self,
        resource: &'static str,
        slot: S,
        fetch: F,
    ) -> Result<CachedPayload<T>, ApiError>
    where
        T: Clone + Send,
        S: Fn(&mut CatalogueCache) -> &mut Option<Cached<T>> + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        let fresh = {
            let mut cache = self.cache.lock().await;
            slot(&mut cache).as_ref().and_then(|entry| entry.if_fresh(self.ttl))
        };
        if let Some(payload) = fresh {
            tracing::debug!(resource, "serving cached catalogue");
            return Ok(payload);
        }

        match fetch().await {
            Ok(data) => {
                let fetched_at = SystemTime::now();
                let mut cache = self.cache.lock().await;
                *slot(&mut cache) = Some(Cached::new(data.clone(), fetched_at));
                Ok(CachedPayload::new(data, fetched_at, CacheStatus::Fresh))
            }
            Err(error) if error.is_retryable() => {
                let cache = &mut *self.cache.lock().await;
                match slot(cache).as_ref().map(Cached::stale) {
                    Some(stale) => {
                        tracing::warn!(resource, %error, "request failed; serving stale catalogue");
                        Ok(stale)
                    }
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = checked(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|error| ApiError::Decode(error.to_string()))
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        build_url(&self.base_url, segments)
    }
}

async fn checked(builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let response = builder
        .send()
        .await
        .map_err(|error| ApiError::Transport(error.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error = error_for_status(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), %error, "request rejected");
    Err(error)
}

/// Appends escaped path segments to the base URL.
fn build_url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("base URL cannot hold a path: {base}")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Maps a non-success response onto a typed error, keeping the server's message.
fn error_for_status(status: u16, body: &str) -> ApiError {
    let message = server_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        400 | 422 => ApiError::Validation(message),
        401 | 403 => ApiError::Unauthorized,
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        _ => ApiError::Server { status, message },
    }
}

fn server_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default, alias = "error")]
        message: Option<String>,
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed.message.filter(|m| !m.trim().is_empty()),
        Err(_) => Some(trimmed.chars().take(200).collect()),
    }
}

#[async_trait]
impl HarvtechApi for HarvtechClient {
    async fn check_mobile(&self, mobile_number: &str) -> Result<bool, ApiError> {
        let url = self.url(&["api", "check-mobile"])?;
        let body = MobileBody { mobile_number };
        let response: CheckMobileResponse = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(response.is_registered)
    }

    async fn send_otp(&self, mobile_number: &str) -> Result<(), ApiError> {
        let url = self.url(&["api", "send-otp"])?;
        checked(self.http.post(url).json(&MobileBody { mobile_number })).await?;
        Ok(())
    }

    async fn verify_otp(&self, mobile_number: &str, otp: &str) -> Result<OtpVerification, ApiError> {
        let url = self.url(&["api", "verify-otp"])?;
        let body = VerifyOtpBody { mobile_number, otp };
        let response: VerifyOtpResponse = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(OtpVerification {
            success: response.success,
            user: response.user.map(User::from),
        })
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let url = self.url(&["api", "register"])?;
        let body = RegisterBody::from(registration);
        let response: UserEnvelope = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(response.into_user())
    }

    async fn equipment_by_type(&self, kind: EquipmentType) -> Result<Vec<Equipment>, ApiError> {
        Ok(self.equipment_cached(kind).await?.data)
    }

    async fn equipment_details(&self, id: &str) -> Result<Equipment, ApiError> {
        let url = self.url(&["api", "equipment", "details", id])?;
        let dto: EquipmentDto = self.send_json(self.http.get(url)).await?;
        Ok(Equipment::from(dto))
    }

    async fn create_booking(
        &self,
        session: &Session,
        request: &BookingRequest,
    ) -> Result<Booking, ApiError> {
        let url = self.url(&["api", "bookings"])?;
        let builder = self
            .http
            .post(url)
            .bearer_auth(session.bearer_token())
            .header(IDEMPOTENCY_HEADER, request.idempotency_key.to_string())
            .json(request);
        let dto: BookingDto = self.send_json(builder).await?;
        let booking = Booking::try_from(dto)?;
        tracing::info!(booking = %booking.id, "booking created");
        Ok(booking)
    }

    async fn user_bookings(&self, session: &Session) -> Result<Vec<Booking>, ApiError> {
        let url = self.url(&["api", "user", "bookings"])?;
        let dtos: Vec<BookingDto> = self
            .send_json(self.http.get(url).bearer_auth(session.bearer_token()))
            .await?;
        dtos.into_iter().map(Booking::try_from).collect()
    }

    async fn transport_vehicles(&self) -> Result<Vec<TransportVehicle>, ApiError> {
        Ok(self.vehicles_cached().await?.data)
    }

    async fn marketplace_products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.products_cached().await?.data)
    }

    async fn create_product(&self, session: &Session, product: &NewProduct) -> Result<Product, ApiError> {
        let url = self.url(&["api", "marketplace", "products"])?;
        let body = NewProductBody::from(product);
        let dto: ProductDto = self
            .send_json(
                self.http
                    .post(url)
                    .bearer_auth(session.bearer_token())
                    .json(&body),
            )
            .await?;
        self.cache.lock().await.products = None;
        Product::try_from(dto).map_err(ApiError::Decode)
    }

    async fn delete_product(&self, session: &Session, id: &str) -> Result<(), ApiError> {
        let url = self.url(&["api", "marketplace", "products", id])?;
        checked(self.http.delete(url).bearer_auth(session.bearer_token())).await?;
        self.cache.lock().await.products = None;
        Ok(())
    }
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
        {
            Some(CachedPayload::new(
                self.value.clone(),
                self.fetched_at,
                CacheStatus::Cached,
            ))
        } else {
            None
        }
    }

    fn stale(&self) -> CachedPayload<T> {
        CachedPayload::new(self.value.clone(), self.fetched_at, CacheStatus::Stale)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MobileBody<'a> {
    mobile_number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpBody<'a> {
    mobile_number: &'a str,
    otp: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckMobileResponse {
    is_registered: bool,
}

#[derive(Deserialize)]
struct VerifyOtpResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user: Option<UserDto>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    name: &'a str,
    city: &'a str,
    country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aadhaar_number: Option<&'a str>,
    mobile_number: &'a str,
    role: Role,
}

impl<'a> From<&'a Registration> for RegisterBody<'a> {
    fn from(value: &'a Registration) -> Self {
        Self {
            name: &value.name,
            city: &value.city,
            country: &value.country,
            aadhaar_number: value.aadhaar_number.as_deref(),
            mobile_number: &value.mobile_number,
            role: value.role,
        }
    }
}

#[derive(Serialize)]
struct NewProductBody<'a> {
    name: &'a str,
    price: Rupees,
    unit: UnitKind,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

impl<'a> From<&'a NewProduct> for NewProductBody<'a> {
    fn from(value: &'a NewProduct) -> Self {
        Self {
            name: &value.name,
            price: value.price,
            unit: value.unit,
            category: &value.category,
            location: value.location.as_deref(),
        }
    }
}

/// Registration replies with either the user or `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: UserDto },
    Bare(UserDto),
}

impl UserEnvelope {
    fn into_user(self) -> User {
        match self {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => User::from(user),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    mobile_number: String,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    farmer_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    aadhaar_number: Option<String>,
    #[serde(default)]
    is_verified: bool,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            mobile_number: dto.mobile_number,
            role: dto.role,
            farmer_id: dto.farmer_id.unwrap_or_default(),
            name: dto.name,
            city: dto.city,
            country: dto
                .country
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            aadhaar_number: dto.aadhaar_number,
            is_verified: dto.is_verified,
            created_at: parse_timestamp(dto.created_at.as_deref()),
            updated_at: parse_timestamp(dto.updated_at.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquipmentDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    #[serde(deserialize_with = "string_from_json")]
    owner_id: String,
    #[serde(rename = "type", alias = "equipmentType")]
    equipment_type: EquipmentType,
    name: String,
    #[serde(default)]
    model_number: String,
    #[serde(default)]
    chassis_number: String,
    #[serde(default)]
    power: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    price_per_day: Option<serde_json::Value>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    availability: Option<Availability>,
    #[serde(default)]
    image: Option<String>,
}

impl From<EquipmentDto> for Equipment {
    fn from(dto: EquipmentDto) -> Self {
        Self {
            id: dto.id,
            owner_id: dto.owner_id,
            equipment_type: dto.equipment_type,
            name: dto.name,
            model_number: dto.model_number,
            chassis_number: dto.chassis_number,
            power: dto.power,
            year: dto.year,
            price_per_day: dto.price_per_day.as_ref().and_then(price_from_value),
            location: dto.location,
            availability: dto.availability.unwrap_or_default(),
            image: dto.image,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    #[serde(deserialize_with = "string_from_json")]
    user_id: String,
    #[serde(deserialize_with = "string_from_json")]
    equipment_id: String,
    start_date: String,
    end_date: String,
    total_cost: Rupees,
    security_deposit: Rupees,
    #[serde(default)]
    status: BookingStatus,
    #[serde(default)]
    payment_status: PaymentStatus,
    #[serde(default)]
    created_at: Option<String>,
}

impl TryFrom<BookingDto> for Booking {
    type Error = ApiError;

    fn try_from(dto: BookingDto) -> Result<Self, Self::Error> {
        let parse = |field: &str, raw: &str| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|_| ApiError::Decode(format!("booking {field} is not a timestamp: {raw}")))
        };
        let booking = Self {
            start_date: parse("startDate", &dto.start_date)?,
            end_date: parse("endDate", &dto.end_date)?,
            id: dto.id,
            user_id: dto.user_id,
            equipment_id: dto.equipment_id,
            total_cost: dto.total_cost,
            security_deposit: dto.security_deposit,
            status: dto.status,
            payment_status: dto.payment_status,
            created_at: parse_timestamp(dto.created_at.as_deref()),
        };
        if booking.end_date <= booking.start_date {
            return Err(ApiError::Decode(format!(
                "booking {} ends before it starts",
                booking.id
            )));
        }
        Ok(booking)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    name: String,
    #[serde(default, rename = "type", alias = "vehicleType")]
    vehicle_type: Option<String>,
    #[serde(default)]
    capacity: Option<String>,
    #[serde(default)]
    price_per_km: Option<serde_json::Value>,
    #[serde(default)]
    estimated_hours: Option<u32>,
    #[serde(default)]
    driver_name: Option<String>,
}

impl From<VehicleDto> for TransportVehicle {
    fn from(dto: VehicleDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            vehicle_type: dto.vehicle_type.unwrap_or_else(|| "Vehicle".to_string()),
            capacity: dto.capacity,
            // NaN is rejected by the estimator with a per-vehicle warning.
            price_per_km: dto
                .price_per_km
                .as_ref()
                .and_then(number_from_value)
                .unwrap_or(f64::NAN),
            estimated_hours: dto.estimated_hours,
            driver_name: dto.driver_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    name: String,
    #[serde(default, alias = "sellerName")]
    seller: Option<String>,
    price: serde_json::Value,
    unit: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl TryFrom<ProductDto> for Product {
    type Error = String;

    fn try_from(dto: ProductDto) -> Result<Self, Self::Error> {
        let unit = dto
            .unit
            .parse::<UnitKind>()
            .map_err(|_| format!("product {} has unknown unit {:?}", dto.id, dto.unit))?;
        let price = price_from_value(&dto.price)
            .ok_or_else(|| format!("product {} has no usable price", dto.id))?;
        Ok(Self {
            id: dto.id,
            name: dto.name,
            seller: dto.seller.unwrap_or_else(|| "Local seller".to_string()),
            price,
            unit,
            category: dto.category.unwrap_or_else(|| "Other".to_string()),
            location: dto.location,
            image: dto.image,
        })
    }
}

/// Decimal columns arrive as numbers or as numeric strings.
fn number_from_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

/// Whole rupees in `0..=MAX_LISTED_PRICE`; anything else counts as unpriced.
fn price_from_value(value: &serde_json::Value) -> Option<Rupees> {
    number_from_value(value)
        .map(f64::round)
        .filter(|price| (0.0..=MAX_LISTED_PRICE as f64).contains(price))
        .map(|price| price as Rupees)
}

fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
}

fn string_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn config(base: &str) -> AppConfig {
        AppConfig::from_lookup(|name| match name {
            "HARVTECH_API_BASE_URL" => Some(base.to_string()),
            "HARVTECH_HTTP_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[rstest]
    #[case(400, r#"{"message":"endDate must be after startDate"}"#, ApiError::Validation("endDate must be after startDate".into()))]
    #[case(422, "", ApiError::Validation("HTTP 422".into()))]
    #[case(401, "", ApiError::Unauthorized)]
    #[case(403, r#"{"error":"owner only"}"#, ApiError::Unauthorized)]
    #[case(404, r#"{"error":"Equipment not found"}"#, ApiError::NotFound("Equipment not found".into()))]
    #[case(409, r#"{"message":"already rented"}"#, ApiError::Conflict("already rented".into()))]
    #[case(502, "Bad Gateway", ApiError::Server { status: 502, message: "Bad Gateway".into() })]
    fn statuses_map_to_typed_errors(#[case] status: u16, #[case] body: &str, #[case] expected: ApiError) {
        assert_eq!(error_for_status(status, body), expected);
    }

    #[test]
    fn urls_escape_ids_and_keep_base_path() {
        let base = Url::parse("https://api.harvtech.in/v1/").unwrap();
        let url = build_url(&base, &["api", "equipment", "details", "a b/c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.harvtech.in/v1/api/equipment/details/a%20b%2Fc"
        );
    }

    #[test]
    fn equipment_accepts_numeric_ids_and_decimal_strings() {
        let dto: EquipmentDto = serde_json::from_value(json!({
            "id": 12,
            "ownerId": "o-1",
            "type": "tractor",
            "name": "Mahindra 575",
            "modelNumber": "575 DI",
            "chassisNumber": "CH-1",
            "pricePerDay": "1500.00",
            "availability": "rented"
        }))
        .unwrap();
        let equipment = Equipment::from(dto);
        assert_eq!(equipment.id, "12");
        assert_eq!(equipment.price_per_day, Some(1500));
        assert_eq!(equipment.availability, Availability::Rented);
    }

    #[test]
    fn equipment_without_availability_is_available() {
        let dto: EquipmentDto = serde_json::from_value(json!({
            "id": "e", "ownerId": 3, "type": "weeder", "name": "Weeder"
        }))
        .unwrap();
        let equipment = Equipment::from(dto);
        assert!(equipment.is_available());
        assert_eq!(equipment.price_per_day, None);
    }

    #[rstest]
    #[case(json!("-5000"))]
    #[case(json!(-1))]
    #[case(json!(1e30))]
    #[case(json!(MAX_LISTED_PRICE + 1))]
    fn equipment_prices_out_of_range_are_on_request(#[case] price: serde_json::Value) {
        let dto: EquipmentDto = serde_json::from_value(json!({
            "id": "e", "ownerId": "o", "type": "tractor", "name": "Swaraj 744", "pricePerDay": price
        }))
        .unwrap();
        let equipment = Equipment::from(dto);
        assert_eq!(equipment.price_per_day, None);
        assert!(crate::domain::compute_cost(&equipment).is_err());
    }

    #[test]
    fn equipment_price_at_the_ceiling_is_kept() {
        let dto: EquipmentDto = serde_json::from_value(json!({
            "id": "e", "ownerId": "o", "type": "tiller", "name": "Kubota", "pricePerDay": MAX_LISTED_PRICE
        }))
        .unwrap();
        assert_eq!(Equipment::from(dto).price_per_day, Some(MAX_LISTED_PRICE));
    }

    #[rstest]
    #[case(json!(-52))]
    #[case(json!(1e30))]
    fn products_with_unusable_prices_are_refused(#[case] price: serde_json::Value) {
        let dto: ProductDto = serde_json::from_value(json!({
            "id": "p", "name": "Milk", "price": price, "unit": "liter"
        }))
        .unwrap();
        assert!(Product::try_from(dto).is_err());
    }

    #[test]
    fn booking_with_inverted_dates_is_rejected() {
        let dto: BookingDto = serde_json::from_value(json!({
            "id": 1,
            "userId": "u",
            "equipmentId": "e",
            "startDate": "2026-03-02T09:30:00Z",
            "endDate": "2026-03-01T09:30:00Z",
            "totalCost": 3500,
            "securityDeposit": 2000
        }))
        .unwrap();
        assert!(matches!(Booking::try_from(dto), Err(ApiError::Decode(_))));
    }

    #[test]
    fn booking_decodes_fractional_timestamps() {
        let dto: BookingDto = serde_json::from_value(json!({
            "id": "b-1",
            "userId": "u",
            "equipmentId": "e",
            "startDate": "2026-03-01T09:30:00.000Z",
            "endDate": "2026-03-02T09:30:00.000Z",
            "totalCost": 3500,
            "securityDeposit": 2000,
            "status": "confirmed",
            "paymentStatus": "paid"
        }))
        .unwrap();
        let booking = Booking::try_from(dto).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn products_with_unknown_units_are_refused() {
        let dto: ProductDto = serde_json::from_value(json!({
            "id": "p", "name": "Honey", "price": 400, "unit": "jar"
        }))
        .unwrap();
        assert!(Product::try_from(dto).is_err());

        let dto: ProductDto = serde_json::from_value(json!({
            "id": "p", "name": "Milk", "price": "52", "unit": "liter", "sellerName": "Aavin"
        }))
        .unwrap();
        let product = Product::try_from(dto).unwrap();
        assert_eq!((product.price, product.unit), (52, UnitKind::Liter));
        assert_eq!(product.seller, "Aavin");
    }

    #[test]
    fn registration_reply_may_be_wrapped() {
        let wrapped: UserEnvelope = serde_json::from_value(json!({
            "user": { "id": 7, "mobileNumber": "9876543210", "farmerId": "FRM-7", "role": "owner" }
        }))
        .unwrap();
        let user = wrapped.into_user();
        assert_eq!(user.farmer_id, "FRM-7");
        assert_eq!(user.country, "India");
        assert!(user.is_owner());
    }

    #[test]
    fn booking_request_body_is_camel_case_without_key() {
        let request = BookingRequest {
            equipment_id: "e-1".into(),
            start_date: time::macros::datetime!(2026-03-01 09:30 UTC),
            end_date: time::macros::datetime!(2026-03-02 09:30 UTC),
            total_cost: 3500,
            security_deposit: 2000,
            idempotency_key: uuid::Uuid::new_v4(),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["equipmentId"], "e-1");
        assert_eq!(body["totalCost"], 3500);
        assert!(body.get("idempotencyKey").is_none());
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_network() {
        let client = HarvtechClient::new(&config("http://127.0.0.1:9/")).unwrap();
        client.cache.lock().await.vehicles = Some(Cached::new(Vec::new(), SystemTime::now()));

        let payload = client.vehicles_cached().await.unwrap();
        assert_eq!(payload.status, CacheStatus::Cached);
    }

    #[tokio::test]
    async fn unreachable_server_falls_back_to_stale_cache() {
        let client = HarvtechClient::new(&config("http://127.0.0.1:9/")).unwrap();
        let long_ago = SystemTime::now() - Duration::from_secs(3600);
        client.cache.lock().await.products = Some(Cached::new(Vec::new(), long_ago));

        let payload = client.products_cached().await.unwrap();
        assert_eq!(payload.status, CacheStatus::Stale);
        assert_eq!(payload.fetched_at, long_ago);
    }

    #[tokio::test]
    async fn unreachable_server_without_cache_is_a_transport_error() {
        let client = HarvtechClient::new(&config("http://127.0.0.1:9/")).unwrap();
        let error = client.vehicles_cached().await.unwrap_err();
        assert!(matches!(error, ApiError::Transport(_)));
    }
}

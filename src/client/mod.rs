pub mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::ClientConfig;
use crate::models::{
    AvailabilitySlot, Booking, BookingRequest, EarningsSummary, NewResource, NewReview, NewSlot,
    RegisterRequest, Resource, Review, SlotStatusUpdate, User,
};
use crate::session::SessionContext;

pub use error::{ClientError, ErrorKind};

pub const SESSION_COOKIE: &str = "jwt";
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// The slice of the API the booking flow depends on.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn list_slots(&self, resource_id: i64) -> Result<Vec<AvailabilitySlot>, ClientError>;
    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError>;
    async fn cancel_booking(&self, booking_id: i64) -> Result<Booking, ClientError>;
    async fn customer_bookings(&self, customer_id: i64) -> Result<Vec<Booking>, ClientError>;
}

/// HTTP client for the booking REST API.
///
/// Cookies set by the server are kept in a jar and sent on every request.
/// The `XSRF-TOKEN` cookie is echoed back as `X-XSRF-TOKEN`, and the `jwt`
/// cookie is also forwarded as a bearer token.
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    jar: Arc<Jar>,
    session: Arc<SessionContext>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionContext>) -> Result<Self, ClientError> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("base URL {}: {e}", config.base_url)))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base,
            http,
            jar,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// Value of a cookie the jar would send to the API, if any.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some(token) = self.cookie(XSRF_COOKIE) {
            req = req.header(XSRF_HEADER, token);
        }
        if let Some(jwt) = self.cookie(SESSION_COOKIE).filter(|v| !v.is_empty()) {
            req = req.bearer_auth(jwt);
        }
        req
    }

    async fn send_raw(&self, req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = ClientError::from_response(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), kind = %err.kind(), error = %err, "API request failed");
        Err(err)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.send_raw(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<(), ClientError> {
        self.send_raw(req).await?;
        Ok(())
    }

    // ── Auth ──

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        self.send(self.request(Method::POST, "/auth/register").json(request))
            .await
    }

    /// Logs in, then loads the current user into the session context.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let body = json!({ "email": email, "password": password });
        self.send_empty(self.request(Method::POST, "/auth/login").json(&body))
            .await?;
        let user = self.current_user().await?;
        tracing::info!(user_id = user.id, role = user.role.as_str(), "logged in");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .send_empty(self.request(Method::POST, "/auth/logout"))
            .await;
        self.session.clear();
        result
    }

    /// Fetches `/auth/me` and keeps the session context in step with it.
    pub async fn current_user(&self) -> Result<User, ClientError> {
        match self.send::<User>(self.request(Method::GET, "/auth/me")).await {
            Ok(user) => {
                self.session.set_user(user.clone());
                Ok(user)
            }
            Err(e) => {
                if e.kind() == ErrorKind::Auth {
                    self.session.clear();
                }
                Err(e)
            }
        }
    }

    // ── Resources ──

    pub async fn list_resources(&self) -> Result<Vec<Resource>, ClientError> {
        self.send(self.request(Method::GET, "/resources")).await
    }

    pub async fn get_resource(&self, id: i64) -> Result<Resource, ClientError> {
        self.send(self.request(Method::GET, &format!("/resources/{id}")))
            .await
    }

    pub async fn create_resource(&self, resource: &NewResource) -> Result<Resource, ClientError> {
        self.send(self.request(Method::POST, "/resources").json(resource))
            .await
    }

    // ── Availability ──

    pub async fn create_slot(
        &self,
        resource_id: i64,
        slot: &NewSlot,
    ) -> Result<AvailabilitySlot, ClientError> {
        self.send(
            self.request(Method::POST, &format!("/resources/{resource_id}/availability"))
                .json(slot),
        )
        .await
    }

    pub async fn set_slot_status(
        &self,
        slot_id: i64,
        update: &SlotStatusUpdate,
    ) -> Result<AvailabilitySlot, ClientError> {
        self.send(
            self.request(Method::PUT, &format!("/availability/{slot_id}/status"))
                .json(update),
        )
        .await
    }

    // ── Bookings ──

    pub async fn provider_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        self.send(self.request(Method::GET, "/bookings/provider/me"))
            .await
    }

    pub async fn provider_earnings(&self) -> Result<EarningsSummary, ClientError> {
        self.send(self.request(Method::GET, "/provider/earnings"))
            .await
    }

    /// Every booking in the system. Admin sessions only.
    pub async fn admin_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        self.send(self.request(Method::GET, "/admin/bookings"))
            .await
    }

    // ── Reviews ──

    pub async fn resource_reviews(&self, resource_id: i64) -> Result<Vec<Review>, ClientError> {
        self.send(self.request(Method::GET, &format!("/resources/{resource_id}/reviews")))
            .await
    }

    pub async fn create_review(
        &self,
        resource_id: i64,
        review: &NewReview,
    ) -> Result<Review, ClientError> {
        self.send(
            self.request(Method::POST, &format!("/resources/{resource_id}/reviews"))
                .json(review),
        )
        .await
    }

    pub async fn update_review(
        &self,
        review_id: i64,
        review: &NewReview,
    ) -> Result<Review, ClientError> {
        self.send(self.request(Method::PUT, &format!("/reviews/{review_id}")).json(review))
            .await
    }

    pub async fn delete_review(&self, review_id: i64) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/reviews/{review_id}")))
            .await
    }
}

#[async_trait]
impl BookingApi for ApiClient {
    async fn list_slots(&self, resource_id: i64) -> Result<Vec<AvailabilitySlot>, ClientError> {
        self.send(self.request(Method::GET, &format!("/resources/{resource_id}/availability")))
            .await
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError> {
        let booking: Booking = self
            .send(self.request(Method::POST, "/bookings").json(request))
            .await?;
        tracing::info!(
            booking_id = booking.id,
            slot_id = booking.slot_id,
            amount = booking.final_amount,
            "booking created"
        );
        Ok(booking)
    }

    async fn cancel_booking(&self, booking_id: i64) -> Result<Booking, ClientError> {
        self.send(self.request(Method::PUT, &format!("/bookings/{booking_id}/cancel")))
            .await
    }

    async fn customer_bookings(&self, customer_id: i64) -> Result<Vec<Booking>, ClientError> {
        self.send(self.request(Method::GET, &format!("/bookings/customer/{customer_id}")))
            .await
    }
}

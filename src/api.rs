//! API client
//!
//! One method per backend endpoint. The bearer token is read from the session
//! store on every call, so a token written mid-session is used by the next
//! request. A 401 on an authenticated call clears the session and fires the
//! session-expired hook once for that call.

use std::cell::RefCell;
use std::rc::Rc;

use glycowatch_shared::protocol::{
    ApiRequest, CurrentUserRequest, HistoryRequest, LatestSensorRequest, SensorStatusRequest,
};
use glycowatch_shared::{
    AuthResponse, BEARER_PREFIX, CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE,
    LoginRequest, PredictRequest, PredictionHistoryRecord, PredictionResult, SensorReading,
    SensorStatus, SignupRequest, UserProfile,
};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, normalize_base_url};
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::request::{HttpClient, HttpRequest};
use crate::session::{KeyValueStore, SessionStore};

pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
pub const SIGNUP_FAILED: &str = "Signup failed. Please try again.";
pub const PREDICTION_FAILED: &str = "Prediction failed";
pub const SENSOR_UNAVAILABLE: &str = "Sensor data unavailable";
pub const HISTORY_UNAVAILABLE: &str = "Prediction history unavailable";
pub const PROFILE_UNAVAILABLE: &str = "Profile unavailable";

type SessionHook = Rc<dyn Fn()>;

pub struct GlycoApi<C, S> {
    base_url: String,
    client: C,
    session: Rc<SessionStore<S>>,
    on_session_expired: RefCell<Option<SessionHook>>,
}

impl<C, S> GlycoApi<C, S>
where
    C: HttpClient,
    S: KeyValueStore,
{
    pub fn new(base_url: &str, client: C, session: Rc<SessionStore<S>>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
            session,
            on_session_expired: RefCell::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig, client: C, session: Rc<SessionStore<S>>) -> Self {
        Self::new(&config.api_url, client, session)
    }

    /// Registers the callback run after a 401 has cleared the session.
    ///
    /// The frontend uses it to send the user back to the login page.
    pub fn on_session_expired(&self, hook: impl Fn() + 'static) {
        *self.on_session_expired.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn session(&self) -> &Rc<SessionStore<S>> {
        &self.session
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // --- Auth ---

    /// Logs in and stores the returned token and profile in the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AuthResponse> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .call(&req, ClientErrorKind::Auth, LOGIN_FAILED)
            .await?;
        self.store_session(&resp);
        info!(user = %resp.user.username, "logged in");
        Ok(resp)
    }

    /// Creates an account and stores the returned session.
    pub async fn signup(&self, req: &SignupRequest) -> ClientResult<AuthResponse> {
        let resp = self
            .call(req, ClientErrorKind::Validation, SIGNUP_FAILED)
            .await?;
        self.store_session(&resp);
        info!(user = %resp.user.username, "account created");
        Ok(resp)
    }

    pub async fn current_user(&self) -> ClientResult<UserProfile> {
        self.call(&CurrentUserRequest, ClientErrorKind::Upstream, PROFILE_UNAVAILABLE)
            .await
    }

    /// Clears the local session. The backend keeps no logout state.
    pub fn logout(&self) {
        self.session.clear();
        info!("logged out");
    }

    // --- Sensor ---

    pub async fn latest_sensor_reading(&self) -> ClientResult<SensorReading> {
        self.call(&LatestSensorRequest, ClientErrorKind::Upstream, SENSOR_UNAVAILABLE)
            .await
    }

    pub async fn sensor_status(&self) -> ClientResult<SensorStatus> {
        self.call(&SensorStatusRequest, ClientErrorKind::Upstream, SENSOR_UNAVAILABLE)
            .await
    }

    // --- Predictions ---

    pub async fn predict(&self, pregnancies: u32) -> ClientResult<PredictionResult> {
        self.call(
            &PredictRequest { pregnancies },
            ClientErrorKind::Prediction,
            PREDICTION_FAILED,
        )
        .await
    }

    pub async fn history(&self) -> ClientResult<Vec<PredictionHistoryRecord>> {
        self.call(&HistoryRequest, ClientErrorKind::Upstream, HISTORY_UNAVAILABLE)
            .await
    }

    // --- Internals ---

    fn store_session(&self, resp: &AuthResponse) {
        self.session.set_token(&resp.access_token);
        self.session.set_user(&resp.user);
    }

    fn expire_session(&self) {
        self.session.clear();
        info!("session rejected by server, cleared");
        let hook = self.on_session_expired.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Sends `req` to its endpoint and decodes the response.
    ///
    /// Every failure comes back as a `kind` error. Rejections carry the body's
    /// `detail` when present; transport and decode failures always carry
    /// `fallback` and keep the underlying error as the source.
    async fn call<R: ApiRequest>(
        &self,
        req: &R,
        kind: ClientErrorKind,
        fallback: &str,
    ) -> ClientResult<R::Response> {
        let mut http = HttpRequest::new(&self.url(R::PATH), R::METHOD)
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);

        if R::AUTHENTICATED {
            if let Some(token) = self.session.get_token() {
                let bearer = format!("{}{}", BEARER_PREFIX, token);
                http = http.with_header(HEADER_AUTHORIZATION, &bearer);
            }
        }

        if R::METHOD.has_body() {
            http = http.with_body(serde_json::to_string(req)?);
        }

        debug!(method = R::METHOD.as_str(), path = R::PATH, "sending request");

        let resp = self.client.send(http).await.map_err(|e| {
            debug!(path = R::PATH, error = %e, "no response");
            ClientError::new(kind, fallback).in_op(R::PATH).with_source(e)
        })?;

        if resp.status == 401 && R::AUTHENTICATED {
            self.expire_session();
            return Err(ClientError::session_expired().in_op(R::PATH));
        }

        if !resp.is_success() {
            debug!(path = R::PATH, status = resp.status, "request rejected");
            return Err(
                ClientError::from_response(kind, resp.status, &resp.body, fallback).in_op(R::PATH),
            );
        }

        resp.json::<R::Response>().map_err(|e| {
            warn!(path = R::PATH, error = %e, "response body did not decode");
            ClientError::new(kind, fallback)
                .with_status(resp.status)
                .in_op(R::PATH)
                .with_source(e)
        })
    }
}

#[cfg(test)]
mod tests;

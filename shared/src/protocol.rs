use crate::{
    AuthResponse, LoginRequest, PredictRequest, PredictionHistoryRecord, PredictionResult,
    SensorReading, SensorStatus, SignupRequest, UserProfile,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize + DeserializeOwned {
    /// The response type returned by this request.
    type Response: Serialize + DeserializeOwned;
    /// The URL path.
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Whether the call carries the bearer token. A 401 on such a call means
    /// the session is gone.
    const AUTHENTICATED: bool = true;
}

// =========================================================
// Auth
// =========================================================

impl ApiRequest for LoginRequest {
    type Response = AuthResponse;
    const PATH: &'static str = "/api/auth/login";
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTHENTICATED: bool = false;
}

impl ApiRequest for SignupRequest {
    type Response = AuthResponse;
    const PATH: &'static str = "/api/auth/signup";
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTHENTICATED: bool = false;
}

/// Fetch the profile of the logged-in user
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserRequest;

impl ApiRequest for CurrentUserRequest {
    type Response = UserProfile;
    const PATH: &'static str = "/api/auth/me";
    const METHOD: HttpMethod = HttpMethod::Get;
}

// =========================================================
// Sensor
// =========================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LatestSensorRequest;

impl ApiRequest for LatestSensorRequest {
    type Response = SensorReading;
    const PATH: &'static str = "/api/thingspeak/latest";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SensorStatusRequest;

impl ApiRequest for SensorStatusRequest {
    type Response = SensorStatus;
    const PATH: &'static str = "/api/thingspeak/status";
    const METHOD: HttpMethod = HttpMethod::Get;
}

// =========================================================
// Predictions
// =========================================================

impl ApiRequest for PredictRequest {
    type Response = PredictionResult;
    const PATH: &'static str = "/api/predict";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// List the user's prediction log, in server order
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryRequest;

impl ApiRequest for HistoryRequest {
    type Response = Vec<PredictionHistoryRecord>;
    const PATH: &'static str = "/api/predictions/history";
    const METHOD: HttpMethod = HttpMethod::Get;
}

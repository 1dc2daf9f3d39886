use serde::{Deserialize, Serialize};

pub mod date;
pub mod protocol;

pub use chrono;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Probability at or above which a record falls in the "high" bucket.
pub const HIGH_PROBABILITY_THRESHOLD: f64 = 0.7;
/// Probability at or above which a record falls in the "medium" bucket.
pub const MEDIUM_PROBABILITY_THRESHOLD: f64 = 0.3;

// =========================================================
// 用户 (Users)
// =========================================================

/// Profile cached alongside the session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Height in metres.
    pub height: f64,
    /// Weight in kilograms.
    pub weight: f64,
    pub age: u32,
}

impl User {
    /// Body mass index, or `None` when the height is not usable.
    pub fn bmi(&self) -> Option<f64> {
        if self.height > 0.0 && self.height.is_finite() {
            Some(self.weight / (self.height * self.height))
        } else {
            None
        }
    }
}

/// Full profile returned by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub pregnancies: u32,
    pub weight_kg: f64,
    pub height_m: f64,
    pub age: u32,
    pub bmi: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub pregnancies: u32,
    pub weight_kg: f64,
    pub height_m: f64,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// =========================================================
// 传感器 (Sensor)
// =========================================================

/// Latest snapshot from the sensor provider.
///
/// Any channel may be empty when the provider has not reported it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SensorReading {
    #[serde(default)]
    pub glucose: Option<f64>,
    #[serde(default)]
    pub blood_pressure: Option<f64>,
    #[serde(default)]
    pub skin_thickness: Option<f64>,
    #[serde(default)]
    pub insulin: Option<f64>,
    #[serde(default)]
    pub diabetes_pedigree_function: Option<f64>,
    #[serde(default, rename = "timestamp")]
    pub timestamp: Option<String>,
}

/// Per-field status map returned by `GET /api/thingspeak/status`.
pub type SensorStatus = serde_json::Map<String, serde_json::Value>;

// =========================================================
// 预测 (Predictions)
// =========================================================

/// Categorical risk band.
///
/// Unknown labels from the backend are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    LowModerate,
    Moderate,
    ModerateHigh,
    High,
    Other(String),
}

impl RiskLevel {
    /// The known levels, lowest first.
    pub const KNOWN: [RiskLevel; 5] = [
        RiskLevel::Low,
        RiskLevel::LowModerate,
        RiskLevel::Moderate,
        RiskLevel::ModerateHigh,
        RiskLevel::High,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::LowModerate => "Low-Moderate Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::ModerateHigh => "Moderate-High Risk",
            RiskLevel::High => "High Risk",
            RiskLevel::Other(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        match label {
            "Low Risk" => RiskLevel::Low,
            "Low-Moderate Risk" => RiskLevel::LowModerate,
            "Moderate Risk" => RiskLevel::Moderate,
            "Moderate-High Risk" => RiskLevel::ModerateHigh,
            "High Risk" => RiskLevel::High,
            other => RiskLevel::Other(other.to_string()),
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        match RiskLevel::parse(&label) {
            RiskLevel::Other(_) => RiskLevel::Other(label),
            known => known,
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight model inputs echoed back with every prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeaturesUsed {
    pub pregnancies: u32,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub prediction: u8,
    pub features_used: FeaturesUsed,
}

/// One entry of the server-side prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionHistoryRecord {
    pub id: String,
    pub timestamp: String,
    pub prediction: u8,
    pub probability: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub features_used: Option<FeaturesUsed>,
}

impl PredictionHistoryRecord {
    pub fn glucose(&self) -> Option<f64> {
        self.features_used.as_ref().map(|f| f.glucose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub pregnancies: u32,
}

/// Error body shape used by the backend (`{"detail": "..."}`).
///
/// `detail` is left untyped because validation failures carry a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The human-readable detail, when the backend sent a plain string.
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sensor_reading_uses_backend_field_names() {
        let reading: SensorReading = serde_json::from_value(json!({
            "Glucose": 148.0,
            "BloodPressure": 72.0,
            "SkinThickness": 35.0,
            "Insulin": null,
            "DiabetesPedigreeFunction": 0.627,
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(reading.glucose, Some(148.0));
        assert_eq!(reading.insulin, None);
        assert_eq!(reading.timestamp.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn unknown_risk_label_is_preserved() {
        let level: RiskLevel = serde_json::from_value(json!("Extreme Risk")).unwrap();
        assert_eq!(level, RiskLevel::Other("Extreme Risk".to_string()));
        assert_eq!(serde_json::to_value(&level).unwrap(), json!("Extreme Risk"));

        let known: RiskLevel = serde_json::from_value(json!("Moderate-High Risk")).unwrap();
        assert_eq!(known, RiskLevel::ModerateHigh);
    }

    #[test]
    fn features_used_reads_bmi_key() {
        let features: FeaturesUsed = serde_json::from_value(json!({
            "Pregnancies": 2,
            "Glucose": 120.0,
            "BloodPressure": 70.0,
            "SkinThickness": 20.0,
            "Insulin": 79.0,
            "BMI": 25.1,
            "DiabetesPedigreeFunction": 0.3,
            "Age": 30
        }))
        .unwrap();
        assert_eq!(features.pregnancies, 2);
        assert_eq!(features.bmi, 25.1);
    }

    #[test]
    fn bmi_needs_positive_height() {
        let mut user = User {
            id: "1".to_string(),
            username: "alice".to_string(),
            height: 2.0,
            weight: 80.0,
            age: 30,
        };
        assert_eq!(user.bmi(), Some(20.0));
        user.height = 0.0;
        assert_eq!(user.bmi(), None);
    }

    #[test]
    fn error_body_ignores_structured_detail() {
        let body: ErrorBody =
            serde_json::from_value(json!({"detail": [{"loc": ["body"], "msg": "bad"}]})).unwrap();
        assert_eq!(body.message(), None);

        let body: ErrorBody = serde_json::from_value(json!({"detail": "Username taken"})).unwrap();
        assert_eq!(body.message(), Some("Username taken"));
    }
}

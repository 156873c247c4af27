use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Body of the client-credentials token exchange.
#[derive(Deserialize, Clone, Debug)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Numeric on some error paths, string on others. Absent on success.
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

impl TokenResponse {
    pub fn is_success(&self) -> bool {
        match &self.code {
            None | Some(Value::Null) => true,
            Some(Value::Number(n)) => n.as_i64() == Some(0),
            Some(Value::String(s)) => s.is_empty() || s == "0" || s == "000000",
            Some(_) => false,
        }
    }

    pub fn code_text(&self) -> String {
        match &self.code {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Upper bound on how long a credential is trusted, whatever the vendor advertises.
pub fn max_lifetime() -> Duration {
    Duration::days(30)
}

/// A bearer token together with the instant it stops being handed out.
#[derive(Clone, Debug, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// `safety_fraction` of the advertised lifetime is used, the rest is margin.
    pub fn from_response(response: &TokenResponse, safety_fraction: f64, now: DateTime<Utc>) -> Self {
        let lifetime_ms = (response.expires_in.max(0) as f64 * 1000.0 * safety_fraction) as i64;
        let lifetime = Duration::try_milliseconds(lifetime_ms)
            .unwrap_or_else(max_lifetime)
            .clamp(Duration::zero(), max_lifetime());
        Self {
            access_token: response.access_token.clone(),
            expires_at: now.checked_add_signed(lifetime).unwrap_or(now),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

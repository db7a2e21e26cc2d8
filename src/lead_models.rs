use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tag applied to every lead coming from the application form.
pub const APPLY_TAG: &str = "apply";

/// Member status sent both as `status_if_new` and `status`.
pub const SUBSCRIBED: &str = "subscribed";

/// Lead-capture form submission.
///
/// Every field is optional and defaults to an empty string. Scalars of the
/// wrong JSON type are coerced to text the way the web form's JavaScript
/// would render them (`25000.0` becomes `"25000"`) and `null` reads as empty.
/// A falsy amount (`0`, `false`) is sent as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadSubmission {
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mobile: String,
    #[serde(deserialize_with = "lenient_string")]
    pub loan_type: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: String,
}

impl LeadSubmission {
    /// Parses a raw request body.
    ///
    /// Anything that is not a JSON object with readable fields yields an empty
    /// submission, which the forwarder then skips for lack of an email.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::debug!("Lead body has unreadable fields, using defaults: {}", e);
                Self::default()
            }),
            Ok(_) => {
                tracing::debug!("Lead body is not a JSON object, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::debug!("Lead body is not valid JSON, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }

    /// `apply`, plus the loan type when one was chosen.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags = vec![APPLY_TAG];
        if !self.loan_type.is_empty() {
            tags.push(&self.loan_type);
        }
        tags
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(false) => Ok(String::new()),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(String::new()),
        other => scalar_text(other).map_err(serde::de::Error::custom),
    }
}

fn scalar_text(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(number_text(&n)),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, found {}", other)),
    }
}

/// Integral floats lose their fraction (`25000.0` -> `25000`), as in JavaScript.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{:.0}", f)
            }
        }
        _ => n.to_string(),
    }
}

/// Audience merge fields, keyed by their Mailchimp merge tags.
#[derive(Debug, Serialize)]
pub struct MergeFields<'a> {
    #[serde(rename = "NAME")]
    pub name: &'a str,
    #[serde(rename = "PHONE")]
    pub phone: &'a str,
    #[serde(rename = "LOANTYPE")]
    pub loan_type: &'a str,
    #[serde(rename = "AMOUNT")]
    pub amount: &'a str,
}

/// Body of `PUT /lists/{audience}/members/{hash}`.
#[derive(Debug, Serialize)]
pub struct MemberUpsert<'a> {
    pub email_address: &'a str,
    pub status_if_new: &'static str,
    pub status: &'static str,
    pub merge_fields: MergeFields<'a>,
    pub tags: Vec<&'a str>,
}

impl<'a> From<&'a LeadSubmission> for MemberUpsert<'a> {
    fn from(lead: &'a LeadSubmission) -> Self {
        Self {
            email_address: &lead.email,
            status_if_new: SUBSCRIBED,
            status: SUBSCRIBED,
            merge_fields: MergeFields {
                name: &lead.name,
                phone: &lead.mobile,
                loan_type: &lead.loan_type,
                amount: &lead.amount,
            },
            tags: lead.tags(),
        }
    }
}

/// Body of the journey step trigger.
#[derive(Debug, Serialize)]
pub struct JourneyTrigger<'a> {
    pub email_address: &'a str,
}

/// What happened to a lead that did not end in an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadOutcome {
    /// No email was submitted; nothing was sent to Mailchimp.
    Skipped,
    /// The member was upserted. `journey_error` holds Mailchimp's reply when
    /// the follow-up trigger was refused.
    Forwarded {
        journey_triggered: bool,
        journey_error: Option<Value>,
    },
}

#[derive(Debug, Serialize)]
struct SkippedResponse {
    skipped: bool,
    reason: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForwardedResponse {
    ok: bool,
    upserted: bool,
    journey_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    journey_error: Option<Value>,
}

impl IntoResponse for LeadOutcome {
    fn into_response(self) -> Response {
        match self {
            LeadOutcome::Skipped => (
                StatusCode::OK,
                Json(SkippedResponse {
                    skipped: true,
                    reason: "no_email",
                }),
            )
                .into_response(),
            // A refused trigger still answers 200: the contact was captured.
            LeadOutcome::Forwarded {
                journey_triggered,
                journey_error,
            } => (
                StatusCode::OK,
                Json(ForwardedResponse {
                    ok: true,
                    upserted: true,
                    journey_triggered,
                    journey_error,
                }),
            )
                .into_response(),
        }
    }
}

use crate::config::{JourneyStep, MailchimpConfig};
use crate::errors::AppError;
use crate::lead_models::{JourneyTrigger, MemberUpsert};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Basic-auth user name; Mailchimp ignores it and only checks the key.
const AUTH_USER: &str = "any";

/// A reply from the Marketing API, successful or not.
///
/// Non-2xx statuses are not errors at this level: the forwarder decides
/// whether a refusal is fatal (upsert) or informational (journey trigger).
#[derive(Debug, Clone)]
pub struct MailchimpReply {
    pub status: StatusCode,
    /// Parsed JSON body, `Null` when Mailchimp sent no content.
    pub body: Value,
}

impl MailchimpReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Client for the Mailchimp Marketing API (v3).
///
/// Built per invocation from the shared `reqwest::Client` and that
/// invocation's settings.
#[derive(Clone)]
pub struct MailchimpClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    timeout: Option<Duration>,
}

impl MailchimpClient {
    /// Creates a new `MailchimpClient`.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (connection pool).
    /// * `config` - Validated settings for this invocation.
    pub fn new(client: reqwest::Client, config: &MailchimpConfig) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.api_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Unhandled(format!(
                "Mailchimp base URL cannot be a base: {}",
                config.api_base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    /// Creates or updates a list member.
    ///
    /// # Arguments
    ///
    /// * `audience_id` - The list (audience) to write to.
    /// * `subscriber_hash` - MD5 of the lowercased email, the member id.
    /// * `member` - Member payload.
    ///
    /// # Returns
    ///
    /// * `Result<MailchimpReply, AppError>` - The reply, or an error if Mailchimp
    ///   could not be reached or answered with something other than JSON.
    pub async fn upsert_member(
        &self,
        audience_id: &str,
        subscriber_hash: &str,
        member: &MemberUpsert<'_>,
    ) -> Result<MailchimpReply, AppError> {
        let url = self.endpoint(&["lists", audience_id, "members", subscriber_hash]);
        tracing::debug!("Upserting Mailchimp member: {}", url);

        self.send(Method::PUT, url, member).await
    }

    /// Triggers a Customer Journey step for a contact.
    ///
    /// # Arguments
    ///
    /// * `step` - Journey and step ids.
    /// * `email` - The contact's email address.
    pub async fn trigger_journey_step(
        &self,
        step: &JourneyStep,
        email: &str,
    ) -> Result<MailchimpReply, AppError> {
        let url = self.endpoint(&[
            "customer-journeys",
            "journeys",
            step.journey_id.as_str(),
            "steps",
            step.step_id.as_str(),
            "actions",
            "trigger",
        ]);
        tracing::debug!("Triggering Mailchimp journey step: {}", url);

        self.send(
            Method::POST,
            url,
            &JourneyTrigger {
                email_address: email,
            },
        )
        .await
    }

    /// Appends percent-encoded path segments to the API base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        payload: &T,
    ) -> Result<MailchimpReply, AppError> {
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(AUTH_USER, Some(&self.api_key))
            .json(payload);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            AppError::Unhandled(format!("Mailchimp request failed: {}", e))
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                AppError::Unhandled(format!(
                    "Failed to parse Mailchimp response ({}): {}",
                    status, e
                ))
            })?
        };

        Ok(MailchimpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> MailchimpConfig {
        MailchimpConfig {
            api_key: "key".to_string(),
            audience_id: "aud".to_string(),
            api_base_url: base.to_string(),
            journey: None,
            timeout: None,
        }
    }

    #[test]
    fn test_endpoint_keeps_api_version_prefix() {
        let client = MailchimpClient::new(
            reqwest::Client::new(),
            &config("https://us12.api.mailchimp.com/3.0"),
        )
        .unwrap();
        assert_eq!(
            client
                .endpoint(&["lists", "aud", "members", "abc"])
                .as_str(),
            "https://us12.api.mailchimp.com/3.0/lists/aud/members/abc"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_and_encodes_segments() {
        let client =
            MailchimpClient::new(reqwest::Client::new(), &config("http://127.0.0.1:9000/"))
                .unwrap();
        assert_eq!(
            client.endpoint(&["lists", "a b/c"]).as_str(),
            "http://127.0.0.1:9000/lists/a%20b%2Fc"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(MailchimpClient::new(reqwest::Client::new(), &config("not a url")).is_err());
        assert!(MailchimpClient::new(reqwest::Client::new(), &config("mailto:x@y.z")).is_err());
    }
}

use crate::errors::AppError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Process-level server settings, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Upper bound for inbound request bodies.
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| "65536".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a positive byte count"))
                .and_then(|limit: usize| {
                    if limit == 0 {
                        anyhow::bail!("MAX_BODY_BYTES cannot be zero");
                    }
                    Ok(limit)
                })?,
        };

        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Max body bytes: {}", config.max_body_bytes);

        Ok(config)
    }
}

/// Raw Mailchimp settings as found in the environment.
///
/// Nothing here is validated: a lead request calls [`MailchimpSettings::require`]
/// to turn these into a usable [`MailchimpConfig`], so a server started without
/// Mailchimp credentials still answers with a configuration error instead of
/// refusing to boot.
#[derive(Clone, Default, Deserialize)]
pub struct MailchimpSettings {
    pub api_key: Option<String>,
    /// Data-center prefix such as `us12`.
    pub server_prefix: Option<String>,
    pub audience_id: Option<String>,
    pub journey_id: Option<String>,
    pub step_id: Option<String>,
    /// Replaces `https://{server_prefix}.api.mailchimp.com/3.0` when set.
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl MailchimpSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: env_value("MAILCHIMP_API_KEY"),
            server_prefix: env_value("MAILCHIMP_SERVER_PREFIX"),
            audience_id: env_value("MAILCHIMP_AUDIENCE_ID"),
            journey_id: env_value("MAILCHIMP_JOURNEY_ID"),
            step_id: env_value("MAILCHIMP_STEP_ID"),
            api_base_url: env_value("MAILCHIMP_API_BASE_URL"),
            timeout_secs: env_value("MAILCHIMP_TIMEOUT_SECS").and_then(|secs| {
                secs.parse()
                    .map_err(|_| {
                        tracing::warn!("Ignoring MAILCHIMP_TIMEOUT_SECS={:?}: not a number", secs)
                    })
                    .ok()
            }),
        }
    }

    /// Validates the settings needed to reach Mailchimp.
    ///
    /// Blank values count as missing. The journey trigger is enabled only when
    /// both the journey and the step id are present.
    pub fn require(&self) -> Result<MailchimpConfig, AppError> {
        let api_key = present(&self.api_key);
        let server_prefix = present(&self.server_prefix);
        let audience_id = present(&self.audience_id);

        let (Some(api_key), Some(server_prefix), Some(audience_id)) =
            (api_key, server_prefix, audience_id)
        else {
            let missing = [
                ("MAILCHIMP_API_KEY", api_key.is_none()),
                ("MAILCHIMP_SERVER_PREFIX", server_prefix.is_none()),
                ("MAILCHIMP_AUDIENCE_ID", audience_id.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(AppError::MissingConfiguration(missing));
        };

        let journey = match (present(&self.journey_id), present(&self.step_id)) {
            (Some(journey_id), Some(step_id)) => Some(JourneyStep {
                journey_id: journey_id.to_string(),
                step_id: step_id.to_string(),
            }),
            _ => None,
        };

        let api_base_url = present(&self.api_base_url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://{}.api.mailchimp.com/3.0", server_prefix));

        Ok(MailchimpConfig {
            api_key: api_key.to_string(),
            audience_id: audience_id.to_string(),
            api_base_url,
            journey,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl fmt::Debug for MailchimpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailchimpSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("server_prefix", &self.server_prefix)
            .field("audience_id", &self.audience_id)
            .field("journey_id", &self.journey_id)
            .field("step_id", &self.step_id)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A journey step to trigger after a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyStep {
    pub journey_id: String,
    pub step_id: String,
}

/// Validated settings for a single lead invocation.
#[derive(Clone)]
pub struct MailchimpConfig {
    pub api_key: String,
    pub audience_id: String,
    pub api_base_url: String,
    pub journey: Option<JourneyStep>,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for MailchimpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailchimpConfig")
            .field("api_key", &"[REDACTED]")
            .field("audience_id", &self.audience_id)
            .field("api_base_url", &self.api_base_url)
            .field("journey", &self.journey)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Where handlers get their Mailchimp settings from.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Re-read the process environment on every request.
    Environment,
    /// Fixed settings, used by tests and embedders.
    Fixed(MailchimpSettings),
}

impl SettingsSource {
    pub fn load(&self) -> MailchimpSettings {
        match self {
            SettingsSource::Environment => MailchimpSettings::from_env(),
            SettingsSource::Fixed(settings) => settings.clone(),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> MailchimpSettings {
        MailchimpSettings {
            api_key: Some("key-us12".to_string()),
            server_prefix: Some("us12".to_string()),
            audience_id: Some("aud123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_require_builds_default_base_url() {
        let config = complete().require().unwrap();
        assert_eq!(config.api_base_url, "https://us12.api.mailchimp.com/3.0");
        assert_eq!(config.audience_id, "aud123");
        assert!(config.journey.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_require_reports_every_missing_value() {
        let err = MailchimpSettings::default().require().unwrap_err();
        match err {
            AppError::MissingConfiguration(missing) => assert_eq!(
                missing,
                vec![
                    "MAILCHIMP_API_KEY",
                    "MAILCHIMP_SERVER_PREFIX",
                    "MAILCHIMP_AUDIENCE_ID"
                ]
            ),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let settings = MailchimpSettings {
            audience_id: Some("   ".to_string()),
            ..complete()
        };
        assert!(matches!(
            settings.require(),
            Err(AppError::MissingConfiguration(ref m)) if m == &vec!["MAILCHIMP_AUDIENCE_ID"]
        ));
    }

    #[test]
    fn test_journey_needs_both_ids() {
        let only_journey = MailchimpSettings {
            journey_id: Some("j-1".to_string()),
            ..complete()
        };
        assert!(only_journey.require().unwrap().journey.is_none());

        let both = MailchimpSettings {
            journey_id: Some("j-1".to_string()),
            step_id: Some("s-1".to_string()),
            ..complete()
        };
        assert_eq!(
            both.require().unwrap().journey,
            Some(JourneyStep {
                journey_id: "j-1".to_string(),
                step_id: "s-1".to_string(),
            })
        );
    }

    #[test]
    fn test_base_url_override_and_timeout() {
        let settings = MailchimpSettings {
            api_base_url: Some("http://127.0.0.1:9000".to_string()),
            timeout_secs: Some(5),
            ..complete()
        };
        let config = settings.require().unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?} {:?}", complete(), complete().require().unwrap());
        assert!(!rendered.contains("key-us12"));
        assert!(rendered.contains("[REDACTED]"));
    }
}

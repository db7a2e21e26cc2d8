use lead_forwarder::config::{Config, MailchimpSettings, SettingsSource};
use lead_forwarder::handlers::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads the server configuration, builds the shared
/// HTTP client and serves the lead routes. Mailchimp settings are read per
/// request, so missing credentials only produce a startup warning.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_forwarder=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    match MailchimpSettings::from_env().require() {
        Ok(mailchimp) => {
            tracing::info!("✓ Mailchimp configured: {}", mailchimp.api_base_url);
            if mailchimp.journey.is_none() {
                tracing::info!("No journey step configured, leads will only be upserted");
            }
        }
        Err(e) => tracing::warn!("Lead requests will fail until configured: {}", e),
    }

    // No client-wide timeout: MAILCHIMP_TIMEOUT_SECS applies one per request when set
    let http = reqwest::Client::builder().build()?;

    let app_state = Arc::new(AppState {
        http,
        settings: SettingsSource::Environment,
    });

    let app = handlers::app(app_state, config.max_body_bytes);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Lead forwarding workflow
//!
//! Straight-line sequence run once per submission:
//! 1. Skip submissions without an email (not an error)
//! 2. Validate Mailchimp settings
//! 3. Compute the subscriber hash
//! 4. Upsert the list member (fatal on refusal)
//! 5. Trigger the configured journey step (non-fatal on refusal)
use crate::config::MailchimpSettings;
use crate::errors::AppError;
use crate::lead_models::{LeadOutcome, LeadSubmission, MemberUpsert};
use crate::mailchimp_client::MailchimpClient;
use crate::subscriber_hash::subscriber_hash;

/// Forwards one lead submission to Mailchimp.
///
/// # Arguments
///
/// * `http` - Shared HTTP client.
/// * `settings` - Mailchimp settings read for this invocation.
/// * `lead` - The parsed submission.
///
/// # Returns
///
/// * `Result<LeadOutcome, AppError>` - `Skipped` or `Forwarded`, or the error to
///   report (missing configuration, refused upsert, unexpected failure).
pub async fn forward_lead(
    http: &reqwest::Client,
    settings: &MailchimpSettings,
    lead: &LeadSubmission,
) -> Result<LeadOutcome, AppError> {
    if !lead.has_email() {
        tracing::warn!("Lead submission without email, skipping");
        return Ok(LeadOutcome::Skipped);
    }

    let config = settings.require()?;
    let client = MailchimpClient::new(http.clone(), &config)?;

    let hash = subscriber_hash(&lead.email);
    tracing::info!(
        "Forwarding lead to Mailchimp: audience={}, member={}",
        config.audience_id,
        hash
    );

    let upsert = client
        .upsert_member(&config.audience_id, &hash, &MemberUpsert::from(lead))
        .await?;
    if !upsert.is_success() {
        tracing::error!(
            "Mailchimp upsert failed for member {}: {} {}",
            hash,
            upsert.status,
            upsert.body
        );
        return Err(AppError::UpsertRejected {
            status: upsert.status,
            details: upsert.body,
        });
    }
    tracing::info!("✓ Mailchimp member {} upserted", hash);

    let Some(step) = config.journey.as_ref() else {
        return Ok(LeadOutcome::Forwarded {
            journey_triggered: false,
            journey_error: None,
        });
    };

    let trigger = client.trigger_journey_step(step, &lead.email).await?;
    if !trigger.is_success() {
        // The contact is already captured; report the refusal alongside it.
        tracing::warn!(
            "Journey {} step {} refused member {}: {} {}",
            step.journey_id,
            step.step_id,
            hash,
            trigger.status,
            trigger.body
        );
        return Ok(LeadOutcome::Forwarded {
            journey_triggered: false,
            journey_error: Some(trigger.body),
        });
    }

    tracing::info!(
        "✓ Journey {} step {} triggered for member {}",
        step.journey_id,
        step.step_id,
        hash
    );
    Ok(LeadOutcome::Forwarded {
        journey_triggered: true,
        journey_error: None,
    })
}

//! Lead Forwarder Library
//!
//! Receives lead-capture form submissions and forwards them to Mailchimp:
//! the contact is upserted into an audience and, when configured, a Customer
//! Journey step is triggered for it.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Forwarding workflow, models and errors.
//! - `integrations`: External service clients.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `forwarder`: Lead forwarding workflow.
//! - `handlers`: HTTP request handlers and routes.
//! - `lead_models`: Submission, payload and outcome models.
//! - `mailchimp_client`: Mailchimp Marketing API client.
//! - `subscriber_hash`: Member id derivation.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and the binary
pub mod config;
pub mod errors;
pub mod forwarder;
pub mod handlers;
pub mod lead_models;
pub mod mailchimp_client;
pub mod subscriber_hash;

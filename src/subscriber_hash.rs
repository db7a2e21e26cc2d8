//! Mailchimp addresses list members by the MD5 digest of the lowercased email.
//!
//! Using that digest as the member id makes the upsert idempotent: resubmitting
//! the same address in any casing, with stray whitespace, lands on the same
//! remote record.

/// Trims surrounding whitespace and lowercases the address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Computes the subscriber hash (32 lowercase hex chars) for an email address.
pub fn subscriber_hash(email: &str) -> String {
    let digest = md5::compute(normalize_email(email).as_bytes());
    hex::encode(digest.0)
}

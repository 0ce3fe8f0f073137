//! ID generation for issues.
//!
//! Issue IDs are 24 lowercase hex characters (document-store object id
//! shape), taken from a SHA-256 over the issue's identifying fields plus a
//! nonce. Collisions are re-rolled with a new nonce.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Length of an issue ID in hex characters.
pub const ID_LENGTH: usize = 24;

/// Number of nonces tried before giving up on a seed.
const MAX_NONCE: u32 = 1000;

/// ID generator that produces unique issue IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Generate a candidate ID for one nonce.
    #[must_use]
    pub fn generate_candidate(
        project: &str,
        title: &str,
        creator: &str,
        created_on: DateTime<Utc>,
        nonce: u32,
    ) -> String {
        let seed = generate_id_seed(project, title, creator, created_on, nonce);
        compute_id_hash(&seed)
    }

    /// Generate an ID, checking for collisions with the provided checker.
    ///
    /// The checker returns `Ok(true)` if the ID is already taken.
    ///
    /// # Errors
    ///
    /// Propagates checker errors, and fails if every nonce collided.
    pub fn generate<F, E>(
        project: &str,
        title: &str,
        creator: &str,
        created_on: DateTime<Utc>,
        mut exists: F,
    ) -> Result<String, E>
    where
        F: FnMut(&str) -> Result<bool, E>,
        E: From<anyhow::Error>,
    {
        for nonce in 0..MAX_NONCE {
            let id = Self::generate_candidate(project, title, creator, created_on, nonce);
            if !exists(&id)? {
                return Ok(id);
            }
        }
        Err(anyhow::anyhow!("could not allocate a free issue ID after {MAX_NONCE} attempts").into())
    }
}

/// Generate the seed string for ID generation.
///
/// Inputs: `project | title | creator | created_on (ns) | nonce`
#[must_use]
pub fn generate_id_seed(
    project: &str,
    title: &str,
    creator: &str,
    created_on: DateTime<Utc>,
    nonce: u32,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        project,
        title,
        creator,
        created_on.timestamp_nanos_opt().unwrap_or(0),
        nonce
    )
}

/// Hash the seed and keep the first `ID_LENGTH` hex characters.
#[must_use]
pub fn compute_id_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(ID_LENGTH);
    for byte in digest.iter().take(ID_LENGTH / 2) {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Check that a string has the shape of an issue ID.
///
/// Uppercase hex is accepted; callers normalize with [`normalize_id`].
#[must_use]
pub fn is_valid_id_format(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalize an ID to its stored (lowercase) form.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

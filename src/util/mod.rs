//! Shared utilities for `issue_tracker`.
//!
//! - ID generation and shape checks
//! - Timestamp formatting and parsing (RFC 3339, millisecond precision)

pub mod id;
pub mod time;

pub use id::{IdGenerator, is_valid_id_format, normalize_id};
pub use time::{format_timestamp, parse_timestamp};

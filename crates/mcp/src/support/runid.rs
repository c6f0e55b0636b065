#![forbid(unsafe_code)]

use super::time::{compact_date, now_utc};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Run identifier: `<prefix>_YYYYMMDD_<8-hex>`. The suffix hashes the
/// nanosecond timestamp so calls within the same second stay distinct.
pub(crate) fn generate_run_id(prefix: &str) -> String {
    let now = now_utc();
    let stamp = now.unix_timestamp_nanos().to_string();
    let digest = Sha256::digest(stamp.as_bytes());
    let mut suffix = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        let _ = write!(suffix, "{byte:02x}");
    }
    format!("{prefix}_{}_{suffix}", compact_date(now))
}

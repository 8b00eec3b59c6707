//! Severity-based classification of `sqlcmd` output.
//!
//! `sqlcmd` exits 0 even when a statement fails, so the only signal is the
//! `Msg ..., Level N, ...` header it prints. Only a header at the very start
//! of the output is recognised: multiple errors or localized messages can
//! slip through as success.

use std::sync::LazyLock;

use regex::Regex;

use crate::provision::error::{ProvisionError, Result};

/// Highest severity that is informational rather than an error.
pub const MAX_INFORMATIONAL_SEVERITY: u32 = 10;

static SQL_ERROR_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Msg \d+, Level (\d+), State \d+, Server [^,]+, Line \d+")
        .expect("sqlcmd error header pattern is valid")
});

/// Decide whether `output` reports a failed statement.
pub fn classify(output: &str) -> Result<()> {
    let Some(captures) = SQL_ERROR_HEADER.captures(output) else {
        return Ok(());
    };

    let level: u32 = captures[1]
        .parse()
        .map_err(|e| ProvisionError::MalformedOutput {
            reason: format!("cannot parse severity '{}': {e}", &captures[1]),
        })?;

    if level > MAX_INFORMATIONAL_SEVERITY {
        return Err(ProvisionError::Sql {
            level,
            output: output.to_string(),
        });
    }

    tracing::debug!(level, "Ignoring informational sqlcmd message");
    Ok(())
}

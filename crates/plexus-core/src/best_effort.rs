// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attempt, capture, log.
//!
//! Secondary paths (notification creation, mention bookkeeping, real-time
//! push) must never fail the operation that triggered them. Their results
//! are passed through [`BestEffort::best_effort`], which logs the error
//! branch and hands back an `Option`.

use tracing::warn;

use crate::error::PlexusError;

/// Extension for results produced by secondary, best-effort work.
pub trait BestEffort<T> {
    /// Log the error branch at `warn` under `context` and discard it.
    fn best_effort(self, context: &str) -> Option<T>;
}

impl<T> BestEffort<T> for Result<T, PlexusError> {
    fn best_effort(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, context, "best-effort operation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn ok_passes_through() {
        let r: Result<u32, PlexusError> = Ok(7);
        assert_eq!(r.best_effort("test"), Some(7));
    }

    #[traced_test]
    #[test]
    fn err_is_logged_and_discarded() {
        let r: Result<u32, PlexusError> = Err(PlexusError::TransientDelivery {
            message: "socket closed".into(),
        });
        assert_eq!(r.best_effort("push notification"), None);
        assert!(logs_contain("best-effort operation failed"));
        assert!(logs_contain("socket closed"));
    }
}

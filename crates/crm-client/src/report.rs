use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Where caches send remote failures.
///
/// Authentication failures flip the login-required signal that the embedding
/// UI watches; every other failure is only logged and the caller keeps its
/// previous state.
///
/// [`clear`](Self::clear) starts a new epoch. Failures of requests issued in
/// an earlier epoch are logged but no longer touch the signal.
#[derive(Clone)]
pub struct FailureReporter {
    login_required: Arc<watch::Sender<bool>>,
    epoch: Arc<AtomicU64>,
}

impl FailureReporter {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            login_required: Arc::new(sender),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current epoch, to pass to [`report_from`](Self::report_from) once the
    /// request completes.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Report the failure of a request issued in `epoch`.
    pub fn report_from(&self, epoch: u64, operation: &str, err: &ClientError) {
        if epoch != self.epoch() {
            debug!(operation, error = %err, "ignoring failure of a request issued before clear");
            return;
        }
        self.report(operation, err);
    }

    pub fn report(&self, operation: &str, err: &ClientError) {
        if err.is_auth() {
            warn!(operation, error = %err, "authentication failed, login required");
            self.login_required.send_replace(true);
        } else {
            warn!(operation, error = %err, "remote call failed");
        }
    }

    pub fn login_required(&self) -> bool {
        *self.login_required.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.login_required.subscribe()
    }

    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.login_required.send_replace(false);
    }
}

impl Default for FailureReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn only_auth_failures_require_login() {
        let reporter = FailureReporter::new();
        let rx = reporter.subscribe();

        reporter.report("get_views", &ClientError::Transport("connection refused".into()));
        assert!(!reporter.login_required());

        reporter.report(
            "get_views",
            &ClientError::Server {
                status: StatusCode::UNAUTHORIZED,
                exc_type: None,
                message: "Not logged in".into(),
            },
        );
        assert!(reporter.login_required());
        assert!(*rx.borrow());

        reporter.clear();
        assert!(!reporter.login_required());
    }

    #[test]
    fn failures_from_before_clear_are_ignored() {
        let reporter = FailureReporter::new();
        let auth = ClientError::Server {
            status: StatusCode::UNAUTHORIZED,
            exc_type: Some("AuthenticationError".into()),
            message: "Not logged in".into(),
        };

        let issued = reporter.epoch();
        reporter.clear();
        reporter.report_from(issued, "get_users", &auth);
        assert!(!reporter.login_required());

        reporter.report_from(reporter.epoch(), "get_users", &auth);
        assert!(reporter.login_required());
    }
}

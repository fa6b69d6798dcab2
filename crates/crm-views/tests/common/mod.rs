use std::sync::Arc;
use std::time::Duration;

use crm_backend_fake::FakeBackend;
use crm_client::{FailureReporter, ViewDescriptor};
use crm_views::ViewRegistry;

pub fn registry(
    backend: FakeBackend,
    doctype: Option<&str>,
) -> (Arc<ViewRegistry<FakeBackend>>, Arc<FakeBackend>) {
    let backend = Arc::new(backend);
    let registry = ViewRegistry::new(Arc::clone(&backend), FailureReporter::new(), doctype);
    (Arc::new(registry), backend)
}

pub fn names(views: &[Arc<ViewDescriptor>]) -> Vec<&str> {
    views.iter().map(|v| v.name.as_str()).collect()
}

/// Poll until `done` holds, for at most a second.
pub async fn eventually(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    done()
}

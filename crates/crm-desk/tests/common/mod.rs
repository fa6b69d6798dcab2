use std::sync::Arc;
use std::time::Duration;

use crm_backend_fake::FakeBackend;
use crm_desk::{DeskConfig, Session};
use crm_views::MemoryStorage;

pub fn config(user: &str) -> DeskConfig {
    DeskConfig {
        user: user.to_string(),
        ephemeral_storage: true,
        ..DeskConfig::default()
    }
}

pub fn session(
    backend: FakeBackend,
    user: &str,
) -> (Session<FakeBackend>, Arc<FakeBackend>, Arc<MemoryStorage>) {
    let backend = Arc::new(backend);
    let storage = Arc::new(MemoryStorage::new());
    let session = Session::new(config(user), Arc::clone(&backend), storage.clone());
    (session, backend, storage)
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

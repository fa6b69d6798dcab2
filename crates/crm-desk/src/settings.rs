use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crm_client::{Backend, Doc, FailureReporter, api};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

/// Singleton holding site-wide CRM settings; its name is its doctype.
pub const SETTINGS_DOCTYPE: &str = "FCRM Settings";

/// Site branding shown in page titles and the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Brand {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
}

impl Brand {
    /// Take each brand field from `settings`. Empty or missing fields keep
    /// the current value.
    pub fn update(&mut self, settings: &Doc) {
        let field = |key: &str| {
            settings
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let Some(name) = field("brand_name") {
            self.name = Some(name);
        }
        if let Some(logo) = field("brand_logo") {
            self.logo = Some(logo);
        }
        if let Some(favicon) = field("favicon") {
            self.favicon = Some(favicon);
        }
    }
}

/// The `FCRM Settings` document and the brand derived from it.
pub struct SiteSettings<B: Backend> {
    backend: Arc<B>,
    reporter: FailureReporter,
    doc: RwLock<Option<Arc<Doc>>>,
    brand: RwLock<Brand>,
    fetch_lock: AsyncMutex<()>,
    generation: AtomicU64,
}

impl<B: Backend> SiteSettings<B> {
    pub fn new(backend: Arc<B>, reporter: FailureReporter) -> Self {
        Self {
            backend,
            reporter,
            doc: RwLock::new(None),
            brand: RwLock::new(Brand::default()),
            fetch_lock: AsyncMutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Cached settings document, `None` until loaded.
    pub fn settings(&self) -> Option<Arc<Doc>> {
        self.doc.read().clone()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.doc.read().as_ref()?.get(field).cloned()
    }

    pub fn brand(&self) -> Brand {
        self.brand.read().clone()
    }

    /// Cached settings, fetching them on first use.
    pub async fn ensure(&self) -> Option<Arc<Doc>> {
        if let Some(doc) = self.settings() {
            return Some(doc);
        }
        let _guard = self.fetch_lock.lock().await;
        if let Some(doc) = self.settings() {
            return Some(doc);
        }
        self.fetch().await;
        self.settings()
    }

    /// Refetch the settings. On failure the previous ones stay.
    pub async fn reload(&self) -> bool {
        let _guard = self.fetch_lock.lock().await;
        self.fetch().await
    }

    async fn fetch(&self) -> bool {
        let generation = self.generation.load(Ordering::SeqCst);
        let epoch = self.reporter.epoch();
        let result = api::get_doc(&*self.backend, SETTINGS_DOCTYPE, SETTINGS_DOCTYPE).await;

        if generation != self.generation.load(Ordering::SeqCst) {
            debug!("dropping settings fetched before reset");
            return false;
        }

        match result {
            Ok(doc) => {
                let brand = {
                    let mut brand = self.brand.write();
                    brand.update(&doc);
                    brand.clone()
                };
                info!(brand = ?brand.name, "site settings loaded");
                *self.doc.write() = Some(Arc::new(doc));
                true
            }
            Err(e) => {
                self.reporter.report_from(epoch, "get settings", &e);
                false
            }
        }
    }

    /// Forget the settings and brand. A fetch still in flight is discarded.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.doc.write() = None;
        *self.brand.write() = Brand::default();
    }
}

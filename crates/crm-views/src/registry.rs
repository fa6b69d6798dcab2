use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwap;
use crm_client::{Backend, FailureReporter, ViewDescriptor, ViewType, api};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::index::ViewIndex;

/// Saved views for one doctype, or for every doctype.
///
/// Readers see the last complete [`ViewIndex`]; a reload swaps in a new one
/// in one step.
pub struct ViewRegistry<B: Backend> {
    backend: Arc<B>,
    reporter: FailureReporter,
    doctype: Option<String>,
    index: ArcSwap<ViewIndex>,
    loading: AtomicBool,
    reload_lock: AsyncMutex<()>,
    generation: AtomicU64,
}

impl<B: Backend> ViewRegistry<B> {
    pub fn new(backend: Arc<B>, reporter: FailureReporter, doctype: Option<&str>) -> Self {
        Self {
            backend,
            reporter,
            doctype: doctype.filter(|d| !d.is_empty()).map(str::to_string),
            index: ArcSwap::from_pointee(ViewIndex::default()),
            loading: AtomicBool::new(false),
            reload_lock: AsyncMutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn snapshot(&self) -> Arc<ViewIndex> {
        self.index.load_full()
    }

    pub fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn pinned(&self) -> Vec<Arc<ViewDescriptor>> {
        self.index.load().pinned().to_vec()
    }

    pub fn public(&self) -> Vec<Arc<ViewDescriptor>> {
        self.index.load().public().to_vec()
    }

    pub fn grouped(&self) -> Vec<Arc<ViewDescriptor>> {
        self.index.load().grouped().to_vec()
    }

    /// See [`ViewIndex::lookup`].
    pub fn view(
        &self,
        name: Option<&str>,
        view_type: &ViewType,
        doctype: Option<&str>,
    ) -> Option<Arc<ViewDescriptor>> {
        self.index.load().lookup(name, view_type, doctype).cloned()
    }

    pub fn default_view(&self, doctype: &str, view_type: &ViewType) -> Option<Arc<ViewDescriptor>> {
        self.index.load().default_view(doctype, view_type).cloned()
    }

    pub fn default_views(&self) -> HashMap<String, Arc<ViewDescriptor>> {
        self.index.load().default_views().clone()
    }

    pub fn standard_views(&self) -> HashMap<String, Arc<ViewDescriptor>> {
        self.index.load().standard_views().clone()
    }

    /// Start a reload on the ambient runtime without waiting for it.
    pub fn spawn_reload(self: &Arc<Self>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(doctype = ?self.doctype, "no runtime, views load on the next explicit reload");
            return;
        };
        self.loading.store(true, Ordering::SeqCst);
        let registry = Arc::clone(self);
        runtime.spawn(async move {
            registry.reload().await;
        });
    }

    /// Refetch the whole collection and publish a new index. Reloads run one
    /// at a time. Returns whether a new index was published; on failure the
    /// previous one stays.
    pub async fn reload(&self) -> bool {
        let _guard = self.reload_lock.lock().await;
        let generation = self.generation.load(Ordering::SeqCst);
        let epoch = self.reporter.epoch();

        self.loading.store(true, Ordering::SeqCst);
        let result = api::get_views(&*self.backend, self.doctype.as_deref()).await;
        self.loading.store(false, Ordering::SeqCst);

        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(doctype = ?self.doctype, "dropping views fetched before reset");
            return false;
        }

        match result {
            Ok(records) => {
                let index = ViewIndex::build(records);
                info!(
                    doctype = ?self.doctype,
                    views = index.len(),
                    pinned = index.pinned().len(),
                    public = index.public().len(),
                    "views loaded"
                );
                self.index.store(Arc::new(index));
                true
            }
            Err(e) => {
                self.reporter.report_from(epoch, "get_views", &e);
                false
            }
        }
    }

    /// Drop every view. A reload still in flight is discarded.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.index.store(Arc::new(ViewIndex::default()));
        self.loading.store(false, Ordering::SeqCst);
    }
}

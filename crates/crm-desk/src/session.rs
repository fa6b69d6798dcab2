use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crm_client::{Backend, FailureReporter, HttpBackend, ViewType};
use crm_meta::{MetaCache, MetaHandle};
use crm_views::{DefaultViewCache, LocalStorage, ResolvedView, ViewRegistry};
use parking_lot::RwLock;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info};

use crate::config::DeskConfig;
use crate::error::DeskError;
use crate::flags::IntegrationFlags;
use crate::settings::SiteSettings;
use crate::users::UserDirectory;

/// Every cache of one logged-in desk, built from one config and one backend.
pub struct Session<B: Backend> {
    config: DeskConfig,
    backend: Arc<B>,
    reporter: FailureReporter,
    meta: Arc<MetaCache<B>>,
    views: RwLock<HashMap<String, Arc<ViewRegistry<B>>>>,
    default_views: DefaultViewCache<B>,
    users: UserDirectory<B>,
    settings: SiteSettings<B>,
    flags: RwLock<Option<IntegrationFlags>>,
    flags_lock: AsyncMutex<()>,
    generation: AtomicU64,
}

impl Session<HttpBackend> {
    /// Session against the site named in `config`.
    pub fn connect(config: DeskConfig) -> Self {
        let backend = Arc::new(HttpBackend::new(&config.backend_config()));
        let storage = config.open_storage();
        Self::new(config, backend, storage)
    }
}

impl<B: Backend> Session<B> {
    pub fn new(config: DeskConfig, backend: Arc<B>, storage: Arc<dyn LocalStorage>) -> Self {
        let reporter = FailureReporter::new();
        let meta = Arc::new(MetaCache::new(
            Arc::clone(&backend),
            reporter.clone(),
            config.display_defaults(),
        ));
        let default_views = DefaultViewCache::new(Arc::clone(&backend), storage, reporter.clone());
        let users = UserDirectory::new(Arc::clone(&backend), reporter.clone(), config.user.clone());
        let settings = SiteSettings::new(Arc::clone(&backend), reporter.clone());

        Self {
            config,
            backend,
            reporter,
            meta,
            views: RwLock::new(HashMap::new()),
            default_views,
            users,
            settings,
            flags: RwLock::new(None),
            flags_lock: AsyncMutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// See [`MetaCache::meta`].
    pub fn meta(&self, doctype: &str) -> MetaHandle<B> {
        self.meta.meta(doctype)
    }

    pub fn meta_cache(&self) -> &Arc<MetaCache<B>> {
        &self.meta
    }

    /// Registry for `doctype`'s views, or for every doctype. The first
    /// access for a key starts loading it in the background.
    pub fn views(&self, doctype: Option<&str>) -> Arc<ViewRegistry<B>> {
        let key = doctype.unwrap_or_default();
        if let Some(registry) = self.views.read().get(key) {
            return Arc::clone(registry);
        }

        let registry = {
            let mut views = self.views.write();
            if let Some(registry) = views.get(key) {
                return Arc::clone(registry);
            }
            let registry = Arc::new(ViewRegistry::new(
                Arc::clone(&self.backend),
                self.reporter.clone(),
                doctype,
            ));
            views.insert(key.to_string(), Arc::clone(&registry));
            registry
        };
        registry.spawn_reload();
        registry
    }

    /// Resolve a view reference against `doctype`'s registry.
    pub fn resolve_view(
        &self,
        doctype: &str,
        name: Option<&str>,
        view_type: Option<&ViewType>,
    ) -> ResolvedView {
        crm_views::resolve_view(&*self.views(Some(doctype)), name, view_type, Some(doctype))
    }

    pub fn default_views(&self) -> &DefaultViewCache<B> {
        &self.default_views
    }

    pub fn users(&self) -> &UserDirectory<B> {
        &self.users
    }

    pub fn settings(&self) -> &SiteSettings<B> {
        &self.settings
    }

    /// Integration flags, fetched on first use.
    pub async fn flags(&self) -> IntegrationFlags {
        if let Some(flags) = self.flags.read().clone() {
            return flags;
        }

        let _guard = self.flags_lock.lock().await;
        if let Some(flags) = self.flags.read().clone() {
            return flags;
        }
        let generation = self.generation.load(Ordering::SeqCst);
        let flags = IntegrationFlags::fetch(&*self.backend, &self.reporter).await;
        if generation == self.generation.load(Ordering::SeqCst) {
            *self.flags.write() = Some(flags.clone());
        } else {
            debug!("not caching integration flags fetched before reset");
        }
        flags
    }

    /// Flips to `true` when the server rejects the session's credentials.
    pub fn login_required(&self) -> watch::Receiver<bool> {
        self.reporter.subscribe()
    }

    pub fn is_login_required(&self) -> bool {
        self.reporter.login_required()
    }

    /// Forget everything cached for this user, including the default views
    /// kept in local storage. Fetches still in flight are discarded.
    pub fn reset(&self) -> Result<(), DeskError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.meta.reset();
        for registry in self.views.write().drain().map(|(_, r)| r) {
            registry.reset();
        }
        self.users.reset();
        self.settings.reset();
        *self.flags.write() = None;
        self.default_views.reset()?;
        self.reporter.clear();
        info!("session reset");
        Ok(())
    }
}

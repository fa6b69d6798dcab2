use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crm_client::{
    Backend, ClientError, Doc, DocTypeMeta, DocTypeResponse, FailureReporter, FieldDescriptor, api,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::depends_on::evaluate_depends_on;
use crate::display::{self, DisplayDefaults};
use crate::field::{NormalizedField, normalize};
use crate::settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The merged settings differed and the server accepted them.
    Saved,
    /// Nothing changed, no request was made.
    Unchanged,
}

/// Session-wide schema and user-settings cache.
///
/// Each doctype is fetched at most once at a time. Responses that arrive
/// after [`MetaCache::reset`] are discarded.
pub struct MetaCache<B: Backend> {
    backend: Arc<B>,
    reporter: FailureReporter,
    defaults: DisplayDefaults,
    doctypes: RwLock<HashMap<String, Arc<DocTypeMeta>>>,
    user_settings: RwLock<HashMap<String, Arc<Map<String, Value>>>>,
    loading: Mutex<HashSet<String>>,
    fetch_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    generation: AtomicU64,
}

impl<B: Backend> MetaCache<B> {
    pub fn new(backend: Arc<B>, reporter: FailureReporter, defaults: DisplayDefaults) -> Self {
        Self {
            backend,
            reporter,
            defaults,
            doctypes: RwLock::new(HashMap::new()),
            user_settings: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashSet::new()),
            fetch_locks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn defaults(&self) -> &DisplayDefaults {
        &self.defaults
    }

    /// Handle for `doctype`, starting a background fetch when the schema is
    /// neither cached nor already loading. Never blocks.
    pub fn meta(self: &Arc<Self>, doctype: &str) -> MetaHandle<B> {
        if !self.is_cached(doctype) && !self.is_loading(doctype) {
            self.spawn_load(doctype);
        }
        MetaHandle {
            cache: Arc::clone(self),
            doctype: doctype.to_string(),
        }
    }

    fn spawn_load(self: &Arc<Self>, doctype: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(doctype, "no runtime, schema loads on the next explicit load");
            return;
        };
        self.loading.lock().insert(doctype.to_string());
        let cache = Arc::clone(self);
        let doctype = doctype.to_string();
        runtime.spawn(async move {
            cache.load(&doctype).await;
        });
    }

    pub fn is_cached(&self, doctype: &str) -> bool {
        self.doctypes.read().contains_key(doctype)
    }

    pub fn is_loading(&self, doctype: &str) -> bool {
        self.loading.lock().contains(doctype)
    }

    /// Wait for the schema of `doctype`, fetching it if needed. Returns
    /// whether it is cached afterwards.
    pub async fn load(&self, doctype: &str) -> bool {
        let lock = self.fetch_lock(doctype);
        let _guard = lock.lock().await;
        if self.is_cached(doctype) {
            self.loading.lock().remove(doctype);
            return true;
        }
        self.fetch(doctype).await
    }

    /// Refetch `doctype` even when cached.
    pub async fn reload(&self, doctype: &str) -> bool {
        let lock = self.fetch_lock(doctype);
        let _guard = lock.lock().await;
        self.fetch(doctype).await
    }

    fn fetch_lock(&self, doctype: &str) -> Arc<AsyncMutex<()>> {
        self.fetch_locks
            .lock()
            .entry(doctype.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn fetch(&self, doctype: &str) -> bool {
        let generation = self.generation.load(Ordering::SeqCst);
        let epoch = self.reporter.epoch();
        self.loading.lock().insert(doctype.to_string());
        let result = api::get_doctype(&*self.backend, doctype).await;
        self.loading.lock().remove(doctype);

        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(doctype, "dropping schema fetched before reset");
            return false;
        }

        match result {
            Ok(response) => {
                self.store(doctype, response);
                true
            }
            Err(e) => {
                self.reporter.report_from(epoch, "getdoctype", &e);
                false
            }
        }
    }

    fn store(&self, doctype: &str, response: DocTypeResponse) {
        let count = response.docs.len();
        {
            let mut doctypes = self.doctypes.write();
            for meta in response.docs {
                doctypes.insert(meta.name.clone(), Arc::new(meta));
            }
        }
        self.user_settings.write().insert(
            doctype.to_string(),
            Arc::new(response.user_settings.into_settings()),
        );
        info!(doctype, doctypes = count, "schema loaded");
    }

    pub fn doctype_meta(&self, doctype: &str) -> Option<Arc<DocTypeMeta>> {
        self.doctypes.read().get(doctype).cloned()
    }

    /// Settings of `parent`; empty until its schema has loaded.
    pub fn user_settings(&self, parent: &str) -> Arc<Map<String, Value>> {
        self.user_settings
            .read()
            .get(parent)
            .cloned()
            .unwrap_or_default()
    }

    /// Set `settings[key][doctype] = value` for `parent`, saving remotely only
    /// when that changes anything.
    pub async fn save_user_settings(
        &self,
        doctype: &str,
        parent: &str,
        key: &str,
        value: Value,
    ) -> Result<SaveOutcome, ClientError> {
        let current = self.user_settings(parent);
        let merged = settings::merge_setting(&current, key, doctype, value);

        if *current == merged {
            self.user_settings
                .write()
                .insert(parent.to_string(), Arc::new(merged));
            return Ok(SaveOutcome::Unchanged);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let epoch = self.reporter.epoch();
        if let Err(e) = api::save_user_settings(&*self.backend, parent, &merged).await {
            self.reporter.report_from(epoch, "save user settings", &e);
            return Err(e);
        }

        if generation == self.generation.load(Ordering::SeqCst) {
            self.user_settings
                .write()
                .insert(parent.to_string(), Arc::new(merged));
        }
        debug!(parent, key, doctype, "user settings saved");
        Ok(SaveOutcome::Saved)
    }

    /// Forget every schema and setting. Fetches still in flight are discarded
    /// when they complete.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.doctypes.write().clear();
        self.user_settings.write().clear();
        self.loading.lock().clear();
        info!("metadata cache reset");
    }
}

/// One doctype's view of a [`MetaCache`].
pub struct MetaHandle<B: Backend> {
    cache: Arc<MetaCache<B>>,
    doctype: String,
}

impl<B: Backend> Clone for MetaHandle<B> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            doctype: self.doctype.clone(),
        }
    }
}

impl<B: Backend> MetaHandle<B> {
    pub fn doctype(&self) -> &str {
        &self.doctype
    }

    pub fn loading(&self) -> bool {
        self.cache.is_loading(&self.doctype)
    }

    pub async fn load(&self) -> bool {
        self.cache.load(&self.doctype).await
    }

    /// The whole cached schema, flags included.
    pub fn grid_settings(&self) -> Option<Arc<DocTypeMeta>> {
        self.cache.doctype_meta(&self.doctype)
    }

    /// Normalized fields of `dt`, this handle's doctype by default.
    pub fn fields(&self, dt: Option<&str>) -> Option<Vec<NormalizedField>> {
        let meta = self.cache.doctype_meta(dt.unwrap_or(&self.doctype))?;
        Some(meta.fields.iter().map(normalize).collect())
    }

    pub fn field(&self, fieldname: &str) -> Option<FieldDescriptor> {
        self.grid_settings()?.field(fieldname).cloned()
    }

    pub fn formatted_float(&self, fieldname: &str, doc: &Doc) -> String {
        let df = self.field(fieldname);
        display::formatted_float(df.as_ref(), fieldname, doc, self.cache.defaults())
    }

    pub fn formatted_percent(&self, fieldname: &str, doc: &Doc) -> String {
        let df = self.field(fieldname);
        display::formatted_percent(df.as_ref(), fieldname, doc, self.cache.defaults())
    }

    pub fn formatted_currency(&self, fieldname: &str, doc: &Doc, parent: Option<&Doc>) -> String {
        let df = self.field(fieldname);
        display::formatted_currency(df.as_ref(), fieldname, doc, parent, self.cache.defaults())
    }

    pub fn float_with_precision(&self, fieldname: &str, doc: &Doc) -> f64 {
        let df = self.field(fieldname);
        display::float_with_precision(df.as_ref(), fieldname, doc, self.cache.defaults())
    }

    pub fn currency_with_precision(&self, fieldname: &str, doc: &Doc) -> String {
        let df = self.field(fieldname);
        display::currency_with_precision(df.as_ref(), fieldname, doc, self.cache.defaults())
    }

    /// `GridView` settings stored under `parent` for `dt`, this handle's
    /// doctype by default. An empty object when none are stored.
    pub fn grid_view_settings(&self, parent: &str, dt: Option<&str>) -> Value {
        let settings = self.cache.user_settings(parent);
        settings::grid_view(&settings, dt.unwrap_or(&self.doctype))
    }

    pub async fn save_user_settings(
        &self,
        parent: &str,
        key: &str,
        value: Value,
    ) -> Result<SaveOutcome, ClientError> {
        self.cache
            .save_user_settings(&self.doctype, parent, key, value)
            .await
    }

    /// Whether `fieldname` should be shown for `doc` given its `depends_on`.
    /// Unknown fields are visible.
    pub fn is_visible(&self, fieldname: &str, doc: &Doc) -> bool {
        match self.field(fieldname) {
            Some(df) => evaluate_depends_on(df.depends_on.as_deref(), doc),
            None => true,
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crm_client::{Backend, FailureReporter, api};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::error::ViewsError;
use crate::route::{Route, VIEW_TYPE_PARAM};
use crate::storage::LocalStorage;

pub const DEFAULT_OPEN_VIEWS_KEY: &str = "defaultOpenViews";

/// View type each doctype opens in, e.g. `"CRM Lead" -> "kanban"`.
pub type DefaultOpenViews = HashMap<String, String>;

/// Which view each doctype opens in, kept in local storage across sessions.
pub struct DefaultViewCache<B: Backend> {
    backend: Arc<B>,
    storage: Arc<dyn LocalStorage>,
    reporter: FailureReporter,
    fetch_lock: AsyncMutex<()>,
    generation: AtomicU64,
}

impl<B: Backend> DefaultViewCache<B> {
    pub fn new(backend: Arc<B>, storage: Arc<dyn LocalStorage>, reporter: FailureReporter) -> Self {
        Self {
            backend,
            storage,
            reporter,
            fetch_lock: AsyncMutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// The stored map, fetching and storing it when missing or unreadable.
    pub async fn ensure(&self) -> Result<DefaultOpenViews, ViewsError> {
        if let Some(views) = self.stored() {
            return Ok(views);
        }

        let _guard = self.fetch_lock.lock().await;
        // another caller may have fetched while we waited
        if let Some(views) = self.stored() {
            return Ok(views);
        }
        self.fetch_and_store().await
    }

    /// Fetch and store the map even when one is stored.
    pub async fn refresh(&self) -> Result<DefaultOpenViews, ViewsError> {
        let _guard = self.fetch_lock.lock().await;
        self.fetch_and_store().await
    }

    pub fn clear(&self) -> Result<(), ViewsError> {
        self.storage.remove(DEFAULT_OPEN_VIEWS_KEY)?;
        debug!("default open views cleared");
        Ok(())
    }

    /// Clear the stored map. A fetch still in flight returns its map to its
    /// caller but no longer stores it.
    pub fn reset(&self) -> Result<(), ViewsError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.clear()
    }

    /// Fill `route`'s `viewType` from the doctype's default view. A route
    /// that already names a view type is left alone. Returns whether the
    /// route changed.
    pub async fn apply_default_view(
        &self,
        doctype: &str,
        route: &mut Route,
    ) -> Result<bool, ViewsError> {
        if route.view_type().is_some() {
            return Ok(false);
        }

        let views = self.ensure().await?;
        match views.get(doctype).filter(|t| !t.is_empty()) {
            Some(view_type) => {
                route
                    .params
                    .insert(VIEW_TYPE_PARAM.to_string(), view_type.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn stored(&self) -> Option<DefaultOpenViews> {
        let raw = match self.storage.get(DEFAULT_OPEN_VIEWS_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "reading default open views failed");
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value @ Value::Object(_)) => Some(to_views(&value)),
            _ => {
                debug!("stored default open views unusable, refetching");
                None
            }
        }
    }

    async fn fetch_and_store(&self) -> Result<DefaultOpenViews, ViewsError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let epoch = self.reporter.epoch();
        let value = match api::get_default_open_view(&*self.backend).await {
            Ok(value) => value,
            Err(e) => {
                self.reporter.report_from(epoch, "get_default_open_view", &e);
                return Err(e.into());
            }
        };

        if generation != self.generation.load(Ordering::SeqCst) {
            debug!("not storing default open views fetched before reset");
            return Ok(to_views(&value));
        }

        let raw = serde_json::to_string(&value).map_err(crm_client::ClientError::from)?;
        if let Err(e) = self.storage.set(DEFAULT_OPEN_VIEWS_KEY, &raw) {
            warn!(error = %e, "storing default open views failed");
        }

        let views = to_views(&value);
        info!(doctypes = views.len(), "default open views fetched");
        Ok(views)
    }
}

/// String entries of a JSON object; anything else is ignored.
fn to_views(value: &Value) -> DefaultOpenViews {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(doctype, t)| Some((doctype.clone(), t.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

use std::collections::HashMap;
use std::sync::Arc;

use crm_client::{ViewDescriptor, ViewType, view_key};
use serde_json::Value;
use tracing::debug;

/// Saved views of one fetch, classified.
///
/// Built in a single pass over the server's records and never mutated
/// afterwards; a refetch builds a new index.
#[derive(Debug, Clone, Default)]
pub struct ViewIndex {
    views: Vec<Arc<ViewDescriptor>>,
    by_name: HashMap<String, Arc<ViewDescriptor>>,
    pinned: Vec<Arc<ViewDescriptor>>,
    public: Vec<Arc<ViewDescriptor>>,
    grouped: Vec<Arc<ViewDescriptor>>,
    standard: HashMap<String, Arc<ViewDescriptor>>,
    defaults: HashMap<String, Arc<ViewDescriptor>>,
}

impl ViewIndex {
    /// Decode and classify raw view records. Nulls, unnamed views and records
    /// that do not decode are skipped.
    pub fn build(records: Vec<Value>) -> Self {
        let views = records.into_iter().filter_map(|record| {
            if record.is_null() {
                return None;
            }
            match serde_json::from_value::<ViewDescriptor>(record) {
                Ok(view) if !view.name.is_empty() => Some(view),
                Ok(_) => {
                    debug!("skipping view without a name");
                    None
                }
                Err(e) => {
                    debug!(error = %e, "skipping malformed view");
                    None
                }
            }
        });
        Self::from_views(views)
    }

    pub fn from_views(views: impl IntoIterator<Item = ViewDescriptor>) -> Self {
        let mut index = ViewIndex::default();

        for view in views {
            let view = Arc::new(view);
            index.by_name.insert(view.name.clone(), Arc::clone(&view));

            if view.pinned {
                index.pinned.push(Arc::clone(&view));
            }
            if view.public {
                index.public.push(Arc::clone(&view));
            }
            if view.group {
                index.grouped.push(Arc::clone(&view));
            }
            if let Some(key) = view.type_key() {
                if view.is_standard {
                    index.standard.insert(key.clone(), Arc::clone(&view));
                }
                if view.is_default {
                    index.defaults.insert(key, Arc::clone(&view));
                }
            }

            index.views.push(view);
        }

        index
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Every view, in server order.
    pub fn views(&self) -> &[Arc<ViewDescriptor>] {
        &self.views
    }

    pub fn pinned(&self) -> &[Arc<ViewDescriptor>] {
        &self.pinned
    }

    pub fn public(&self) -> &[Arc<ViewDescriptor>] {
        &self.public
    }

    pub fn grouped(&self) -> &[Arc<ViewDescriptor>] {
        &self.grouped
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<ViewDescriptor>> {
        self.by_name.get(name)
    }

    pub fn standard_view(&self, doctype: &str, view_type: &ViewType) -> Option<&Arc<ViewDescriptor>> {
        self.standard.get(&view_key(doctype, view_type))
    }

    pub fn default_view(&self, doctype: &str, view_type: &ViewType) -> Option<&Arc<ViewDescriptor>> {
        self.defaults.get(&view_key(doctype, view_type))
    }

    /// Standard views keyed by `"<dt> <type>"`.
    pub fn standard_views(&self) -> &HashMap<String, Arc<ViewDescriptor>> {
        &self.standard
    }

    /// Default views keyed by `"<dt> <type>"`.
    pub fn default_views(&self) -> &HashMap<String, Arc<ViewDescriptor>> {
        &self.defaults
    }

    /// A named view, or without a name the standard view of `doctype` for
    /// `view_type`.
    pub fn lookup(
        &self,
        name: Option<&str>,
        view_type: &ViewType,
        doctype: Option<&str>,
    ) -> Option<&Arc<ViewDescriptor>> {
        match (name.filter(|n| !n.is_empty()), doctype) {
            (Some(name), _) => self.by_name(name),
            (None, Some(doctype)) => self.standard_view(doctype, view_type),
            (None, None) => None,
        }
    }
}

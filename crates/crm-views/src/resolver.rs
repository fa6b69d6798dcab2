use std::sync::Arc;

use crm_client::{Backend, ViewDescriptor, ViewType};

use crate::index::ViewIndex;
use crate::registry::ViewRegistry;

/// Icon shown next to a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewIcon {
    List,
    GroupBy,
    Kanban,
    /// Set on the view itself (usually an emoji).
    Custom(String),
}

/// What the desk shows for a view reference: always a label and an icon,
/// plus the view when one was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
    pub label: String,
    pub icon: ViewIcon,
    pub view_type: ViewType,
    pub view: Option<Arc<ViewDescriptor>>,
}

/// Label and icon of the built-in view of `view_type`.
///
/// Types without a built-in entry use the list icon and their own name.
pub fn placeholder(view_type: &ViewType) -> (String, ViewIcon) {
    match view_type {
        ViewType::List => ("List".to_string(), ViewIcon::List),
        ViewType::GroupBy => ("Group By".to_string(), ViewIcon::GroupBy),
        ViewType::Kanban => ("Kanban".to_string(), ViewIcon::Kanban),
        ViewType::Other(name) => (name.clone(), ViewIcon::List),
    }
}

impl ViewIndex {
    pub fn resolve(
        &self,
        name: Option<&str>,
        view_type: Option<&ViewType>,
        doctype: Option<&str>,
    ) -> ResolvedView {
        let view_type = view_type.cloned().unwrap_or_default();
        let (default_label, default_icon) = placeholder(&view_type);

        match self.lookup(name, &view_type, doctype) {
            Some(view) => ResolvedView {
                label: view
                    .label
                    .clone()
                    .filter(|l| !l.is_empty())
                    .unwrap_or(default_label),
                icon: view
                    .icon
                    .clone()
                    .filter(|i| !i.is_empty())
                    .map(ViewIcon::Custom)
                    .unwrap_or(default_icon),
                view_type: view.view_type.clone(),
                view: Some(Arc::clone(view)),
            },
            None => ResolvedView {
                label: default_label,
                icon: default_icon,
                view_type,
                view: None,
            },
        }
    }
}

/// Resolve a view reference against the registry's current index. Never
/// fails: unknown references resolve to the built-in view of the type.
pub fn resolve_view<B: Backend>(
    registry: &ViewRegistry<B>,
    name: Option<&str>,
    view_type: Option<&ViewType>,
    doctype: Option<&str>,
) -> ResolvedView {
    registry.snapshot().resolve(name, view_type, doctype)
}

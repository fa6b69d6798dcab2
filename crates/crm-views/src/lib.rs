mod default_view;
mod error;
mod index;
mod registry;
mod resolver;
mod route;
mod storage;

pub use default_view::{DEFAULT_OPEN_VIEWS_KEY, DefaultOpenViews, DefaultViewCache};
pub use error::ViewsError;
pub use index::ViewIndex;
pub use registry::ViewRegistry;
pub use resolver::{ResolvedView, ViewIcon, placeholder, resolve_view};
pub use route::{Route, VIEW_TYPE_PARAM};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};

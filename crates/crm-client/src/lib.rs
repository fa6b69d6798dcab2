pub mod api;
mod backend;
mod de;
mod error;
mod meta;
mod report;
mod transport;
mod value;
mod view;

pub use backend::Backend;
pub use error::ClientError;
pub use meta::{DocTypeMeta, DocTypeResponse, FieldDescriptor, FieldType, UserSettingsPayload};
pub use report::FailureReporter;
pub use transport::{HttpBackend, HttpBackendConfig};
pub use value::{Doc, flt, truthy};
pub use view::{ViewDescriptor, ViewType, view_key};

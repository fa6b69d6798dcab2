mod cache;
pub mod depends_on;
mod display;
mod field;
mod settings;

pub use cache::{MetaCache, MetaHandle, SaveOutcome};
pub use depends_on::{DependsOn, ExprError, evaluate_depends_on};
pub use display::{DisplayDefaults, FALLBACK_CURRENCY, resolve_currency};
pub use field::{FieldOptions, NormalizedField, SelectOption, normalize};
pub use settings::{grid_view, merge_setting};

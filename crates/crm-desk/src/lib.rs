mod config;
mod error;
mod flags;
mod session;
mod settings;
mod users;

pub use config::{CONFIG_PATH_VAR, DeskConfig, GUEST_USER};
pub use error::{ConfigError, DeskError};
pub use flags::{CallIntegrationResponse, CallSettings, IntegrationFlags};
pub use session::Session;
pub use settings::{Brand, SETTINGS_DOCTYPE, SiteSettings};
pub use users::{
    ROLE_SALES_MANAGER, ROLE_SALES_USER, ROLE_SYSTEM_MANAGER, SESSION_USER, UserDirectory,
    UserRecord,
};

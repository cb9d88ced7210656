pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod plugin;
pub mod query;
pub mod record;

pub use config::PlumaConfig;
pub use error::{PlumaError, StoreError};
pub use event::PluginEvent;
pub use plugin::{Caller, ParseMode, ParseModeConfig, Plugin, PluginSpec};
pub use query::PluginQuery;
pub use record::PluginRecord;

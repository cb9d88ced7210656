pub mod notifier;
pub mod service;

pub use notifier::{ChangeNotifier, EventPublisher};
pub use service::PluginService;

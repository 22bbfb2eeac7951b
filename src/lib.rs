pub mod commands;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod events;
pub mod host;
pub mod input;
pub mod integrations;
pub mod models;
pub mod services;
pub mod state;
pub mod world;

// Convenient re-exports (so call sites can do `collar::Registry`, etc.)
pub use dispatch::{CommandTree, DispatchResult};
pub use events::EventBus;
pub use state::{registry::Registry, source::Source};

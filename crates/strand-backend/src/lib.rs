//! Strand Backend - Renderer contract and adapters
//!
//! Every playback backend implements the same capability set: construct
//! with a configuration snapshot, become ready (synchronously or after
//! an external handshake), buffer property writes until ready, mount
//! markup in place of a placeholder, and forward native events as
//! normalized notices.
//!
//! Adapters:
//! - `native`: in-process media element, ready at construction
//! - `plugin`: script-loaded plugin object, ready after a handshake
//! - `embed`: third-party SDK iframe, URL-pattern playability

mod config;
mod contract;
mod instances;
mod notice;
mod registry;

pub mod embed;
pub mod native;
pub mod plugin;

pub use config::{BackendConfig, PropertyValue};
pub use contract::{Backend, ReadyFn, RendererId, RendererKind, ReplaceOutcome};
pub use instances::InstanceTable;
pub use notice::{Notice, NoticeQueue};
pub use registry::{Environment, RendererRegistry, ScriptState, SharedEnvironment};

/// Every renderer kind this crate ships, in default priority order
pub const BUILTIN_RENDERERS: &[RendererId] = &[native::ID, plugin::ID, embed::ID];

/// Backend errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("backend already destroyed")]
    Destroyed,

    #[error("page error: {0}")]
    Page(#[from] strand_page::PageError),
}

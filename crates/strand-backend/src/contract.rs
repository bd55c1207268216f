//! Renderer contract
//!
//! The polymorphic interface every backend variant implements, and the
//! class-level descriptor used for selection before any instance
//! exists. "Default, overridable" behavior is ordinary virtual
//! dispatch: `can_play` derives from the type table unless an adapter
//! overrides it (the embed adapter matches URL patterns instead).

use std::fmt;

use strand_mime::{can_play, MimeType, TypeTable, Verdict};
use strand_page::{NodeId, Page};

use crate::{BackendConfig, BackendError, Environment, NoticeQueue, PropertyValue};

/// Static identity of a backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(pub &'static str);

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One-shot readiness callback; receives the backend's root node
/// (NONE when the backend is markup-less)
pub type ReadyFn = Box<dyn FnOnce(NodeId)>;

/// Result of asking a backend to mount its markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Markup is in the tree at the given root
    Mounted(NodeId),
    /// The backend's external script has not finished loading; retry
    WaitingForScript,
}

/// Class-level renderer descriptor
///
/// One per backend kind, constructed once; participates in the ordered
/// supported-renderers list when its environment probe passes.
pub trait RendererKind {
    /// Static identity
    fn id(&self) -> RendererId;

    /// Static MIME capability table
    fn type_table(&self) -> TypeTable;

    /// Verdict for an explicit type (pure table lookup)
    fn can_play_type(&self, mime: &MimeType) -> Verdict {
        self.type_table().verdict(mime)
    }

    /// Verdict for a locator, deriving candidate types when absent
    fn can_play(&self, locator: &str, mime: Option<&MimeType>) -> Verdict {
        can_play(&self.type_table(), locator, mime)
    }

    /// Environment probe; evaluated once at registry detection
    fn probe(&self, env: &Environment) -> bool;

    /// Construct a live backend instance
    fn build(&self, config: BackendConfig, notices: NoticeQueue) -> Box<dyn Backend>;
}

/// Live backend instance, bound to exactly one facade at a time
pub trait Backend {
    /// Kind this instance belongs to
    fn kind_id(&self) -> RendererId;

    /// Configuration snapshot the instance was built with
    fn config(&self) -> BackendConfig;

    /// Readiness flag; at most one readiness signal ever fires
    fn is_ready(&self) -> bool;

    /// Invoke immediately if ready, else queue for the one-shot signal
    fn on_ready(&mut self, callback: ReadyFn);

    /// Read a property; `None` before readiness
    fn get(&self, prop: &str) -> Option<PropertyValue>;

    /// Write a property
    ///
    /// Before readiness the value lands in a pending cache and `None`
    /// comes back. After readiness the write goes through the backend's
    /// translation table and the value the backend actually holds is
    /// read back, which may differ from the requested one.
    fn set(&mut self, prop: &str, value: PropertyValue) -> Option<PropertyValue>;

    /// Mount markup in place of the anchor (or run markup-less)
    fn replace(&mut self, page: &mut Page, anchor: Option<NodeId>)
        -> Result<ReplaceOutcome, BackendError>;

    /// Root node of the mounted markup, if any
    fn root(&self) -> Option<NodeId>;

    /// Tear down: restore the displaced node, deregister, release.
    /// Idempotent; destroying an unmounted instance is a no-op.
    fn destroy(&mut self, page: &mut Page);

    /// Start forwarding a native event type as notices
    fn bind(&mut self, event: &str);

    /// Stop forwarding a native event type
    fn unbind(&mut self, event: &str);

    // Media commands

    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, seconds: f64);
}

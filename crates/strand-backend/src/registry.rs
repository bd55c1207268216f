//! Environment probing and the supported-renderers list
//!
//! Each kind's probe runs exactly once, at detection; the resulting
//! ordered list only ever shrinks when a caller narrows it. The
//! environment is shared behind `Rc<RefCell<..>>` because external
//! scripts can finish loading after detection.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{embed, native, plugin, RendererId, RendererKind};

/// Load state of an external backend script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScriptState {
    #[default]
    Missing,
    Loading,
    Loaded,
}

/// What load-time probing sees
#[derive(Debug, Clone)]
pub struct Environment {
    /// Native media elements are available
    pub native_media: bool,
    /// Installed plugin runtime major version, if any
    pub plugin_version: Option<u32>,
    /// Plugin bootstrap script state
    pub plugin_script: ScriptState,
    /// Third-party embed API is usable at all
    pub embed_api: bool,
    /// Embed SDK script state
    pub embed_script: ScriptState,
}

impl Environment {
    /// Environment with every backend available and all scripts loaded
    pub fn full() -> Self {
        Self {
            native_media: true,
            plugin_version: Some(11),
            plugin_script: ScriptState::Loaded,
            embed_api: true,
            embed_script: ScriptState::Loaded,
        }
    }

    /// Native media only
    pub fn native_only() -> Self {
        Self {
            native_media: true,
            plugin_version: None,
            plugin_script: ScriptState::Missing,
            embed_api: false,
            embed_script: ScriptState::Missing,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::native_only()
    }
}

/// Shared handle to the environment
pub type SharedEnvironment = Rc<RefCell<Environment>>;

/// Ordered list of currently supported renderer kinds
pub struct RendererRegistry {
    kinds: Vec<Rc<dyn RendererKind>>,
}

impl RendererRegistry {
    /// Probe the builtin kinds once and keep the ones that pass
    ///
    /// Order is selection priority: native first, then plugin, then
    /// embed.
    pub fn detect(env: &SharedEnvironment) -> Self {
        let mut registry = Self { kinds: Vec::new() };
        registry.register(Rc::new(native::NativeKind::new()), env);
        registry.register(Rc::new(plugin::PluginKind::new(env.clone())), env);
        registry.register(Rc::new(embed::EmbedKind::new(env.clone())), env);
        registry
    }

    /// Empty registry, for explicit registration
    pub fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Self-registration surface for backend adapters, probe-gated
    pub fn register(&mut self, kind: Rc<dyn RendererKind>, env: &SharedEnvironment) {
        let supported = kind.probe(&env.borrow());
        if supported {
            tracing::info!(renderer = %kind.id(), "renderer supported");
            self.kinds.push(kind);
        } else {
            tracing::debug!(renderer = %kind.id(), "renderer not supported in this environment");
        }
    }

    /// Supported kinds in priority order
    pub fn kinds(&self) -> &[Rc<dyn RendererKind>] {
        &self.kinds
    }

    pub fn contains(&self, id: RendererId) -> bool {
        self.kinds.iter().any(|k| k.id() == id)
    }

    pub fn find(&self, id: RendererId) -> Option<Rc<dyn RendererKind>> {
        self.kinds.iter().find(|k| k.id() == id).cloned()
    }

    /// Keep only the named kinds; order and probe results are preserved
    pub fn narrow(&self, ids: &[RendererId]) -> Self {
        Self {
            kinds: self
                .kinds
                .iter()
                .filter(|k| ids.contains(&k.id()))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

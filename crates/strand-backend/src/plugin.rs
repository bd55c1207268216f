//! Plugin backend
//!
//! Mounts an `<object>` element once the plugin bootstrap script has
//! loaded, then waits for the plugin's handshake callback before it is
//! ready. Until then property writes buffer in a pending cache. The
//! plugin side speaks percent volume and millisecond positions; the
//! translation table lives in `apply` / `read`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use strand_mime::{TypeTable, Verdict};
use strand_page::{NodeId, Page};

use crate::{
    Backend, BackendConfig, BackendError, Environment, InstanceTable, Notice, NoticeQueue,
    PropertyValue, ReadyFn, RendererId, RendererKind, ReplaceOutcome, ScriptState,
    SharedEnvironment,
};

/// Kind identity
pub const ID: RendererId = RendererId("plugin");

/// Oldest plugin runtime the adapter drives
pub const MIN_VERSION: u32 = 9;

pub const TYPE_TABLE: TypeTable = TypeTable {
    entries: &[
        ("video/mp4", Verdict::Probably),
        ("video/x-flv", Verdict::Probably),
        ("video/quicktime", Verdict::Maybe),
        ("audio/mpeg", Verdict::Probably),
        ("audio/mp4", Verdict::Maybe),
        ("audio/aac", Verdict::Probably),
    ],
};

thread_local! {
    static INSTANCES: InstanceTable<PluginInner> = InstanceTable::new();
}

/// True while an instance with this player id is registered
pub fn is_registered(player_id: &str) -> bool {
    INSTANCES.with(|t| t.lookup(player_id).is_some())
}

/// Plugin-side handshake completion, delivered by id from global scope
///
/// Returns false when the id does not resolve, the markup is not
/// mounted yet, or the instance already fired its one-shot readiness.
pub fn notify_handshake_complete(player_id: &str) -> bool {
    let Some(inner) = INSTANCES.with(|t| t.lookup(player_id)) else {
        return false;
    };
    let (callbacks, root) = {
        let mut inner = inner.borrow_mut();
        if inner.destroyed || inner.ready || !inner.root.is_valid() {
            return false;
        }
        inner.handle = Some(PluginHandle::from_config(&inner.config));
        inner.ready = true;
        let pending = std::mem::take(&mut inner.pending);
        for (prop, value) in pending {
            inner.apply(&prop, value);
        }
        tracing::debug!(id = %inner.config.id, "plugin handshake complete");
        (std::mem::take(&mut inner.callbacks), inner.root)
    };
    for callback in callbacks {
        callback(root);
    }
    true
}

/// The plugin's scripting surface
#[derive(Debug)]
struct PluginHandle {
    src: String,
    volume_pct: u32,
    position_ms: u64,
    playing: bool,
    muted: bool,
}

impl PluginHandle {
    fn from_config(config: &BackendConfig) -> Self {
        Self {
            src: config.src.clone(),
            volume_pct: (config.volume.clamp(0.0, 1.0) * 100.0).round() as u32,
            position_ms: 0,
            playing: false,
            muted: config.muted,
        }
    }
}

struct PluginInner {
    config: BackendConfig,
    notices: NoticeQueue,
    env: SharedEnvironment,
    handle: Option<PluginHandle>,
    pending: Vec<(String, PropertyValue)>,
    callbacks: Vec<ReadyFn>,
    ready: bool,
    root: NodeId,
    displaced: NodeId,
    bound: HashSet<String>,
    destroyed: bool,
}

impl PluginInner {
    fn forward(&mut self, event: &str, value: Option<PropertyValue>) {
        if self.bound.contains(event) {
            self.notices.push(Notice::Media {
                player_id: self.config.id.clone(),
                event: event.to_string(),
                value,
            });
        }
    }

    /// Translated write against the live handle; returns the readback
    fn apply(&mut self, prop: &str, value: PropertyValue) -> Option<PropertyValue> {
        let handle = self.handle.as_mut()?;
        match prop {
            "src" => {
                let src = value.as_str()?.to_string();
                handle.src = src.clone();
                handle.position_ms = 0;
                handle.playing = false;
                self.config.src = src.clone();
                Some(src.into())
            }
            "volume" => {
                let pct = (value.as_f64()?.clamp(0.0, 1.0) * 100.0).round() as u32;
                handle.volume_pct = pct;
                let back = pct as f64 / 100.0;
                self.forward("volumechange", Some(back.into()));
                Some(back.into())
            }
            "muted" => {
                let m = value.as_bool()?;
                handle.muted = m;
                Some(m.into())
            }
            "current_time" => {
                handle.position_ms = (value.as_f64()?.max(0.0) * 1000.0) as u64;
                Some((handle.position_ms as f64 / 1000.0).into())
            }
            "width" => {
                self.config.width = value.as_f64()? as u32;
                Some(self.config.width.into())
            }
            "height" => {
                self.config.height = value.as_f64()? as u32;
                Some(self.config.height.into())
            }
            _ => None,
        }
    }
}

/// Plugin kind descriptor
pub struct PluginKind {
    env: SharedEnvironment,
}

impl PluginKind {
    pub fn new(env: SharedEnvironment) -> Self {
        Self { env }
    }
}

impl RendererKind for PluginKind {
    fn id(&self) -> RendererId {
        ID
    }

    fn type_table(&self) -> TypeTable {
        TYPE_TABLE
    }

    fn probe(&self, env: &Environment) -> bool {
        env.plugin_version.is_some_and(|v| v >= MIN_VERSION)
    }

    fn build(&self, config: BackendConfig, notices: NoticeQueue) -> Box<dyn Backend> {
        Box::new(PluginBackend::new(config, notices, self.env.clone()))
    }
}

/// Live plugin backend
pub struct PluginBackend {
    inner: Rc<RefCell<PluginInner>>,
}

impl PluginBackend {
    pub fn new(config: BackendConfig, notices: NoticeQueue, env: SharedEnvironment) -> Self {
        let inner = Rc::new(RefCell::new(PluginInner {
            config,
            notices,
            env,
            handle: None,
            pending: Vec::new(),
            callbacks: Vec::new(),
            ready: false,
            root: NodeId::NONE,
            displaced: NodeId::NONE,
            bound: HashSet::new(),
            destroyed: false,
        }));
        INSTANCES.with(|t| t.insert(&inner.borrow().config.id, &inner));
        Self { inner }
    }
}

impl Backend for PluginBackend {
    fn kind_id(&self) -> RendererId {
        ID
    }

    fn config(&self) -> BackendConfig {
        self.inner.borrow().config.clone()
    }

    fn is_ready(&self) -> bool {
        self.inner.borrow().ready
    }

    fn on_ready(&mut self, callback: ReadyFn) {
        let mut inner = self.inner.borrow_mut();
        if inner.ready {
            let root = inner.root;
            drop(inner);
            callback(root);
        } else {
            inner.callbacks.push(callback);
        }
    }

    fn get(&self, prop: &str) -> Option<PropertyValue> {
        let inner = self.inner.borrow();
        let handle = inner.handle.as_ref()?;
        match prop {
            "src" => Some(handle.src.as_str().into()),
            "paused" => Some((!handle.playing).into()),
            "volume" => Some((handle.volume_pct as f64 / 100.0).into()),
            "muted" => Some(handle.muted.into()),
            "current_time" => Some((handle.position_ms as f64 / 1000.0).into()),
            "width" => Some(inner.config.width.into()),
            "height" => Some(inner.config.height.into()),
            _ => None,
        }
    }

    fn set(&mut self, prop: &str, value: PropertyValue) -> Option<PropertyValue> {
        let mut inner = self.inner.borrow_mut();
        if !inner.ready {
            inner.pending.push((prop.to_string(), value));
            return None;
        }
        inner.apply(prop, value)
    }

    fn replace(
        &mut self,
        page: &mut Page,
        anchor: Option<NodeId>,
    ) -> Result<ReplaceOutcome, BackendError> {
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return Err(BackendError::Destroyed);
        }
        if inner.root.is_valid() {
            return Ok(ReplaceOutcome::Mounted(inner.root));
        }
        if inner.env.borrow().plugin_script != ScriptState::Loaded {
            return Ok(ReplaceOutcome::WaitingForScript);
        }
        let Some(anchor) = anchor else {
            return Ok(ReplaceOutcome::Mounted(NodeId::NONE));
        };

        let root = page.create_element("object");
        {
            let elem = page.element_mut(root)?;
            elem.set_attr("id", &inner.config.id);
            elem.set_attr("type", "application/x-strand-plugin");
            elem.set_attr("data", &inner.config.src);
            elem.set_attr("width", &inner.config.width.to_string());
            elem.set_attr("height", &inner.config.height.to_string());
        }
        inner.displaced = page.replace_node(anchor, root)?;
        inner.root = root;
        tracing::debug!(id = %inner.config.id, "plugin markup mounted");
        Ok(ReplaceOutcome::Mounted(root))
    }

    fn root(&self) -> Option<NodeId> {
        let root = self.inner.borrow().root;
        root.is_valid().then_some(root)
    }

    fn destroy(&mut self, page: &mut Page) {
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return;
        }
        if inner.root.is_valid() {
            if inner.displaced.is_valid() {
                let _ = page.replace_node(inner.root, inner.displaced);
            } else {
                page.detach(inner.root);
            }
        }
        INSTANCES.with(|t| t.remove(&inner.config.id));
        inner.handle = None;
        inner.callbacks.clear();
        inner.pending.clear();
        inner.bound.clear();
        inner.root = NodeId::NONE;
        inner.displaced = NodeId::NONE;
        inner.destroyed = true;
        tracing::debug!(id = %inner.config.id, "plugin backend destroyed");
    }

    fn bind(&mut self, event: &str) {
        self.inner.borrow_mut().bound.insert(event.to_string());
    }

    fn unbind(&mut self, event: &str) {
        self.inner.borrow_mut().bound.remove(event);
    }

    fn play(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.as_mut() {
            handle.playing = true;
            inner.forward("play", None);
        } else {
            tracing::debug!(id = %inner.config.id, "play before handshake dropped");
        }
    }

    fn pause(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.as_mut() {
            handle.playing = false;
            inner.forward("pause", None);
        }
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.as_mut() {
            handle.playing = false;
            handle.position_ms = 0;
            inner.forward("pause", None);
        }
    }

    fn seek(&mut self, seconds: f64) {
        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.handle.as_mut() {
            handle.position_ms = (seconds.max(0.0) * 1000.0) as u64;
            let at = handle.position_ms as f64 / 1000.0;
            inner.forward("timeupdate", Some(at.into()));
        }
    }
}

//! Player facade
//!
//! The only object application code touches. Owns the pending
//! configuration, the source list, the candidate renderer set, the
//! event surface, and a virtual clock for script-retry scheduling;
//! media control and property access delegate to the current backend
//! through the switch coordinator.

use std::collections::HashMap;

use strand_backend::{
    BackendConfig, Notice, NoticeQueue, PropertyValue, RendererId, RendererRegistry,
    BUILTIN_RENDERERS,
};
use strand_mime::MimeType;
use strand_page::{NodeId, Page};

use crate::events::{kinds, EventHub, HandlerId};
use crate::properties;
use crate::source::{resolve, Source, SourceSpec};
use crate::switch::{Coordinator, PlayerState, Selection};
use crate::PlayerError;

/// A scriptable media player bound to at most one backend at a time
pub struct Player {
    id: String,
    config: BackendConfig,
    private: HashMap<String, PropertyValue>,
    sources: Vec<Source>,
    registry: RendererRegistry,
    coordinator: Coordinator,
    hub: EventHub,
    element: NodeId,
    current_root: NodeId,
    current_source: Option<usize>,
    /// Seek requested while no backend was bound; applied at readiness
    pending_seek: Option<f64>,
    notices: NoticeQueue,
    clock_ms: u64,
}

impl Player {
    pub(crate) fn new(id: String, registry: RendererRegistry) -> Self {
        Self {
            config: BackendConfig {
                id: id.clone(),
                ..Default::default()
            },
            private: HashMap::new(),
            sources: Vec::new(),
            registry,
            coordinator: Coordinator::new(&id),
            id,
            hub: EventHub::new(),
            element: NodeId::NONE,
            current_root: NodeId::NONE,
            current_source: None,
            pending_seek: None,
            notices: NoticeQueue::new(),
            clock_ms: 0,
        }
    }

    /// Stable identifier; fixed before any renderer is constructed
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> PlayerState {
        self.coordinator.state()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == PlayerState::Destroyed
    }

    /// Renderer kind currently bound, if any
    pub fn current_renderer(&self) -> Option<RendererId> {
        self.coordinator.current_renderer()
    }

    /// Index of the selected source in the source list
    pub fn current_source(&self) -> Option<usize> {
        self.current_source
    }

    /// The bound placeholder element
    pub fn element(&self) -> Option<NodeId> {
        self.element.is_valid().then_some(self.element)
    }

    /// Root of the mounted renderer markup, once ready
    pub fn current_root(&self) -> Option<NodeId> {
        self.current_root.is_valid().then_some(self.current_root)
    }

    /// Bind (or rebind) the facade to a page element
    ///
    /// A native media element's attributes and `<source>` children
    /// become the pending configuration and initial source list.
    /// Rebinding tears the current backend down first, restoring
    /// whatever it displaced.
    pub fn bind_element(&mut self, page: &mut Page, node: NodeId) -> Result<(), PlayerError> {
        if self.is_destroyed() {
            return Err(PlayerError::Destroyed);
        }
        page.element(node)?;
        self.coordinator.teardown(page);
        self.current_root = NodeId::NONE;
        self.element = node;

        let tag = page.tag(node).unwrap_or("").to_string();
        if tag != "video" && tag != "audio" {
            return Ok(());
        }

        // Authored media element: absorb attributes and sources
        let mut specs: Vec<SourceSpec> = Vec::new();
        {
            let elem = page.element(node)?;
            if let Some(src) = elem.attr("src") {
                if !src.is_empty() {
                    specs.push(SourceSpec::Url(src.to_string()));
                }
            }
            if let Some(w) = elem.attr("width").and_then(|v| v.parse().ok()) {
                self.config.width = w;
            }
            if let Some(h) = elem.attr("height").and_then(|v| v.parse().ok()) {
                self.config.height = h;
            }
            self.config.autoplay = elem.attr("autoplay").is_some();
            self.config.looping = elem.attr("loop").is_some();
            self.config.muted = elem.attr("muted").is_some();
            self.config.controls = elem.attr("controls").is_some();
            self.config.preload = elem.attr("preload").map(str::to_string);
            self.config.poster = elem.attr("poster").map(str::to_string);
        }
        let children: Vec<NodeId> = page.children(node).map(|(id, _)| id).collect();
        for child in children {
            let Ok(elem) = page.element(child) else { continue };
            if elem.tag != "source" {
                continue;
            }
            let Some(src) = elem.attr("src") else { continue };
            let mime = elem.attr("type").and_then(|t| MimeType::parse(t).ok());
            specs.push(SourceSpec::Descriptor {
                src: src.to_string(),
                mime,
            });
        }
        if !specs.is_empty() {
            self.sources = resolve(Some(SourceSpec::Many(specs)), &self.registry);
            if let Some(first) = self.sources.first() {
                self.config.src = first.locator.clone();
            }
        }
        Ok(())
    }

    /// Narrow the candidate renderer set
    ///
    /// An unknown renderer name is a caller bug and fails loudly. A
    /// known renderer that failed its environment probe is reported
    /// through `rendererunsupported` and skipped.
    pub fn set_candidates(&mut self, names: &[&str]) -> Result<(), PlayerError> {
        let mut wanted: Vec<RendererId> = Vec::new();
        for name in names {
            let id = BUILTIN_RENDERERS
                .iter()
                .find(|r| r.0 == *name)
                .copied()
                .ok_or_else(|| PlayerError::UnknownRenderer(name.to_string()))?;
            if self.registry.contains(id) {
                wanted.push(id);
            } else {
                tracing::warn!(player = %self.id, renderer = %id, "requested renderer unsupported");
                self.hub
                    .trigger(kinds::RENDERER_UNSUPPORTED, Some((*name).into()));
            }
        }
        self.registry = self.registry.narrow(&wanted);
        Ok(())
    }

    /// Assign a new source specification and bind a renderer for it
    pub fn load(&mut self, page: &mut Page, spec: impl Into<SourceSpec>) {
        if self.is_destroyed() {
            return;
        }
        self.sources = resolve(Some(spec.into()), &self.registry);
        self.bind_current(page);
    }

    /// Reset to the explicit no-source state
    pub fn clear_sources(&mut self) {
        self.sources.clear();
        self.current_source = None;
    }

    /// Run selection over the current source list
    pub fn bind_current(&mut self, page: &mut Page) {
        if self.is_destroyed() || self.sources.is_empty() {
            return;
        }
        let anchor = self.element.is_valid().then_some(self.element);
        let selection = self.coordinator.select_and_bind(
            page,
            &mut self.sources,
            &self.registry,
            &self.config,
            anchor,
            &mut self.hub,
            &self.notices,
            self.clock_ms,
        );
        self.current_source = match selection {
            Selection::KeptCurrent { source } | Selection::Switched { source, .. } => Some(source),
            Selection::NoneAvailable => None,
        };
        self.pump();
    }

    /// Read a property: specialized path, then backend, then pending
    /// config, then private state
    pub fn get(&self, prop: &str) -> Option<PropertyValue> {
        if prop == "src" {
            return self
                .current_source
                .and_then(|i| self.sources.get(i))
                .map(|s| s.locator.as_str().into())
                .or_else(|| {
                    (!self.config.src.is_empty()).then(|| self.config.src.as_str().into())
                });
        }
        if !properties::is_gettable(prop) {
            return self.private.get(prop).cloned();
        }
        if let Some(backend) = self.coordinator.backend() {
            if let Some(value) = backend.get(prop) {
                return Some(value);
            }
        }
        self.config_get(prop)
    }

    fn config_get(&self, prop: &str) -> Option<PropertyValue> {
        match prop {
            "volume" => Some(self.config.volume.into()),
            "muted" => Some(self.config.muted.into()),
            "width" => Some(self.config.width.into()),
            "height" => Some(self.config.height.into()),
            "autoplay" => Some(self.config.autoplay.into()),
            "loop" => Some(self.config.looping.into()),
            "controls" => Some(self.config.controls.into()),
            "preload" => self.config.preload.as_deref().map(PropertyValue::from),
            "poster" => self.config.poster.as_deref().map(PropertyValue::from),
            _ => None,
        }
    }

    /// Write a property
    ///
    /// Unrecognized names land in private state and never reach the
    /// backend-bound configuration. The returned value is what the
    /// backend actually holds, which may differ from the request.
    pub fn set(
        &mut self,
        page: &mut Page,
        prop: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, PlayerError> {
        if self.is_destroyed() {
            return Err(PlayerError::Destroyed);
        }
        if !properties::is_settable(prop) {
            self.private.insert(prop.to_string(), value);
            return Ok(None);
        }
        match prop {
            "element" => {
                let id = value
                    .as_str()
                    .ok_or_else(|| PlayerError::InvalidValue(prop.to_string()))?;
                let node = page
                    .get_element_by_id(id)
                    .ok_or_else(|| PlayerError::NoSuchElement(id.to_string()))?;
                self.bind_element(page, node)?;
                Ok(None)
            }
            "src" => {
                let src = value
                    .as_str()
                    .ok_or_else(|| PlayerError::InvalidValue(prop.to_string()))?
                    .to_string();
                self.load(page, src.as_str());
                Ok(Some(src.into()))
            }
            "volume" => {
                let v = value.as_f64().unwrap_or(self.config.volume).clamp(0.0, 1.0);
                self.config.volume = v;
                Ok(self.backend_set(prop, v.into()).or(Some(v.into())))
            }
            "muted" => {
                let m = value.as_bool().unwrap_or(self.config.muted);
                self.config.muted = m;
                Ok(self.backend_set(prop, m.into()).or(Some(m.into())))
            }
            "current_time" => {
                let t = value
                    .as_f64()
                    .ok_or_else(|| PlayerError::InvalidValue(prop.to_string()))?;
                match self.backend_set(prop, t.into()) {
                    Some(actual) => Ok(Some(actual)),
                    None => {
                        // No backend yet; the seek lands after the
                        // next bind completes
                        self.pending_seek = Some(t);
                        Ok(Some(t.into()))
                    }
                }
            }
            "width" => {
                let w = value.as_f64().unwrap_or(0.0) as u32;
                self.config.width = w;
                Ok(self.backend_set(prop, w.into()).or(Some(w.into())))
            }
            "height" => {
                let h = value.as_f64().unwrap_or(0.0) as u32;
                self.config.height = h;
                Ok(self.backend_set(prop, h.into()).or(Some(h.into())))
            }
            "autoplay" | "loop" | "controls" => {
                let b = value.as_bool().unwrap_or(false);
                match prop {
                    "autoplay" => self.config.autoplay = b,
                    "loop" => self.config.looping = b,
                    _ => self.config.controls = b,
                }
                Ok(Some(b.into()))
            }
            "preload" | "poster" => {
                let s = value.as_str().map(str::to_string);
                if prop == "preload" {
                    self.config.preload = s.clone();
                } else {
                    self.config.poster = s.clone();
                }
                Ok(s.map(PropertyValue::from))
            }
            _ => unreachable!("allow-listed property without a handler"),
        }
    }

    fn backend_set(&mut self, prop: &str, value: PropertyValue) -> Option<PropertyValue> {
        self.coordinator.backend_mut()?.set(prop, value)
    }

    /// Apply several properties with the fixed priority order:
    /// element-related keys first, `src` last
    pub fn set_many(
        &mut self,
        page: &mut Page,
        entries: Vec<(String, PropertyValue)>,
    ) -> Result<(), PlayerError> {
        for (prop, value) in properties::apply_order(entries) {
            self.set(page, &prop, value)?;
        }
        Ok(())
    }

    /// Flip a toggleable boolean property
    pub fn toggle(&mut self, page: &mut Page, prop: &str) -> Result<bool, PlayerError> {
        if !properties::is_toggleable(prop) {
            return Err(PlayerError::NotToggleable(prop.to_string()));
        }
        if prop == "paused" {
            let paused = self
                .get("paused")
                .and_then(|v| v.as_bool())
                .unwrap_or(true);
            if paused {
                self.play();
            } else {
                self.pause();
            }
            return Ok(!paused);
        }
        let current = self.get(prop).and_then(|v| v.as_bool()).unwrap_or(false);
        let next = !current;
        self.set(page, prop, next.into())?;
        Ok(next)
    }

    // Media commands

    pub fn play(&mut self) {
        match self.coordinator.backend_mut() {
            Some(b) => b.play(),
            None => tracing::debug!(player = %self.id, "play with no renderer"),
        }
        self.pump();
    }

    pub fn pause(&mut self) {
        if let Some(b) = self.coordinator.backend_mut() {
            b.pause();
        }
        self.pump();
    }

    pub fn stop(&mut self) {
        if let Some(b) = self.coordinator.backend_mut() {
            b.stop();
        }
        self.pump();
    }

    pub fn seek(&mut self, seconds: f64) {
        if let Some(b) = self.coordinator.backend_mut() {
            b.seek(seconds);
        }
        self.pump();
    }

    // Event surface

    /// Register a handler for space-separated event types
    pub fn on(
        &mut self,
        types: &str,
        handler: impl FnMut(&mut crate::PlayerEvent) + 'static,
    ) -> HandlerId {
        let id = self.hub.on(types, handler);
        for kind in types.split_whitespace() {
            self.coordinator.attach_event(kind);
        }
        id
    }

    /// Register a batch of type → handler pairs in one call
    pub fn on_each(
        &mut self,
        handlers: Vec<(&str, Box<dyn FnMut(&mut crate::PlayerEvent)>)>,
    ) -> Vec<HandlerId> {
        handlers
            .into_iter()
            .map(|(types, handler)| self.on(types, handler))
            .collect()
    }

    /// Remove one handler; backend wiring drops when the last handler
    /// for a type goes away
    pub fn off(&mut self, types: &str, id: HandlerId) {
        self.hub.off(types, id);
        for kind in types.split_whitespace() {
            if !self.hub.has(kind) {
                self.coordinator.detach_event(kind);
            }
        }
    }

    /// Dispatch an event to registered handlers
    pub fn trigger(&mut self, types: &str, value: Option<PropertyValue>) {
        for kind in types.split_whitespace() {
            self.hub.trigger(kind, value.clone());
        }
    }

    /// Drain backend notices: readiness completion and forwarded media
    /// events. Event re-attachment happens before the ready event is
    /// observed by any handler.
    pub fn pump(&mut self) {
        loop {
            let batch = self.notices.drain();
            if batch.is_empty() {
                break;
            }
            for notice in batch {
                match notice {
                    Notice::Ready {
                        generation, root, ..
                    } => {
                        if let Some(root) =
                            self.coordinator
                                .complete_ready(generation, root, &mut self.hub)
                        {
                            self.current_root = root;
                        }
                        if self.state() == PlayerState::Ready {
                            if let Some(seconds) = self.pending_seek.take() {
                                let _ = self.backend_set("current_time", seconds.into());
                            }
                        }
                    }
                    Notice::Media { event, value, .. } => {
                        self.hub.trigger(&event, value);
                    }
                }
            }
        }
    }

    /// Advance the virtual clock, driving script-availability retries
    pub fn tick(&mut self, page: &mut Page, advance_ms: u64) {
        if self.is_destroyed() {
            return;
        }
        self.clock_ms += advance_ms;
        self.coordinator.tick(page, self.clock_ms, &mut self.hub);
        self.pump();
    }

    /// Tear everything down: backend destroyed, displaced markup
    /// restored, private state cleared. Further calls are rejected.
    pub fn destroy(&mut self, page: &mut Page) {
        self.coordinator.destroy(page);
        self.hub.clear();
        self.private.clear();
        self.sources.clear();
        self.current_source = None;
        self.current_root = NodeId::NONE;
        self.pending_seek = None;
        tracing::info!(player = %self.id, "player destroyed");
    }
}


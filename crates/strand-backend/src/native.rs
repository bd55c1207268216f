//! Native media element backend
//!
//! Wraps an in-process media element model. Ready synchronously at
//! construction; property writes go straight to the element and the
//! element's resulting value is read back (a seek before metadata is
//! silently dropped, for example).

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use strand_mime::{TypeTable, Verdict};
use strand_page::{NodeId, Page};

use crate::{
    Backend, BackendConfig, BackendError, Environment, InstanceTable, Notice, NoticeQueue,
    PropertyValue, ReadyFn, RendererId, RendererKind, ReplaceOutcome,
};

/// Kind identity
pub const ID: RendererId = RendererId("native");

/// What a stock media element reports it can play
pub const TYPE_TABLE: TypeTable = TypeTable {
    entries: &[
        ("video/mp4", Verdict::Probably),
        ("video/webm", Verdict::Probably),
        ("video/ogg", Verdict::Maybe),
        ("video/quicktime", Verdict::Maybe),
        ("audio/mpeg", Verdict::Probably),
        ("audio/mp4", Verdict::Maybe),
        ("audio/ogg", Verdict::Maybe),
        ("audio/wav", Verdict::Probably),
        ("audio/aac", Verdict::Maybe),
    ],
};

thread_local! {
    static INSTANCES: InstanceTable<NativeInner> = InstanceTable::new();
}

/// True while an instance with this player id is registered
pub fn is_registered(player_id: &str) -> bool {
    INSTANCES.with(|t| t.lookup(player_id).is_some())
}

/// Deliver metadata to an instance (sets duration, fires durationchange)
pub fn notify_metadata(player_id: &str, duration: f64) -> bool {
    let Some(inner) = INSTANCES.with(|t| t.lookup(player_id)) else {
        return false;
    };
    let mut inner = inner.borrow_mut();
    inner.element.duration = Some(duration);
    inner.forward("durationchange", Some(duration.into()));
    true
}

/// Deliver a raw element event (test/native hook)
pub fn notify_media_event(player_id: &str, event: &str) -> bool {
    let Some(inner) = INSTANCES.with(|t| t.lookup(player_id)) else {
        return false;
    };
    let mut inner = inner.borrow_mut();
    if event == "ended" {
        inner.element.paused = true;
        inner.element.ended = true;
    }
    inner.forward(event, None);
    true
}

/// In-process media element model
#[derive(Debug)]
pub struct MediaElement {
    pub src: String,
    pub current_time: f64,
    /// Unknown until metadata arrives
    pub duration: Option<f64>,
    pub paused: bool,
    pub ended: bool,
    pub volume: f64,
    pub muted: bool,
}

impl MediaElement {
    fn new(config: &BackendConfig) -> Self {
        Self {
            src: config.src.clone(),
            current_time: 0.0,
            duration: None,
            paused: true,
            ended: false,
            volume: config.volume.clamp(0.0, 1.0),
            muted: config.muted,
        }
    }

    fn play(&mut self) {
        self.paused = false;
        self.ended = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    /// Seeking before metadata is rejected by the element; the caller
    /// sees the unchanged time via readback
    fn seek(&mut self, time: f64) {
        match self.duration {
            Some(d) => self.current_time = time.clamp(0.0, d),
            None => tracing::debug!(time, "seek before metadata ignored"),
        }
    }

    fn set_src(&mut self, src: &str) {
        self.src = src.to_string();
        self.current_time = 0.0;
        self.duration = None;
        self.paused = true;
        self.ended = false;
    }
}

struct NativeInner {
    config: BackendConfig,
    notices: NoticeQueue,
    element: MediaElement,
    root: NodeId,
    displaced: NodeId,
    bound: HashSet<String>,
    destroyed: bool,
}

impl NativeInner {
    fn forward(&mut self, event: &str, value: Option<PropertyValue>) {
        if self.bound.contains(event) {
            self.notices.push(Notice::Media {
                player_id: self.config.id.clone(),
                event: event.to_string(),
                value,
            });
        }
    }
}

/// Native media kind descriptor
pub struct NativeKind;

impl NativeKind {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeKind {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererKind for NativeKind {
    fn id(&self) -> RendererId {
        ID
    }

    fn type_table(&self) -> TypeTable {
        TYPE_TABLE
    }

    fn probe(&self, env: &Environment) -> bool {
        env.native_media
    }

    fn build(&self, config: BackendConfig, notices: NoticeQueue) -> Box<dyn Backend> {
        Box::new(NativeBackend::new(config, notices))
    }
}

/// Live native backend
pub struct NativeBackend {
    inner: Rc<RefCell<NativeInner>>,
}

impl NativeBackend {
    pub fn new(config: BackendConfig, notices: NoticeQueue) -> Self {
        let element = MediaElement::new(&config);
        let inner = Rc::new(RefCell::new(NativeInner {
            config,
            notices,
            element,
            root: NodeId::NONE,
            displaced: NodeId::NONE,
            bound: HashSet::new(),
            destroyed: false,
        }));
        INSTANCES.with(|t| t.insert(&inner.borrow().config.id, &inner));
        Self { inner }
    }
}

impl Backend for NativeBackend {
    fn kind_id(&self) -> RendererId {
        ID
    }

    fn config(&self) -> BackendConfig {
        self.inner.borrow().config.clone()
    }

    fn is_ready(&self) -> bool {
        // Element backends are ready the moment they exist
        !self.inner.borrow().destroyed
    }

    fn on_ready(&mut self, callback: ReadyFn) {
        let root = self.inner.borrow().root;
        callback(root);
    }

    fn get(&self, prop: &str) -> Option<PropertyValue> {
        let inner = self.inner.borrow();
        let e = &inner.element;
        match prop {
            "src" => Some(e.src.as_str().into()),
            "paused" => Some(e.paused.into()),
            "ended" => Some(e.ended.into()),
            "current_time" => Some(e.current_time.into()),
            "duration" => e.duration.map(PropertyValue::from),
            "volume" => Some(e.volume.into()),
            "muted" => Some(e.muted.into()),
            "width" => Some(inner.config.width.into()),
            "height" => Some(inner.config.height.into()),
            _ => None,
        }
    }

    fn set(&mut self, prop: &str, value: PropertyValue) -> Option<PropertyValue> {
        let mut inner = self.inner.borrow_mut();
        match prop {
            "src" => {
                let src = value.as_str()?.to_string();
                inner.element.set_src(&src);
                inner.config.src = src.clone();
                Some(src.into())
            }
            "volume" => {
                let v = value.as_f64()?.clamp(0.0, 1.0);
                inner.element.volume = v;
                inner.forward("volumechange", Some(v.into()));
                Some(v.into())
            }
            "muted" => {
                let m = value.as_bool()?;
                inner.element.muted = m;
                inner.forward("volumechange", Some(m.into()));
                Some(m.into())
            }
            "current_time" => {
                inner.element.seek(value.as_f64()?);
                Some(inner.element.current_time.into())
            }
            "width" => {
                inner.config.width = value.as_f64()? as u32;
                Some(inner.config.width.into())
            }
            "height" => {
                inner.config.height = value.as_f64()? as u32;
                Some(inner.config.height.into())
            }
            _ => None,
        }
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
        let Some(anchor) = anchor else {
            // Markup-less operation: the element lives purely in memory
            return Ok(ReplaceOutcome::Mounted(NodeId::NONE));
        };

        let root = page.create_element("video");
        {
            let elem = page.element_mut(root)?;
            elem.set_attr("id", &inner.config.id);
            elem.set_attr("src", &inner.config.src);
            elem.set_attr("width", &inner.config.width.to_string());
            elem.set_attr("height", &inner.config.height.to_string());
            if inner.config.autoplay {
                elem.set_attr("autoplay", "");
            }
            if inner.config.looping {
                elem.set_attr("loop", "");
            }
            if inner.config.muted {
                elem.set_attr("muted", "");
            }
            if inner.config.controls {
                elem.set_attr("controls", "");
            }
            if let Some(preload) = &inner.config.preload {
                elem.set_attr("preload", preload);
            }
            if let Some(poster) = &inner.config.poster {
                elem.set_attr("poster", poster);
            }
        }
        inner.displaced = page.replace_node(anchor, root)?;
        inner.root = root;
        tracing::debug!(id = %inner.config.id, "native markup mounted");
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
        inner.root = NodeId::NONE;
        inner.displaced = NodeId::NONE;
        inner.bound.clear();
        inner.destroyed = true;
        tracing::debug!(id = %inner.config.id, "native backend destroyed");
    }

    fn bind(&mut self, event: &str) {
        self.inner.borrow_mut().bound.insert(event.to_string());
    }

    fn unbind(&mut self, event: &str) {
        self.inner.borrow_mut().bound.remove(event);
    }

    fn play(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.element.play();
        inner.forward("play", None);
    }

    fn pause(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.element.pause();
        inner.forward("pause", None);
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.element.pause();
        inner.element.current_time = 0.0;
        inner.forward("pause", None);
    }

    fn seek(&mut self, seconds: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.element.seek(seconds);
        let at = inner.element.current_time;
        inner.forward("timeupdate", Some(at.into()));
    }
}

//! Third-party embed backend
//!
//! Plays provider-hosted media through an embedded iframe and the
//! provider's SDK. Playability is decided by URL pattern, not by file
//! extension, so `can_play` overrides the table-driven default. The
//! SDK speaks percent volume, millisecond positions, and only has a
//! mute *toggle*; unmute is emulated with a guarded toggle.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use strand_mime::{MimeType, TypeTable, Verdict};
use strand_page::{NodeId, Page};
use url::Url;

use crate::{
    Backend, BackendConfig, BackendError, Environment, InstanceTable, Notice, NoticeQueue,
    PropertyValue, ReadyFn, RendererId, RendererKind, ReplaceOutcome, ScriptState,
    SharedEnvironment,
};

/// Kind identity
pub const ID: RendererId = RendererId("embed");

/// Hosts this adapter can embed
pub const PROVIDERS: &[&str] = &["youtube.com", "youtu.be", "dailymotion.com"];

pub const TYPE_TABLE: TypeTable = TypeTable {
    entries: &[
        ("video/youtube", Verdict::Probably),
        ("video/dailymotion", Verdict::Probably),
    ],
};

thread_local! {
    static INSTANCES: InstanceTable<EmbedInner> = InstanceTable::new();
}

/// True while an instance with this player id is registered
pub fn is_registered(player_id: &str) -> bool {
    INSTANCES.with(|t| t.lookup(player_id).is_some())
}

/// SDK readiness callback, delivered by id from global scope
pub fn notify_sdk_ready(player_id: &str) -> bool {
    let Some(inner) = INSTANCES.with(|t| t.lookup(player_id)) else {
        return false;
    };
    let (callbacks, root) = {
        let mut inner = inner.borrow_mut();
        if inner.destroyed || inner.ready || !inner.root.is_valid() {
            return false;
        }
        inner.sdk = Some(EmbedSdk::from_config(&inner.config));
        inner.ready = true;
        let pending = std::mem::take(&mut inner.pending);
        for (prop, value) in pending {
            inner.apply(&prop, value);
        }
        tracing::debug!(id = %inner.config.id, "embed sdk ready");
        (std::mem::take(&mut inner.callbacks), inner.root)
    };
    for callback in callbacks {
        callback(root);
    }
    true
}

/// Deliver an SDK state-change (test/SDK hook)
pub fn notify_state_change(player_id: &str, event: &str) -> bool {
    let Some(inner) = INSTANCES.with(|t| t.lookup(player_id)) else {
        return false;
    };
    let mut inner = inner.borrow_mut();
    if event == "ended" {
        if let Some(sdk) = inner.sdk.as_mut() {
            sdk.playing = false;
        }
    }
    inner.forward(event, None);
    true
}

/// True when the locator points at a supported provider
fn provider_match(locator: &str) -> bool {
    let Ok(url) = Url::parse(locator) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    PROVIDERS
        .iter()
        .any(|p| host == *p || host.ends_with(&format!(".{p}")))
}

/// The provider SDK surface
#[derive(Debug)]
struct EmbedSdk {
    volume_pct: u32,
    position_ms: u64,
    playing: bool,
    muted: bool,
}

impl EmbedSdk {
    fn from_config(config: &BackendConfig) -> Self {
        Self {
            volume_pct: (config.volume.clamp(0.0, 1.0) * 100.0).round() as u32,
            position_ms: 0,
            playing: false,
            muted: config.muted,
        }
    }

    /// The SDK only exposes a toggle, never set-muted
    fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }
}

struct EmbedInner {
    config: BackendConfig,
    notices: NoticeQueue,
    env: SharedEnvironment,
    sdk: Option<EmbedSdk>,
    pending: Vec<(String, PropertyValue)>,
    callbacks: Vec<ReadyFn>,
    ready: bool,
    root: NodeId,
    displaced: NodeId,
    bound: HashSet<String>,
    destroyed: bool,
}

impl EmbedInner {
    fn forward(&mut self, event: &str, value: Option<PropertyValue>) {
        if self.bound.contains(event) {
            self.notices.push(Notice::Media {
                player_id: self.config.id.clone(),
                event: event.to_string(),
                value,
            });
        }
    }

    fn apply(&mut self, prop: &str, value: PropertyValue) -> Option<PropertyValue> {
        let sdk = self.sdk.as_mut()?;
        match prop {
            "src" => {
                let src = value.as_str()?.to_string();
                sdk.position_ms = 0;
                sdk.playing = false;
                self.config.src = src.clone();
                Some(src.into())
            }
            "volume" => {
                let pct = (value.as_f64()?.clamp(0.0, 1.0) * 100.0).round() as u32;
                sdk.volume_pct = pct;
                let back = pct as f64 / 100.0;
                self.forward("volumechange", Some(back.into()));
                Some(back.into())
            }
            "muted" => {
                // Guarded toggle: only flip when the state differs
                let want = value.as_bool()?;
                if sdk.muted != want {
                    sdk.toggle_mute();
                }
                Some(sdk.muted.into())
            }
            "current_time" => {
                sdk.position_ms = (value.as_f64()?.max(0.0) * 1000.0) as u64;
                Some((sdk.position_ms as f64 / 1000.0).into())
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

/// Embed kind descriptor
pub struct EmbedKind {
    env: SharedEnvironment,
}

impl EmbedKind {
    pub fn new(env: SharedEnvironment) -> Self {
        Self { env }
    }
}

impl RendererKind for EmbedKind {
    fn id(&self) -> RendererId {
        ID
    }

    fn type_table(&self) -> TypeTable {
        TYPE_TABLE
    }

    /// URL-pattern playability; explicit provider types still go
    /// through the table
    fn can_play(&self, locator: &str, mime: Option<&MimeType>) -> Verdict {
        if let Some(m) = mime {
            return self.can_play_type(m);
        }
        if provider_match(locator) {
            return Verdict::Probably;
        }
        Verdict::Empty
    }

    fn probe(&self, env: &Environment) -> bool {
        env.embed_api
    }

    fn build(&self, config: BackendConfig, notices: NoticeQueue) -> Box<dyn Backend> {
        Box::new(EmbedBackend::new(config, notices, self.env.clone()))
    }
}

/// Live embed backend
pub struct EmbedBackend {
    inner: Rc<RefCell<EmbedInner>>,
}

impl EmbedBackend {
    pub fn new(config: BackendConfig, notices: NoticeQueue, env: SharedEnvironment) -> Self {
        let inner = Rc::new(RefCell::new(EmbedInner {
            config,
            notices,
            env,
            sdk: None,
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

impl Backend for EmbedBackend {
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
        let sdk = inner.sdk.as_ref()?;
        match prop {
            "src" => Some(inner.config.src.as_str().into()),
            "paused" => Some((!sdk.playing).into()),
            "volume" => Some((sdk.volume_pct as f64 / 100.0).into()),
            "muted" => Some(sdk.muted.into()),
            "current_time" => Some((sdk.position_ms as f64 / 1000.0).into()),
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
        if inner.env.borrow().embed_script != ScriptState::Loaded {
            return Ok(ReplaceOutcome::WaitingForScript);
        }
        let Some(anchor) = anchor else {
            return Ok(ReplaceOutcome::Mounted(NodeId::NONE));
        };

        let root = page.create_element("iframe");
        {
            let elem = page.element_mut(root)?;
            elem.set_attr("id", &inner.config.id);
            elem.set_attr("src", &inner.config.src);
            elem.set_attr("width", &inner.config.width.to_string());
            elem.set_attr("height", &inner.config.height.to_string());
            elem.set_attr("allow", "autoplay; fullscreen");
        }
        inner.displaced = page.replace_node(anchor, root)?;
        inner.root = root;
        tracing::debug!(id = %inner.config.id, "embed markup mounted");
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
        inner.sdk = None;
        inner.callbacks.clear();
        inner.pending.clear();
        inner.bound.clear();
        inner.root = NodeId::NONE;
        inner.displaced = NodeId::NONE;
        inner.destroyed = true;
        tracing::debug!(id = %inner.config.id, "embed backend destroyed");
    }

    fn bind(&mut self, event: &str) {
        self.inner.borrow_mut().bound.insert(event.to_string());
    }

    fn unbind(&mut self, event: &str) {
        self.inner.borrow_mut().bound.remove(event);
    }

    fn play(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(sdk) = inner.sdk.as_mut() {
            sdk.playing = true;
            inner.forward("play", None);
        }
    }

    fn pause(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(sdk) = inner.sdk.as_mut() {
            sdk.playing = false;
            inner.forward("pause", None);
        }
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(sdk) = inner.sdk.as_mut() {
            sdk.playing = false;
            sdk.position_ms = 0;
            inner.forward("pause", None);
        }
    }

    fn seek(&mut self, seconds: f64) {
        let mut inner = self.inner.borrow_mut();
        if let Some(sdk) = inner.sdk.as_mut() {
            sdk.position_ms = (seconds.max(0.0) * 1000.0) as u64;
            let at = sdk.position_ms as f64 / 1000.0;
            inner.forward("timeupdate", Some(at.into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Environment;

    fn full_env() -> SharedEnvironment {
        Rc::new(RefCell::new(Environment::full()))
    }

    fn ready_backend(id: &str) -> (EmbedBackend, Page) {
        let mut page = Page::new();
        let anchor = page.create_element("div");
        page.append_child(NodeId::ROOT, anchor);
        let config = BackendConfig {
            id: id.into(),
            src: "https://www.youtube.com/watch?v=abc123".into(),
            ..Default::default()
        };
        let mut b = EmbedBackend::new(config, NoticeQueue::new(), full_env());
        b.replace(&mut page, Some(anchor)).unwrap();
        assert!(notify_sdk_ready(id));
        (b, page)
    }

    #[test]
    fn test_provider_url_matching() {
        let kind = EmbedKind::new(full_env());
        assert_eq!(
            kind.can_play("https://www.youtube.com/watch?v=abc", None),
            Verdict::Probably
        );
        assert_eq!(
            kind.can_play("https://youtu.be/abc", None),
            Verdict::Probably
        );
        assert_eq!(
            kind.can_play("https://www.dailymotion.com/video/x1", None),
            Verdict::Probably
        );
        assert_eq!(kind.can_play("https://vimeo.com/123", None), Verdict::Empty);
        assert_eq!(kind.can_play("clip.mp4", None), Verdict::Empty);
        // Host must match a provider, not merely contain one
        assert_eq!(
            kind.can_play("https://notyoutube.com.evil.example/x", None),
            Verdict::Empty
        );
    }

    #[test]
    fn test_explicit_provider_type_uses_table() {
        let kind = EmbedKind::new(full_env());
        let yt = MimeType::parse("video/youtube").unwrap();
        assert_eq!(kind.can_play("anything", Some(&yt)), Verdict::Probably);
        let mp4 = MimeType::parse("video/mp4").unwrap();
        assert_eq!(kind.can_play("anything", Some(&mp4)), Verdict::Empty);
    }

    #[test]
    fn test_volume_percent_round_trip() {
        let (mut b, _page) = ready_backend("e1");
        let back = b.set("volume", 0.4.into()).unwrap();
        assert_eq!(back, PropertyValue::Number(0.4));
        assert_eq!(b.get("volume"), Some(PropertyValue::Number(0.4)));
    }

    #[test]
    fn test_guarded_mute_toggle() {
        let (mut b, _page) = ready_backend("e2");
        assert_eq!(b.get("muted"), Some(PropertyValue::Bool(false)));

        // Unmute while already unmuted must not toggle into muted
        assert_eq!(b.set("muted", false.into()), Some(PropertyValue::Bool(false)));
        assert_eq!(b.set("muted", true.into()), Some(PropertyValue::Bool(true)));
        assert_eq!(b.set("muted", true.into()), Some(PropertyValue::Bool(true)));
        assert_eq!(b.set("muted", false.into()), Some(PropertyValue::Bool(false)));
    }

    #[test]
    fn test_position_in_milliseconds() {
        let (mut b, _page) = ready_backend("e3");
        let back = b.set("current_time", 12.345.into()).unwrap();
        assert_eq!(back, PropertyValue::Number(12.345));
    }

    #[test]
    fn test_mounts_iframe() {
        let mut page = Page::new();
        let anchor = page.create_element("div");
        page.append_child(NodeId::ROOT, anchor);
        let config = BackendConfig {
            id: "e4".into(),
            src: "https://youtu.be/abc".into(),
            ..Default::default()
        };
        let mut b = EmbedBackend::new(config, NoticeQueue::new(), full_env());
        let ReplaceOutcome::Mounted(root) = b.replace(&mut page, Some(anchor)).unwrap() else {
            panic!("script is loaded, mount expected");
        };
        assert_eq!(page.tag(root), Some("iframe"));
    }
}

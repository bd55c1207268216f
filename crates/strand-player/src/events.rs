//! Event surface
//!
//! Normalized events with DOM-shaped control methods, dispatched from
//! an id-keyed handler cache owned by the player (a side table, never
//! state stamped onto foreign objects). Handlers are addressed by the
//! `HandlerId` returned from `on`; closures have no usable identity of
//! their own.

use std::collections::HashMap;
use std::rc::Rc;
use std::cell::RefCell;

use strand_backend::PropertyValue;

/// Well-known event type names
pub mod kinds {
    /// A renderer switch is about to happen
    pub const RENDERER_CHANGING: &str = "rendererchanging";
    /// The bound renderer finished its readiness handshake
    pub const RENDERER_READY: &str = "rendererready";
    /// No (source, renderer) pair could be selected
    pub const NO_RENDERER: &str = "norenderer";
    /// A valid renderer was requested but is unsupported here
    pub const RENDERER_UNSUPPORTED: &str = "rendererunsupported";
    /// A backend script never became available
    pub const SCRIPT_TIMEOUT: &str = "scripttimeout";

    pub const PLAY: &str = "play";
    pub const PAUSE: &str = "pause";
    pub const ENDED: &str = "ended";
    pub const TIMEUPDATE: &str = "timeupdate";
    pub const VOLUMECHANGE: &str = "volumechange";
    pub const DURATIONCHANGE: &str = "durationchange";
}

/// Normalized event handed to handlers
#[derive(Debug)]
pub struct PlayerEvent {
    pub kind: String,
    pub value: Option<PropertyValue>,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
}

impl PlayerEvent {
    pub fn new(kind: &str, value: Option<PropertyValue>) -> Self {
        Self {
            kind: kind.to_string(),
            value,
            default_prevented: false,
            propagation_stopped: false,
            immediate_stopped: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped
    }
}

/// Token identifying a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<RefCell<dyn FnMut(&mut PlayerEvent)>>;

/// Per-player handler cache keyed by event type
#[derive(Default)]
pub struct EventHub {
    handlers: HashMap<String, Vec<(HandlerId, Handler)>>,
    next_id: u64,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one or more space-separated event types
    pub fn on(
        &mut self,
        types: &str,
        handler: impl FnMut(&mut PlayerEvent) + 'static,
    ) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        let shared: Handler = Rc::new(RefCell::new(handler));
        for kind in types.split_whitespace() {
            self.handlers
                .entry(kind.to_string())
                .or_default()
                .push((id, shared.clone()));
        }
        id
    }

    /// Remove one handler from the given event types
    pub fn off(&mut self, types: &str, id: HandlerId) {
        for kind in types.split_whitespace() {
            if let Some(list) = self.handlers.get_mut(kind) {
                list.retain(|(hid, _)| *hid != id);
                if list.is_empty() {
                    self.handlers.remove(kind);
                }
            }
        }
    }

    /// Remove every handler for the given event types
    pub fn off_all(&mut self, types: &str) {
        for kind in types.split_whitespace() {
            self.handlers.remove(kind);
        }
    }

    /// Dispatch to handlers in registration order
    pub fn trigger(&mut self, kind: &str, value: Option<PropertyValue>) -> PlayerEvent {
        let mut event = PlayerEvent::new(kind, value);
        let list: Vec<Handler> = self
            .handlers
            .get(kind)
            .map(|l| l.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        for handler in list {
            (handler.borrow_mut())(&mut event);
            if event.is_immediate_propagation_stopped() {
                break;
            }
        }
        event
    }

    /// Event types with at least one handler, for re-attachment
    pub fn event_types(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn has(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

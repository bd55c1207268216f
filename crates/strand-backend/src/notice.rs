//! Notices
//!
//! Backends never call into the facade directly; they push notices
//! into a shared queue the owning player drains on its next pump.
//! Readiness bookkeeping (element capture, event re-attachment) runs
//! in the drain step strictly before the ready notification reaches
//! any handler.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use strand_page::NodeId;

use crate::{PropertyValue, RendererId};

/// A backend-originated notification
#[derive(Debug, Clone)]
pub enum Notice {
    /// The backend completed its readiness handshake
    Ready {
        player_id: String,
        kind: RendererId,
        /// Switch generation that produced the backend; the owner uses
        /// it to tell a live readiness apart from a torn-down one
        generation: u64,
        root: NodeId,
    },
    /// A bound native event fired
    Media {
        player_id: String,
        event: String,
        value: Option<PropertyValue>,
    },
}

/// Shared single-threaded notice queue
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    inner: Rc<RefCell<VecDeque<Notice>>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        self.inner.borrow_mut().push_back(notice);
    }

    /// Take everything queued so far, in arrival order
    pub fn drain(&self) -> Vec<Notice> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

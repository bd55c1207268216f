//! Strand
//!
//! A browser media playback abstraction layer: one player facade over
//! interchangeable renderer backends (native element, plugin, embedded
//! provider SDK), with capability-based selection across an ordered
//! source list.
//!
//! # Example
//! ```rust
//! use strand::{Environment, Page, PlayerRegistry};
//! use std::{cell::RefCell, rc::Rc};
//!
//! let mut page = Page::new();
//! let env = Rc::new(RefCell::new(Environment::full()));
//! let mut players = PlayerRegistry::new(env);
//!
//! let player = players.acquire(&mut page, "intro").unwrap();
//! player.borrow_mut().load(&mut page, "clip.mp4");
//! player.borrow_mut().play();
//! ```

pub use strand_backend::{
    Backend, BackendConfig, BackendError, Environment, Notice, NoticeQueue, PropertyValue,
    RendererId, RendererKind, RendererRegistry, ScriptState, SharedEnvironment, BUILTIN_RENDERERS,
};
pub use strand_mime::{can_play, can_play_type, guess_type, MediaKind, MimeType, Verdict};
pub use strand_page::{NodeId, Page, PageError};
pub use strand_player::{
    kinds, EventHub, HandlerId, Player, PlayerError, PlayerEvent, PlayerOptions, PlayerRegistry,
    PlayerState, PlayerTarget, Selection, SourceSpec,
};

// Re-export sub-crates for advanced usage
pub use strand_backend as backend;
pub use strand_mime as mime;
pub use strand_page as page;
pub use strand_player as player;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

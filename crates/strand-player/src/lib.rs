//! Strand Player - Media player facade
//!
//! Ties the capability registry, source resolution, and the backend
//! contract together behind one object: resolve sources, pick a
//! renderer, bind it, and expose uniform property access, media
//! commands, and a normalized event surface. A host-owned registry
//! tracks live instances by id.

mod events;
mod player;
mod properties;
mod registry;
mod source;
mod switch;

pub use events::{kinds, EventHub, HandlerId, PlayerEvent};
pub use player::Player;
pub use properties::{GETTABLE, SETTABLE, TOGGLEABLE};
pub use registry::{PlayerOptions, PlayerRegistry, PlayerTarget};
pub use source::{resolve, Source, SourceSpec};
pub use switch::{PlayerState, Selection, SCRIPT_RETRY_LIMIT, SCRIPT_RETRY_MS};

/// Player errors
///
/// Sync `Err` returns mark caller bugs; expected unavailability (no
/// renderer, missing script) is reported through events instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlayerError {
    #[error("unknown renderer: {0}")]
    UnknownRenderer(String),

    #[error("player already destroyed")]
    Destroyed,

    #[error("no element with id: {0}")]
    NoSuchElement(String),

    #[error("invalid value for property: {0}")]
    InvalidValue(String),

    #[error("property is not toggleable: {0}")]
    NotToggleable(String),

    #[error("page error: {0}")]
    Page(#[from] strand_page::PageError),
}

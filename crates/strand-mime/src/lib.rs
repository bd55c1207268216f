//! Strand MIME - Capability Registry
//!
//! Translates file extensions and MIME types into playability verdicts.
//! Every renderer kind carries a static type table; the functions here
//! answer "can this renderer play this locator" without touching any
//! backend.

mod types;
mod registry;

pub use types::{MediaKind, MimeType, MimeTypeError, Verdict};
pub use registry::{can_play, can_play_type, guess_type, TypeTable};

//! Property allow-lists
//!
//! Fixed name sets per accessor mode; anything outside them lands in
//! private instance state. Bulk assignment has a fixed priority:
//! element-related keys first, `src` last, because source assignment
//! decides backend identity and must see every other key already
//! applied.

use strand_backend::PropertyValue;

/// Properties `get` resolves through the backend or pending config
pub const GETTABLE: &[&str] = &[
    "src",
    "volume",
    "muted",
    "paused",
    "ended",
    "duration",
    "current_time",
    "width",
    "height",
    "autoplay",
    "loop",
    "controls",
    "preload",
    "poster",
];

/// Properties `set` is allowed to touch
pub const SETTABLE: &[&str] = &[
    "element",
    "src",
    "volume",
    "muted",
    "current_time",
    "width",
    "height",
    "autoplay",
    "loop",
    "controls",
    "preload",
    "poster",
];

/// Boolean properties `toggle` may flip
pub const TOGGLEABLE: &[&str] = &["muted", "paused", "loop", "controls"];

pub fn is_gettable(name: &str) -> bool {
    GETTABLE.contains(&name)
}

pub fn is_settable(name: &str) -> bool {
    SETTABLE.contains(&name)
}

pub fn is_toggleable(name: &str) -> bool {
    TOGGLEABLE.contains(&name)
}

/// Order bulk-set entries: element keys first, `src` last, everything
/// else in supplied order
pub fn apply_order(entries: Vec<(String, PropertyValue)>) -> Vec<(String, PropertyValue)> {
    let mut first = Vec::new();
    let mut middle = Vec::new();
    let mut last = Vec::new();
    for entry in entries {
        match entry.0.as_str() {
            "element" => first.push(entry),
            "src" => last.push(entry),
            _ => middle.push(entry),
        }
    }
    first.extend(middle);
    first.extend(last);
    first
}

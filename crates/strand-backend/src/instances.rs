//! Per-backend-kind instance tables
//!
//! External SDKs deliver callbacks by player id into global scope, so
//! each backend kind keeps an explicit id-keyed table of its live
//! instances. Entries hold weak references; a destroyed or dropped
//! instance stops resolving without any unregistration race.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Explicit insert/remove/lookup registry keyed by player id
#[derive(Debug)]
pub struct InstanceTable<T> {
    entries: RefCell<HashMap<String, Weak<RefCell<T>>>>,
}

impl<T> InstanceTable<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Register an instance under its player id (last writer wins)
    pub fn insert(&self, id: &str, instance: &Rc<RefCell<T>>) {
        self.entries
            .borrow_mut()
            .insert(id.to_string(), Rc::downgrade(instance));
    }

    /// Deregister an id; absent ids are a no-op
    pub fn remove(&self, id: &str) {
        self.entries.borrow_mut().remove(id);
    }

    /// Resolve an id to a live instance
    pub fn lookup(&self, id: &str) -> Option<Rc<RefCell<T>>> {
        self.entries.borrow().get(id).and_then(Weak::upgrade)
    }

    /// Number of registered ids (dead entries included until removed)
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<T> Default for InstanceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

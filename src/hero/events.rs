//! Host event plumbing with scoped listener registration.
//!
//! Listeners are RAII guards: attaching returns a [`Listener`], dropping it detaches.
//! Everything is single-threaded; the hub lives on the UI thread.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use crate::foundation::core::Viewport;

/// Host signal categories a component can listen for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Window scroll position changed.
    Scroll,
    /// Viewport size or device pixel ratio changed.
    Resize,
    /// Display refresh tick; only wanted while an animation is settling.
    AnimationFrame,
}

/// A host signal delivered to a component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    /// Vertical document scroll offset in CSS pixels.
    Scroll {
        /// Offset from the document top.
        scroll_y: f64,
    },
    /// New viewport description.
    Resize(Viewport),
    /// Time elapsed since the previous animation frame.
    AnimationFrame {
        /// Seconds since the last tick.
        dt_secs: f64,
    },
}

impl HostEvent {
    /// Category of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Resize(_) => EventKind::Resize,
            Self::AnimationFrame { .. } => EventKind::AnimationFrame,
        }
    }
}

type Registry = RefCell<BTreeMap<u64, EventKind>>;

/// Registry of attached listeners.
///
/// The host consults it to decide which native notifications to keep subscribed
/// (for example, requesting animation frames only while someone listens).
#[derive(Clone, Debug, Default)]
pub struct EventHub {
    registry: Rc<Registry>,
    next_id: Rc<Cell<u64>>,
}

impl EventHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener for `kind`. It stays attached until the guard is dropped.
    pub fn listen(&self, kind: EventKind) -> Listener {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.registry.borrow_mut().insert(id, kind);
        Listener {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Whether at least one listener for `kind` is attached.
    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.registry.borrow().values().any(|k| *k == kind)
    }

    /// Total number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().len()
    }
}

/// Attached listener; detaches on drop.
#[derive(Debug)]
pub struct Listener {
    id: u64,
    kind: EventKind,
    registry: Weak<Registry>,
}

impl Listener {
    /// Category this listener receives.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.id);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/hero/events.rs"]
mod tests;

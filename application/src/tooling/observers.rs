//! Observer fan-out shared by the registry and the orchestrator.

use crate::ports::tool_observer::ToolObserver;
use crate::sync::{read, write};
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn ToolObserver>>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn ToolObserver>) {
        write(&self.observers).push(observer);
    }

    /// Remove a previously subscribed observer (matched by identity)
    pub fn unsubscribe(&self, observer: &Arc<dyn ToolObserver>) -> bool {
        let mut observers = write(&self.observers);
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        read(&self.observers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `f` for every observer. The list is snapshotted first, so
    /// observers may subscribe or unsubscribe from inside a callback.
    pub fn notify(&self, f: impl Fn(&dyn ToolObserver)) {
        let snapshot: Vec<Arc<dyn ToolObserver>> = read(&self.observers).clone();
        for observer in &snapshot {
            f(observer.as_ref());
        }
    }
}

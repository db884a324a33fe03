/// MenuVisibilityStore: whether the escape menu overlay is open.
///
/// Never persisted; every process starts closed. Subscribers hear about
/// real transitions only.

use crate::store::observer::{SubscriptionId, Subscribers};

pub struct MenuVisibilityStore {
    is_open: bool,
    subscribers: Subscribers<bool>,
}

impl MenuVisibilityStore {
    pub fn new() -> Self {
        MenuVisibilityStore { is_open: false, subscribers: Subscribers::new() }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        self.set(true);
    }

    pub fn close(&mut self) {
        self.set(false);
    }

    #[allow(dead_code)]
    pub fn toggle(&mut self) {
        self.set(!self.is_open);
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn set(&mut self, open: bool) {
        if self.is_open != open {
            self.is_open = open;
            self.subscribers.notify(&open);
        }
    }
}

impl Default for MenuVisibilityStore {
    fn default() -> Self {
        Self::new()
    }
}

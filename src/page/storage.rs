//! `localStorage`-backed [`KeyValueStore`].

use web_sys::{Storage, window};

use crate::selector::KeyValueStore;

pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    /// `None` when storage is disabled (private mode, sandboxed iframe, no window).
    pub fn from_window() -> Option<Self> {
        let storage = window()?.local_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.storage.set_item(key, value).is_err() {
            log::warn!("could not persist {key}");
        }
    }
}

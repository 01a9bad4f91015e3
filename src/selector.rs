//! Image selection: which bean to show on this page load.
//!
//! One load in [`SPECIAL_ODDS`] (and every load that brings the counter to
//! [`SPECIAL_LOAD_COUNT`]) shows the special image. Otherwise a regular image is
//! drawn uniformly, never repeating the one shown last time.

use std::collections::HashMap;

use rand::Rng;

use crate::assets::AssetManifest;
use crate::config::{MAX_REDRAWS, SPECIAL_LOAD_COUNT, SPECIAL_ODDS, SPECIAL_SENTINEL};
use crate::error::{Error, Result};

pub const LAST_SHOWN_KEY: &str = "lastBean";
pub const LOAD_COUNT_KEY: &str = "loadCount";

/// String key-value persistence (`localStorage` in the browser).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, used when `localStorage` is unavailable and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// The outcome of a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef {
    Regular { index: usize, url: String },
    Special { url: String },
}

impl ImageRef {
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Regular { url, .. } | ImageRef::Special { url } => url,
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self, ImageRef::Special { .. })
    }
}

/// Persisted selection bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub last_shown: Option<String>,
    pub load_count: u32,
}

impl SelectionState {
    /// Read state from the store; a missing or malformed counter reads as 0.
    pub fn load(store: &impl KeyValueStore) -> Self {
        let last_shown = store.get(LAST_SHOWN_KEY).filter(|s| !s.is_empty());
        let load_count = store
            .get(LOAD_COUNT_KEY)
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0);
        Self {
            last_shown,
            load_count,
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        store.set(LOAD_COUNT_KEY, &self.load_count.to_string());
        if let Some(last) = &self.last_shown {
            store.set(LAST_SHOWN_KEY, last);
        }
    }

    /// Count this page load.
    pub fn record_load(&mut self) {
        self.load_count = self.load_count.saturating_add(1);
    }
}

#[derive(Clone, Debug)]
pub struct ImageSelector {
    regular: Vec<String>,
    special: String,
}

impl ImageSelector {
    /// Fails with [`Error::EmptyAssetList`] when `regular` is empty.
    pub fn new(regular: Vec<String>, special: String) -> Result<Self> {
        if regular.is_empty() {
            return Err(Error::EmptyAssetList);
        }
        Ok(Self { regular, special })
    }

    pub fn from_manifest(manifest: &AssetManifest) -> Result<Self> {
        Self::new(manifest.regular_urls(), manifest.special_url())
    }

    pub fn regular(&self) -> &[String] {
        &self.regular
    }

    /// Pick an image and update `state` (last shown, counter reset on special).
    pub fn select<R: Rng + ?Sized>(&self, state: &mut SelectionState, rng: &mut R) -> ImageRef {
        let lucky = rng.gen_range(0..SPECIAL_ODDS) == SPECIAL_SENTINEL;
        if lucky || state.load_count == SPECIAL_LOAD_COUNT {
            log::info!("You found the special bean!");
            state.load_count = 0;
            state.last_shown = Some(self.special.clone());
            return ImageRef::Special {
                url: self.special.clone(),
            };
        }

        let index = self.pick_regular(state.last_shown.as_deref(), rng);
        let url = self.regular[index].clone();
        state.last_shown = Some(url.clone());
        ImageRef::Regular { index, url }
    }

    /// Full page-load bookkeeping: count the load, pick an image, persist state.
    pub fn select_for_load<R: Rng + ?Sized>(
        &self,
        store: &mut impl KeyValueStore,
        rng: &mut R,
    ) -> ImageRef {
        let mut state = SelectionState::load(store);
        state.record_load();
        state.save(store);
        let image = self.select(&mut state, rng);
        state.save(store);
        image
    }

    fn pick_regular<R: Rng + ?Sized>(&self, last: Option<&str>, rng: &mut R) -> usize {
        let len = self.regular.len();
        if len <= 1 {
            return 0;
        }
        let Some(last_idx) = last.and_then(|l| self.regular.iter().position(|u| u == l)) else {
            return rng.gen_range(0..len);
        };
        for _ in 0..MAX_REDRAWS {
            let idx = rng.gen_range(0..len);
            if idx != last_idx {
                return idx;
            }
        }
        (last_idx + 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn selector(n: usize) -> ImageSelector {
        let regular = (0..n).map(|i| format!("/beans/bean{i}.png")).collect();
        ImageSelector::new(regular, "/beans/beanlet.png".into()).unwrap()
    }

    #[test]
    fn empty_regular_set_is_rejected() {
        let err = ImageSelector::new(Vec::new(), "/beans/beanlet.png".into()).unwrap_err();
        assert!(matches!(err, Error::EmptyAssetList));
    }

    #[test]
    fn load_count_42_forces_special_and_resets() {
        let sel = selector(3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = SelectionState {
            last_shown: None,
            load_count: SPECIAL_LOAD_COUNT,
        };
        let img = sel.select(&mut state, &mut rng);
        assert!(img.is_special());
        assert_eq!(state.load_count, 0);
        assert_eq!(state.last_shown.as_deref(), Some("/beans/beanlet.png"));
    }

    #[test]
    fn single_regular_image_may_repeat() {
        let sel = selector(1);
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = SelectionState::default();
        for _ in 0..200 {
            let img = sel.select(&mut state, &mut rng);
            if let ImageRef::Regular { index, .. } = img {
                assert_eq!(index, 0);
            }
        }
    }

    #[test]
    fn redraw_cap_falls_back_to_next_index() {
        // An rng that always yields the same value exhausts the redraw budget.
        let sel = selector(4);
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        assert_eq!(sel.pick_regular(Some("/beans/bean0.png"), &mut rng), 1);
    }

    #[test]
    fn unknown_last_shown_is_ignored() {
        let sel = selector(2);
        let mut rng = StdRng::seed_from_u64(3);
        let idx = sel.pick_regular(Some("/elsewhere.png"), &mut rng);
        assert!(idx < 2);
    }

    #[test]
    fn state_round_trips_through_store() {
        let mut store = MemoryStore::default();
        let state = SelectionState {
            last_shown: Some("/beans/bean2.png".into()),
            load_count: 12,
        };
        state.save(&mut store);
        assert_eq!(store.get(LOAD_COUNT_KEY).as_deref(), Some("12"));
        assert_eq!(SelectionState::load(&store), state);
    }

    #[test]
    fn forty_second_load_is_special() {
        let sel = selector(5);
        let mut rng = StdRng::seed_from_u64(9);
        let mut store = MemoryStore::default();
        store.set(LOAD_COUNT_KEY, "41");
        let img = sel.select_for_load(&mut store, &mut rng);
        assert!(img.is_special());
        assert_eq!(store.get(LOAD_COUNT_KEY).as_deref(), Some("0"));
        assert_eq!(store.get(LAST_SHOWN_KEY).as_deref(), Some(img.url()));
    }

    #[test]
    fn select_for_load_counts_and_remembers() {
        let sel = selector(5);
        let mut rng = StdRng::seed_from_u64(10);
        let mut store = MemoryStore::default();
        let first = sel.select_for_load(&mut store, &mut rng);
        if !first.is_special() {
            assert_eq!(store.get(LOAD_COUNT_KEY).as_deref(), Some("1"));
        }
        assert_eq!(store.get(LAST_SHOWN_KEY).as_deref(), Some(first.url()));
    }

    #[test]
    fn malformed_counter_reads_as_zero() {
        let mut store = MemoryStore::default();
        store.set(LOAD_COUNT_KEY, "lots");
        assert_eq!(SelectionState::load(&store).load_count, 0);
    }
}

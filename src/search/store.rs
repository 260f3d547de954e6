use crate::models::{PropertyType, RecentSearch, SavedSearch, SearchFilters};
use crate::storage::{load_json, save_json, KeyValueStore, SEARCH_STORAGE_KEY};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

pub const MAX_RECENT_SEARCHES: usize = 10;
pub const MAX_VIEWED_PROPERTIES: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    #[serde(default)]
    pub recent_searches: Vec<RecentSearch>,
    #[serde(default)]
    pub saved_searches: Vec<SavedSearch>,
    /// Property ids, most recently viewed first
    #[serde(default)]
    pub viewed_properties: Vec<String>,
    #[serde(default)]
    pub preferred_localities: Vec<String>,
    #[serde(default)]
    pub preferred_property_types: Vec<PropertyType>,
}

/// Recent searches, saved searches and browsing preferences
pub struct SearchStore {
    state: Mutex<SearchState>,
    persistence: Arc<dyn KeyValueStore>,
}

impl SearchStore {
    pub fn new(persistence: Arc<dyn KeyValueStore>) -> Self {
        let state: SearchState =
            load_json(persistence.as_ref(), SEARCH_STORAGE_KEY).unwrap_or_default();
        info!(
            "Loaded search state: {} recent, {} saved",
            state.recent_searches.len(),
            state.saved_searches.len()
        );
        Self {
            state: Mutex::new(state),
            persistence,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn commit(&self, state: &SearchState) {
        save_json(self.persistence.as_ref(), SEARCH_STORAGE_KEY, state);
    }

    /// Record a search. Searches with neither text nor filters are ignored;
    /// a repeat of an earlier query (ignoring case) replaces it.
    pub fn add_recent_search(&self, query: &str, filters: SearchFilters) {
        let query = query.trim();
        if query.is_empty() && filters.is_empty() {
            return;
        }

        let mut state = self.lock();
        let needle = query.to_lowercase();
        state
            .recent_searches
            .retain(|s| s.query.to_lowercase() != needle);
        state.recent_searches.insert(
            0,
            RecentSearch {
                id: Uuid::new_v4().to_string(),
                query: query.to_string(),
                filters,
                searched_at: Utc::now(),
            },
        );
        state.recent_searches.truncate(MAX_RECENT_SEARCHES);
        debug!("Recorded recent search {:?}", query);
        self.commit(&state);
    }

    pub fn remove_recent_search(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.recent_searches.len();
        state.recent_searches.retain(|s| s.id != id);
        let removed = state.recent_searches.len() != before;
        if removed {
            self.commit(&state);
        }
        removed
    }

    pub fn clear_recent_searches(&self) {
        let mut state = self.lock();
        state.recent_searches.clear();
        self.commit(&state);
    }

    /// Save a named filter set and return its id
    pub fn save_search(&self, name: &str, filters: SearchFilters) -> String {
        let id = Uuid::new_v4().to_string();
        let mut state = self.lock();
        state.saved_searches.push(SavedSearch {
            id: id.clone(),
            name: name.trim().to_string(),
            filters,
            created_at: Utc::now(),
            alert_enabled: false,
        });
        info!("Saved search {:?} ({})", name, id);
        self.commit(&state);
        id
    }

    pub fn delete_saved_search(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.saved_searches.len();
        state.saved_searches.retain(|s| s.id != id);
        let removed = state.saved_searches.len() != before;
        if removed {
            info!("Deleted saved search {}", id);
            self.commit(&state);
        }
        removed
    }

    /// Flip the alert flag and return its new value; `None` for an
    /// unknown id. No notification is delivered.
    pub fn toggle_search_alert(&self, id: &str) -> Option<bool> {
        let mut state = self.lock();
        let search = state.saved_searches.iter_mut().find(|s| s.id == id)?;
        search.alert_enabled = !search.alert_enabled;
        let enabled = search.alert_enabled;
        debug!("Alert for saved search {} now {}", id, enabled);
        self.commit(&state);
        Some(enabled)
    }

    pub fn add_viewed_property(&self, property_id: &str) {
        let mut state = self.lock();
        state.viewed_properties.retain(|id| id != property_id);
        state.viewed_properties.insert(0, property_id.to_string());
        state.viewed_properties.truncate(MAX_VIEWED_PROPERTIES);
        self.commit(&state);
    }

    /// Add or remove a preferred locality; returns whether it is now preferred
    pub fn toggle_preferred_locality(&self, locality: &str) -> bool {
        let mut state = self.lock();
        let preferred = toggle(
            &mut state.preferred_localities,
            |l| l.eq_ignore_ascii_case(locality),
            || locality.to_string(),
        );
        self.commit(&state);
        preferred
    }

    pub fn toggle_preferred_property_type(&self, property_type: PropertyType) -> bool {
        let mut state = self.lock();
        let preferred = toggle(
            &mut state.preferred_property_types,
            |t| *t == property_type,
            || property_type,
        );
        self.commit(&state);
        preferred
    }

    pub fn recent_searches(&self) -> Vec<RecentSearch> {
        self.lock().recent_searches.clone()
    }

    pub fn saved_searches(&self) -> Vec<SavedSearch> {
        self.lock().saved_searches.clone()
    }

    pub fn snapshot(&self) -> SearchState {
        self.lock().clone()
    }
}

fn toggle<T>(items: &mut Vec<T>, is_match: impl Fn(&T) -> bool, make: impl FnOnce() -> T) -> bool {
    let before = items.len();
    items.retain(|item| !is_match(item));
    if items.len() == before {
        items.push(make());
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceRange, SortOrder};
    use crate::storage::MemoryStore;

    fn store() -> SearchStore {
        SearchStore::new(Arc::new(MemoryStore::new()))
    }

    fn two_bhk() -> SearchFilters {
        SearchFilters {
            bhk: vec![2],
            ..Default::default()
        }
    }

    #[test]
    fn empty_searches_are_ignored() {
        let store = store();
        store.add_recent_search("   ", SearchFilters::default());
        assert!(store.recent_searches().is_empty());

        store.add_recent_search("", two_bhk());
        assert_eq!(store.recent_searches().len(), 1);
    }

    #[test]
    fn recent_searches_dedupe_case_insensitively() {
        let store = store();
        store.add_recent_search("mumbai", SearchFilters::default());
        store.add_recent_search("Pune", SearchFilters::default());
        store.add_recent_search("Mumbai", two_bhk());

        let recent = store.recent_searches();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "Mumbai");
        assert_eq!(recent[0].filters, two_bhk());
        assert_eq!(recent[1].query, "Pune");
    }

    #[test]
    fn recent_searches_are_capped_newest_first() {
        let store = store();
        for i in 0..15 {
            store.add_recent_search(&format!("query {}", i), SearchFilters::default());
        }
        let recent = store.recent_searches();
        assert_eq!(recent.len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent[0].query, "query 14");
        assert_eq!(recent[9].query, "query 5");

        assert!(store.remove_recent_search(&recent[0].id));
        assert_eq!(store.recent_searches().len(), 9);
        store.clear_recent_searches();
        assert!(store.recent_searches().is_empty());
    }

    #[test]
    fn saved_search_crud_and_alerts() {
        let store = store();
        let filters = SearchFilters {
            price_range: PriceRange {
                min: None,
                max: Some(9_000_000),
            },
            localities: vec!["Powai".to_string()],
            sort: Some(SortOrder::PriceLowToHigh),
            ..Default::default()
        };
        let id = store.save_search("Powai under 90L", filters.clone());

        let saved = store.saved_searches();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].filters, filters);
        assert!(!saved[0].alert_enabled);

        assert_eq!(store.toggle_search_alert(&id), Some(true));
        assert_eq!(store.toggle_search_alert(&id), Some(false));
        assert_eq!(store.toggle_search_alert("missing"), None);

        assert!(store.delete_saved_search(&id));
        assert!(!store.delete_saved_search(&id));
        assert!(store.saved_searches().is_empty());
    }

    #[test]
    fn viewed_properties_move_to_front() {
        let store = store();
        store.add_viewed_property("a");
        store.add_viewed_property("b");
        store.add_viewed_property("a");
        assert_eq!(store.snapshot().viewed_properties, vec!["a", "b"]);

        for i in 0..30 {
            store.add_viewed_property(&format!("p{}", i));
        }
        assert_eq!(store.snapshot().viewed_properties.len(), MAX_VIEWED_PROPERTIES);
    }

    #[test]
    fn preferences_toggle() {
        let store = store();
        assert!(store.toggle_preferred_locality("Baner"));
        assert!(!store.toggle_preferred_locality("baner"));
        assert!(store.snapshot().preferred_localities.is_empty());

        assert!(store.toggle_preferred_property_type(PropertyType::Villa));
        assert_eq!(
            store.snapshot().preferred_property_types,
            vec![PropertyType::Villa]
        );
    }

    #[test]
    fn state_is_restored_from_persistence() {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = SearchStore::new(persistence.clone());
        first.add_recent_search("Whitefield", SearchFilters::default());
        first.save_search("Villas", SearchFilters::default());

        let second = SearchStore::new(persistence);
        assert_eq!(second.snapshot(), first.snapshot());
    }
}

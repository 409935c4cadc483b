use std::collections::BTreeMap;
use std::rc::Rc;

use formats::Track;

/// Residency of one track resource.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackState {
    /// Fetch requested from the host, not answered yet.
    Requested,
    Ready(Rc<Track>),
    Failed(String),
}

/// Track cache shared by every chapter.
///
/// The store never fetches anything itself: it queues resource names for the
/// host, and the host answers through [`TrackStore::resolve`]. Entries are
/// keyed in a `BTreeMap` so the fetch order is stable.
#[derive(Debug, Default)]
pub struct TrackStore {
    entries: BTreeMap<String, TrackState>,
    outbox: Vec<String>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, resource: &str) -> Option<&TrackState> {
        self.entries.get(resource)
    }

    pub fn ready(&self, resource: &str) -> Option<Rc<Track>> {
        match self.entries.get(resource) {
            Some(TrackState::Ready(track)) => Some(Rc::clone(track)),
            _ => None,
        }
    }

    /// Queues a fetch unless one is already resident or in flight.
    ///
    /// Returns `true` if a new fetch was queued.
    pub fn request(&mut self, resource: &str) -> bool {
        match self.entries.get(resource) {
            Some(TrackState::Requested | TrackState::Ready(_)) => false,
            Some(TrackState::Failed(_)) | None => {
                self.entries
                    .insert(resource.to_string(), TrackState::Requested);
                self.outbox.push(resource.to_string());
                true
            }
        }
    }

    /// Resources the host should fetch, in request order.
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// Stores the host's answer for `resource`.
    ///
    /// `payload` is the fetched GeoJSON text, or a description of why the
    /// fetch failed. Unparseable or empty tracks become `Failed`.
    pub fn resolve(&mut self, resource: &str, payload: Result<&str, &str>) -> &TrackState {
        let state = match payload {
            Ok(text) => match Track::from_geojson_str(text) {
                Ok(track) => TrackState::Ready(Rc::new(track)),
                Err(e) => TrackState::Failed(e.to_string()),
            },
            Err(reason) => TrackState::Failed(reason.to_string()),
        };
        if let TrackState::Failed(reason) = &state {
            tracing::warn!(resource, %reason, "track unavailable");
        }
        self.entries.insert(resource.to_string(), state);
        &self.entries[resource]
    }

    /// Preloads an already-parsed track.
    pub fn insert(&mut self, resource: impl Into<String>, track: Track) {
        self.entries
            .insert(resource.into(), TrackState::Ready(Rc::new(track)));
    }
}

#[cfg(test)]
mod tests {
    use super::{TrackState, TrackStore};

    const LINE: &str = r#"{ "type": "LineString", "coordinates": [[0, 0], [1, 1]] }"#;

    #[test]
    fn request_is_deduplicated() {
        let mut store = TrackStore::new();
        assert!(store.request("a"));
        assert!(!store.request("a"));
        assert_eq!(store.take_requests(), vec!["a".to_string()]);
        assert!(store.take_requests().is_empty());
        assert_eq!(store.state("a"), Some(&TrackState::Requested));
    }

    #[test]
    fn resolve_parses_payload() {
        let mut store = TrackStore::new();
        store.request("a");
        assert!(matches!(store.resolve("a", Ok(LINE)), TrackState::Ready(_)));
        assert_eq!(store.ready("a").map(|t| t.len()), Some(2));
        assert!(!store.request("a"));
    }

    #[test]
    fn failures_are_retried_on_next_request() {
        let mut store = TrackStore::new();
        store.request("a");
        assert!(matches!(store.resolve("a", Err("404")), TrackState::Failed(_)));
        store.take_requests();
        assert!(store.request("a"));
        assert_eq!(store.take_requests(), vec!["a".to_string()]);
    }

    #[test]
    fn empty_track_is_a_failure() {
        let mut store = TrackStore::new();
        let state = store.resolve("a", Ok(r#"{ "type": "FeatureCollection", "features": [] }"#));
        assert!(matches!(state, TrackState::Failed(_)));
        assert!(store.ready("a").is_none());
    }
}

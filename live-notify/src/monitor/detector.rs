//! Offline-to-live transition detection.

use std::collections::HashMap;

use tracing::{debug, info};

use super::source::{LiveStatus, RoomSnapshot};
use super::state::{RoomState, RoomStateStore};
use crate::config::RoomConfig;
use crate::notification::NotificationEvent;

/// Outcome of diffing one poll result against the store.
#[derive(Debug, Default)]
pub struct Detection {
    /// Rooms that just went live, in configuration order.
    pub events: Vec<NotificationEvent>,
    /// Configured rooms present in the poll result.
    pub checked: usize,
    /// Configured rooms missing from the poll result.
    pub missing: Vec<String>,
}

/// Decides which rooms need a notification and records the new state.
pub struct TransitionDetector;

impl TransitionDetector {
    /// Compare `fresh` against `store` for every room in `rooms`.
    ///
    /// - live now, not live before: emit an event and store the live metadata.
    /// - not live now: store `Offline` and clear the cached metadata.
    /// - live now and before: nothing.
    ///
    /// Rooms absent from `fresh` keep their stored state and emit nothing.
    pub fn detect(
        fresh: &HashMap<String, RoomSnapshot>,
        rooms: &[RoomConfig],
        store: &mut RoomStateStore,
    ) -> Detection {
        let mut detection = Detection::default();

        for room in rooms {
            let Some(snapshot) = fresh.get(&room.room_id) else {
                debug!(room_id = %room.room_id, "Room missing from poll result, keeping previous state");
                detection.missing.push(room.room_id.clone());
                continue;
            };
            detection.checked += 1;

            let previous = store.status(&room.room_id);

            match (snapshot.status, previous) {
                (LiveStatus::Live, LiveStatus::Live) => {}
                (LiveStatus::Live, _) => {
                    info!(
                        room_id = %room.room_id,
                        streamer = %snapshot.display_name,
                        previous = %previous,
                        "Room went live"
                    );
                    detection
                        .events
                        .push(NotificationEvent::from_snapshot(snapshot, &room.group_ids));
                    store.set(&room.room_id, RoomState::live_from(snapshot));
                }
                (_, previous) => {
                    if previous.is_live() {
                        info!(room_id = %room.room_id, "Room went offline");
                    }
                    store.set(&room.room_id, RoomState::offline());
                }
            }
        }

        detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms() -> Vec<RoomConfig> {
        vec![
            RoomConfig::new("1", vec!["g1".to_string(), "g2".to_string()]),
            RoomConfig::new("2", vec!["g3".to_string()]),
        ]
    }

    fn snapshot(id: &str, status: LiveStatus) -> RoomSnapshot {
        RoomSnapshot {
            room_id: id.to_string(),
            status,
            cover_url: format!("cover-{id}"),
            display_name: format!("streamer-{id}"),
            room_url: format!("https://live.bilibili.com/{id}"),
        }
    }

    fn poll(entries: &[(&str, LiveStatus)]) -> HashMap<String, RoomSnapshot> {
        entries
            .iter()
            .map(|(id, status)| (id.to_string(), snapshot(id, *status)))
            .collect()
    }

    fn store() -> RoomStateStore {
        RoomStateStore::new(["1", "2"])
    }

    #[test]
    fn test_unknown_to_live_emits_event() {
        let mut store = store();
        let detection =
            TransitionDetector::detect(&poll(&[("1", LiveStatus::Live)]), &rooms(), &mut store);

        assert_eq!(detection.events.len(), 1);
        let event = &detection.events[0];
        assert_eq!(event.room_id, "1");
        assert_eq!(event.display_name, "streamer-1");
        assert_eq!(event.group_ids, vec!["g1", "g2"]);

        let state = store.get("1").unwrap();
        assert_eq!(state.status, LiveStatus::Live);
        assert_eq!(state.cover_url, "cover-1");
    }

    #[test]
    fn test_live_to_live_is_deduplicated() {
        let mut store = store();
        let fresh = poll(&[("1", LiveStatus::Live)]);
        TransitionDetector::detect(&fresh, &rooms(), &mut store);

        let detection = TransitionDetector::detect(&fresh, &rooms(), &mut store);
        assert!(detection.events.is_empty());
        assert_eq!(store.status("1"), LiveStatus::Live);
    }

    #[test]
    fn test_offline_resets_metadata_even_if_never_live() {
        let mut store = store();
        let detection =
            TransitionDetector::detect(&poll(&[("2", LiveStatus::Offline)]), &rooms(), &mut store);

        assert!(detection.events.is_empty());
        assert_eq!(store.get("2"), Some(&RoomState::offline()));
    }

    #[test]
    fn test_live_offline_live_notifies_twice() {
        let mut store = store();
        let live = poll(&[("1", LiveStatus::Live)]);
        let offline = poll(&[("1", LiveStatus::Offline)]);

        assert_eq!(TransitionDetector::detect(&live, &rooms(), &mut store).events.len(), 1);
        assert_eq!(TransitionDetector::detect(&offline, &rooms(), &mut store).events.len(), 0);
        assert_eq!(store.get("1"), Some(&RoomState::offline()));
        assert_eq!(TransitionDetector::detect(&live, &rooms(), &mut store).events.len(), 1);
    }

    #[test]
    fn test_missing_room_keeps_state() {
        let mut store = store();
        TransitionDetector::detect(&poll(&[("1", LiveStatus::Live)]), &rooms(), &mut store);
        let before = store.get("1").cloned();

        let detection =
            TransitionDetector::detect(&poll(&[("2", LiveStatus::Offline)]), &rooms(), &mut store);

        assert!(detection.events.is_empty());
        assert_eq!(detection.checked, 1);
        assert_eq!(detection.missing, vec!["1"]);
        assert_eq!(store.get("1").cloned(), before);
    }

    #[test]
    fn test_events_follow_config_order() {
        let mut store = store();
        let detection = TransitionDetector::detect(
            &poll(&[("2", LiveStatus::Live), ("1", LiveStatus::Live)]),
            &rooms(),
            &mut store,
        );

        let ids: Vec<_> = detection.events.iter().map(|e| e.room_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_unconfigured_rooms_in_result_are_ignored() {
        let mut store = store();
        let detection =
            TransitionDetector::detect(&poll(&[("99", LiveStatus::Live)]), &rooms(), &mut store);

        assert!(detection.events.is_empty());
        assert_eq!(detection.checked, 0);
        assert!(store.get("99").is_none());
    }
}

//! Bounded per-player position history.
//!
//! Each player owns a newest-first list of places they teleported away from.
//! Inserting at the front and evicting from the back keeps the list at or
//! below the configured capacity.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;
use waypoint_events::{MapId, PlayerId, WorldPosition};

/// Label used when the host cannot resolve an area name.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A captured position, labelled with the area it was taken in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub map_id: MapId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
    pub location_name: String,
}

impl PositionRecord {
    /// Builds a record from a host position; a missing area name becomes
    /// [`UNKNOWN_LOCATION`].
    pub fn capture(position: WorldPosition, area_name: Option<String>) -> Self {
        Self {
            map_id: position.map_id,
            x: position.x,
            y: position.y,
            z: position.z,
            orientation: position.orientation,
            location_name: area_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        }
    }

    /// The destination to hand back to the host's teleport primitive.
    pub fn destination(&self) -> WorldPosition {
        WorldPosition::new(self.map_id, self.x, self.y, self.z, self.orientation)
    }
}

/// Lookup failures for [`PositionHistory::get`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("No position stored at rank {rank} for player {player}")]
    NotFound { player: PlayerId, rank: usize },
}

/// Newest-first position lists for every player, capped at `capacity`.
///
/// Each player's list sits behind its own map shard lock, so callers on
/// different threads never observe a half-applied insert.
#[derive(Debug)]
pub struct PositionHistory {
    entries: DashMap<PlayerId, VecDeque<PositionRecord>>,
    capacity: usize,
}

impl PositionHistory {
    /// Creates an empty store. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pushes `position` to the front of the player's list, evicting the
    /// oldest entry once the list grows past capacity.
    pub fn record(&self, player: PlayerId, position: PositionRecord) {
        let mut history = self
            .entries
            .entry(player)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity + 1));

        history.push_front(position);
        while history.len() > self.capacity {
            if let Some(evicted) = history.pop_back() {
                trace!("🗑️ Evicted '{}' from history of player {}", evicted.location_name, player);
            }
        }
    }

    /// Returns the record at 1-based `rank`, where 1 is the most recent.
    pub fn get(&self, player: PlayerId, rank: usize) -> Result<PositionRecord, HistoryError> {
        let not_found = HistoryError::NotFound { player, rank };
        if rank == 0 {
            return Err(not_found);
        }

        self.entries
            .get(&player)
            .and_then(|history| history.get(rank - 1).cloned())
            .ok_or(not_found)
    }

    /// Snapshot of the player's list, newest first. Empty for players that
    /// were never recorded.
    pub fn list(&self, player: PlayerId) -> Vec<PositionRecord> {
        self.entries
            .get(&player)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of records held for a player.
    pub fn len(&self, player: PlayerId) -> usize {
        self.entries.get(&player).map(|history| history.len()).unwrap_or(0)
    }

    /// Number of players with at least one record.
    pub fn player_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32) -> PositionRecord {
        PositionRecord {
            map_id: MapId(n % 2),
            x: n as f32,
            y: n as f32 * 2.0,
            z: 10.0,
            orientation: 0.5,
            location_name: format!("P{n}"),
        }
    }

    fn names(records: &[PositionRecord]) -> Vec<String> {
        records.iter().map(|r| r.location_name.clone()).collect()
    }

    #[test]
    fn test_ten_records_keep_newest_eight() {
        let history = PositionHistory::new(8);
        let k = PlayerId(7);

        for n in 1..=10 {
            history.record(k, record(n));
        }

        assert_eq!(
            names(&history.list(k)),
            vec!["P10", "P9", "P8", "P7", "P6", "P5", "P4", "P3"]
        );
        assert_eq!(history.len(k), 8);
    }

    #[test]
    fn test_unknown_player_has_nothing() {
        let history = PositionHistory::new(8);
        let k2 = PlayerId(2);

        assert_eq!(
            history.get(k2, 1),
            Err(HistoryError::NotFound { player: k2, rank: 1 })
        );
        assert!(history.list(k2).is_empty());
        assert_eq!(history.player_count(), 0);
    }

    #[test]
    fn test_rank_is_one_based_from_newest() {
        let history = PositionHistory::new(8);
        let k = PlayerId(1);

        for n in 1..=3 {
            history.record(k, record(n));
        }

        assert_eq!(history.get(k, 1).unwrap().location_name, "P3");
        assert_eq!(history.get(k, 2).unwrap(), record(2));
        assert_eq!(history.get(k, 3).unwrap().location_name, "P1");
    }

    #[test]
    fn test_rank_out_of_bounds() {
        let history = PositionHistory::new(8);
        let k = PlayerId(1);
        history.record(k, record(1));

        assert!(matches!(history.get(k, 0), Err(HistoryError::NotFound { rank: 0, .. })));
        assert!(matches!(history.get(k, 2), Err(HistoryError::NotFound { rank: 2, .. })));
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        for capacity in 1..=6 {
            let history = PositionHistory::new(capacity);
            let k = PlayerId(capacity as u64);

            for n in 1..=20u32 {
                history.record(k, record(n));
                assert!(history.len(k) <= capacity);

                let expected: Vec<String> = (1..=n)
                    .rev()
                    .take(capacity)
                    .map(|i| format!("P{i}"))
                    .collect();
                assert_eq!(names(&history.list(k)), expected);
            }
        }
    }

    #[test]
    fn test_players_are_isolated() {
        let history = PositionHistory::new(4);
        history.record(PlayerId(1), record(1));
        history.record(PlayerId(2), record(2));
        history.record(PlayerId(2), record(3));

        assert_eq!(names(&history.list(PlayerId(1))), vec!["P1"]);
        assert_eq!(names(&history.list(PlayerId(2))), vec!["P3", "P2"]);
        assert_eq!(history.player_count(), 2);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let history = PositionHistory::new(0);
        history.record(PlayerId(1), record(1));
        history.record(PlayerId(1), record(2));

        assert_eq!(history.capacity(), 1);
        assert_eq!(names(&history.list(PlayerId(1))), vec!["P2"]);
    }

    #[test]
    fn test_capture_falls_back_to_unknown() {
        let position = WorldPosition::new(MapId(0), 1.0, 2.0, 3.0, 0.0);

        assert_eq!(PositionRecord::capture(position, None).location_name, UNKNOWN_LOCATION);
        assert_eq!(
            PositionRecord::capture(position, Some(String::new())).location_name,
            UNKNOWN_LOCATION
        );

        let named = PositionRecord::capture(position, Some("Goldshire".to_string()));
        assert_eq!(named.location_name, "Goldshire");
        assert_eq!(named.destination(), position);
    }

    #[test]
    fn test_concurrent_records_stay_bounded() {
        let history = std::sync::Arc::new(PositionHistory::new(8));
        let k = PlayerId(99);

        let workers: Vec<_> = (0..4)
            .map(|t| {
                let history = std::sync::Arc::clone(&history);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        history.record(k, record(t * 100 + n));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(history.len(k), 8);
    }
}

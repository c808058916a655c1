//! Decaying per-agent memory of previously perceived entities

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::MemoryConfig;
use crate::core::types::{EntityId, Millis, Vec2};

/// What an agent remembers about one other entity
///
/// The id is a lookup key only; the remembered entity may already be gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub last_seen: Millis,
    pub last_known_position: Vec2,
    /// Only grows; reset happens by forgetting the whole entry
    pub threat_level: f32,
    pub encounter_count: u32,
}

impl MemoryEntry {
    fn new(position: Vec2, now: Millis) -> Self {
        Self {
            last_seen: now,
            last_known_position: position,
            threat_level: 0.0,
            encounter_count: 1,
        }
    }

    pub fn is_expired(&self, now: Millis, decay_window: Millis) -> bool {
        now - self.last_seen > decay_window
    }
}

/// One perceived entity fed into a memory update
#[derive(Debug, Clone, Copy)]
pub struct Sighting {
    pub entity: EntityId,
    pub position: Vec2,
    pub is_player: bool,
    /// Current threat score when the entity is a potential threat
    pub threat_score: Option<f32>,
}

/// Agent memory keyed by remembered entity id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMemory {
    entries: AHashMap<EntityId, MemoryEntry>,
    last_seen_player: Option<(EntityId, Millis)>,
}

impl EntityMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything not refreshed within the decay window
    pub fn purge(&mut self, now: Millis, decay_window: Millis) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, decay_window));
        before - self.entries.len()
    }

    /// Purge, then record the current sightings
    ///
    /// New entries start with one encounter and no threat. Refreshed entries of
    /// potential threats accumulate `threat_gain × score`, capped.
    pub fn update(&mut self, now: Millis, sightings: &[Sighting], config: &MemoryConfig) {
        self.purge(now, config.decay_window_ms);

        for sighting in sightings {
            match self.entries.get_mut(&sighting.entity) {
                None => {
                    self.entries
                        .insert(sighting.entity, MemoryEntry::new(sighting.position, now));
                }
                Some(entry) => {
                    entry.last_seen = now;
                    entry.last_known_position = sighting.position;
                    entry.encounter_count = entry.encounter_count.saturating_add(1);
                    if let Some(score) = sighting.threat_score {
                        let gain = (score * config.threat_gain).max(0.0);
                        entry.threat_level = (entry.threat_level + gain).min(config.threat_cap);
                    }
                }
            }
        }

        if let Some(player) = sightings.iter().find(|s| s.is_player) {
            self.last_seen_player = Some((player.entity, now));
        }
    }

    pub fn get(&self, entity: EntityId) -> Option<&MemoryEntry> {
        self.entries.get(&entity)
    }

    pub fn threat_level(&self, entity: EntityId) -> f32 {
        self.entries.get(&entity).map_or(0.0, |e| e.threat_level)
    }

    pub fn last_known_position(&self, entity: EntityId) -> Option<Vec2> {
        self.entries.get(&entity).map(|e| e.last_known_position)
    }

    /// Most recently seen player and when
    pub fn last_seen_player(&self) -> Option<(EntityId, Millis)> {
        self.last_seen_player
    }

    pub fn player_seen_within(&self, now: Millis, window: Millis) -> bool {
        self.last_seen_player
            .is_some_and(|(_, seen)| now - seen <= window)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &MemoryEntry)> {
        self.entries.iter()
    }

    /// Directly place an entry, bypassing the update rules
    pub fn insert_entry(&mut self, entity: EntityId, entry: MemoryEntry) {
        self.entries.insert(entity, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(id: u64, threat: Option<f32>) -> Sighting {
        Sighting {
            entity: EntityId(id),
            position: Vec2::new(id as f32, 0.0),
            is_player: threat.is_some(),
            threat_score: threat,
        }
    }

    #[test]
    fn test_first_sighting_creates_entry() {
        let mut memory = EntityMemory::new();
        memory.update(100.0, &[sighting(1, Some(40.0))], &MemoryConfig::default());

        let entry = memory.get(EntityId(1)).expect("entry created");
        assert_eq!(entry.encounter_count, 1);
        assert_eq!(entry.threat_level, 0.0);
        assert_eq!(entry.last_seen, 100.0);
    }

    #[test]
    fn test_refresh_accumulates_threat() {
        let config = MemoryConfig::default();
        let mut memory = EntityMemory::new();
        memory.update(0.0, &[sighting(1, Some(40.0))], &config);
        memory.update(16.0, &[sighting(1, Some(40.0))], &config);
        memory.update(32.0, &[sighting(1, Some(40.0))], &config);

        let entry = memory.get(EntityId(1)).unwrap();
        assert_eq!(entry.encounter_count, 3);
        assert!((entry.threat_level - 8.0).abs() < 1e-4);
        assert_eq!(entry.last_seen, 32.0);
    }

    #[test]
    fn test_non_threats_never_gain_threat() {
        let config = MemoryConfig::default();
        let mut memory = EntityMemory::new();
        for t in 0..10 {
            memory.update(t as f64, &[sighting(2, None)], &config);
        }
        assert_eq!(memory.threat_level(EntityId(2)), 0.0);
        assert_eq!(memory.get(EntityId(2)).unwrap().encounter_count, 10);
    }

    #[test]
    fn test_threat_capped() {
        let config = MemoryConfig::default();
        let mut memory = EntityMemory::new();
        for t in 0..100 {
            memory.update(t as f64, &[sighting(1, Some(500.0))], &config);
        }
        assert_eq!(memory.threat_level(EntityId(1)), config.threat_cap);
    }

    #[test]
    fn test_threat_never_decreases_while_remembered() {
        let config = MemoryConfig::default();
        let mut memory = EntityMemory::new();
        memory.update(0.0, &[sighting(1, Some(50.0))], &config);
        memory.update(1.0, &[sighting(1, Some(50.0))], &config);
        let before = memory.threat_level(EntityId(1));
        memory.update(2.0, &[sighting(1, Some(0.0))], &config);
        memory.update(3.0, &[], &config);
        assert_eq!(memory.threat_level(EntityId(1)), before);
    }

    #[test]
    fn test_decay_boundary() {
        let config = MemoryConfig::default();
        let window = config.decay_window_ms;
        let now = 100_000.0;
        let mut memory = EntityMemory::new();
        memory.insert_entry(
            EntityId(1),
            MemoryEntry {
                last_seen: now - window - 1.0,
                last_known_position: Vec2::ZERO,
                threat_level: 50.0,
                encounter_count: 4,
            },
        );
        memory.insert_entry(
            EntityId(2),
            MemoryEntry {
                last_seen: now,
                last_known_position: Vec2::ZERO,
                threat_level: 0.0,
                encounter_count: 1,
            },
        );

        memory.update(now, &[], &config);

        assert!(memory.get(EntityId(1)).is_none());
        assert!(memory.get(EntityId(2)).is_some());
    }

    #[test]
    fn test_forgotten_entry_restarts_from_zero() {
        let config = MemoryConfig::default();
        let mut memory = EntityMemory::new();
        memory.update(0.0, &[sighting(1, Some(90.0))], &config);
        memory.update(1.0, &[sighting(1, Some(90.0))], &config);
        assert!(memory.threat_level(EntityId(1)) > 0.0);

        let later = 1.0 + config.decay_window_ms + 1.0;
        memory.update(later, &[sighting(1, Some(90.0))], &config);
        let entry = memory.get(EntityId(1)).unwrap();
        assert_eq!(entry.threat_level, 0.0);
        assert_eq!(entry.encounter_count, 1);
    }

    #[test]
    fn test_last_seen_player_tracking() {
        let config = MemoryConfig::default();
        let mut memory = EntityMemory::new();
        assert!(!memory.player_seen_within(0.0, 10_000.0));

        memory.update(500.0, &[sighting(3, None), sighting(9, Some(1.0))], &config);
        assert_eq!(memory.last_seen_player(), Some((EntityId(9), 500.0)));
        assert!(memory.player_seen_within(10_000.0, 10_000.0));
        assert!(!memory.player_seen_within(10_501.0, 10_000.0));
    }
}

//! Timed status effects pushed onto agents by external commands

use serde::{Deserialize, Serialize};

use crate::core::types::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    /// No directed movement until the timer runs out
    Stun,
    /// Random velocity jitter every tick
    Confusion,
    /// Agent counts as scared and flees from any threat
    Fear,
}

/// Remaining duration of each effect, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub stun_ms: Millis,
    pub confusion_ms: Millis,
    pub fear_ms: Millis,
}

impl StatusEffects {
    /// Set an effect's timer; a new application replaces the remaining time
    pub fn apply(&mut self, effect: StatusEffect, duration_ms: Millis) {
        let duration = duration_ms.max(0.0);
        match effect {
            StatusEffect::Stun => self.stun_ms = duration,
            StatusEffect::Confusion => self.confusion_ms = duration,
            StatusEffect::Fear => self.fear_ms = duration,
        }
    }

    /// Count every timer down, never below zero
    pub fn advance(&mut self, dt_ms: Millis) {
        self.stun_ms = (self.stun_ms - dt_ms).max(0.0);
        self.confusion_ms = (self.confusion_ms - dt_ms).max(0.0);
        self.fear_ms = (self.fear_ms - dt_ms).max(0.0);
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_ms > 0.0
    }

    pub fn is_confused(&self) -> bool {
        self.confusion_ms > 0.0
    }

    pub fn is_scared(&self) -> bool {
        self.fear_ms > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_count_down_to_zero() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::Stun, 100.0);
        effects.apply(StatusEffect::Fear, 30.0);

        effects.advance(50.0);
        assert!(effects.is_stunned());
        assert!(!effects.is_scared());
        assert_eq!(effects.fear_ms, 0.0);

        effects.advance(50.0);
        assert!(!effects.is_stunned());
    }

    #[test]
    fn test_reapply_replaces_remaining_time() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::Confusion, 1000.0);
        effects.apply(StatusEffect::Confusion, 200.0);
        assert_eq!(effects.confusion_ms, 200.0);
    }

    #[test]
    fn test_negative_duration_is_ignored() {
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::Stun, -10.0);
        assert!(!effects.is_stunned());
    }
}

//! Per-tick event queue and isolated fan-out to external collaborators
//!
//! The core only appends to the queue. Collaborators (UI, audio, statistics)
//! receive events after the tick through an `EventDispatcher`, which contains
//! handler failures so one misbehaving listener cannot affect the others or
//! the simulation.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::types::{EntityId, Tick};
use crate::entity::agent::{AlertLevel, BehaviorState};
use crate::entity::archetype::Ability;
use crate::entity::status::StatusEffect;
use crate::entity::EntityClass;

/// Something that happened during a tick or through a world command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    Spawned {
        entity: EntityId,
        class: EntityClass,
    },
    /// Marked inactive by an external command
    Disposed { entity: EntityId },
    BehaviorChanged {
        entity: EntityId,
        from: BehaviorState,
        to: BehaviorState,
    },
    AlertChanged {
        entity: EntityId,
        from: AlertLevel,
        to: AlertLevel,
    },
    Consumed {
        eater: EntityId,
        prey: EntityId,
        prey_class: EntityClass,
        /// Diameter change applied to the eater (negative for poison)
        growth: f32,
    },
    StatusApplied {
        entity: EntityId,
        effect: StatusEffect,
        duration_ms: f64,
    },
    AbilityActivated {
        entity: EntityId,
        ability: Ability,
    },
    AbilityExpired {
        entity: EntityId,
        ability: Ability,
    },
    /// Dropped from the registry during cleanup
    Removed { entity: EntityId },
}

/// Append-only buffer drained once per tick
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimulationEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = SimulationEvent>) {
        self.events.extend(events);
    }

    pub fn drain(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// External consumer of simulation events
pub trait EventHandler {
    fn name(&self) -> &str;

    fn handle(&mut self, tick: Tick, event: &SimulationEvent) -> Result<(), HandlerError>;
}

/// Counts of contained handler failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub errors: usize,
    pub panics: usize,
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn EventHandler>>,
    failures: usize,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Total failures contained since creation
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Deliver every event to every handler
    ///
    /// An `Err` or a panic from one handler is logged and counted; delivery
    /// continues with the next handler and the next event.
    pub fn dispatch(&mut self, tick: Tick, events: &[SimulationEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for event in events {
            for handler in self.handlers.iter_mut() {
                let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(tick, event)));
                match outcome {
                    Ok(Ok(())) => report.delivered += 1,
                    Ok(Err(err)) => {
                        warn!(handler = handler.name(), tick, error = %err, "event handler failed");
                        report.errors += 1;
                    }
                    Err(_) => {
                        warn!(handler = handler.name(), tick, "event handler panicked");
                        report.panics += 1;
                    }
                }
            }
        }

        self.failures += report.errors + report.panics;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<SimulationEvent>>>);

    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn handle(&mut self, _tick: Tick, event: &SimulationEvent) -> Result<(), HandlerError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Failing;

    impl EventHandler for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn handle(&mut self, _tick: Tick, _event: &SimulationEvent) -> Result<(), HandlerError> {
            Err("disk full".into())
        }
    }

    struct Panicking;

    impl EventHandler for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn handle(&mut self, _tick: Tick, _event: &SimulationEvent) -> Result<(), HandlerError> {
            panic!("listener bug");
        }
    }

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = EventQueue::new();
        queue.push(SimulationEvent::Removed { entity: EntityId(1) });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain().len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_failing_handlers_do_not_block_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Box::new(Panicking));
        dispatcher.register(Box::new(Failing));
        dispatcher.register(Box::new(Recorder(Arc::clone(&seen))));

        let events = vec![
            SimulationEvent::Disposed { entity: EntityId(1) },
            SimulationEvent::Removed { entity: EntityId(1) },
        ];
        let report = dispatcher.dispatch(3, &events);

        assert_eq!(report.delivered, 2);
        assert_eq!(report.errors, 2);
        assert_eq!(report.panics, 2);
        assert_eq!(dispatcher.failures(), 4);
        assert_eq!(*seen.lock().unwrap(), events);
    }
}

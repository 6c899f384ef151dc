use crate::snapshot::EntityKind;
use crate::state::AppState;
use crate::world::EntityId;
use std::fmt;

#[derive(Debug, Clone)]
pub enum EditorEvent {
    StateChanged { previous: AppState, current: AppState },
    EntitySpawned { id: EntityId, kind: EntityKind },
    EntityDespawned { id: EntityId },
    EnvironmentReplaced { job_id: String },
    LightChanged { intensity: f32 },
    SnapshotSaved { path: String, entities: usize },
    SnapshotLoaded { path: String, spawned: usize, skipped: usize },
}

impl fmt::Display for EditorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorEvent::StateChanged { previous, current } => {
                write!(f, "StateChanged {} -> {}", previous.label(), current.label())
            }
            EditorEvent::EntitySpawned { id, kind } => {
                write!(f, "EntitySpawned id={} kind={}", id, kind.label())
            }
            EditorEvent::EntityDespawned { id } => write!(f, "EntityDespawned id={id}"),
            EditorEvent::EnvironmentReplaced { job_id } => {
                write!(f, "EnvironmentReplaced job={job_id}")
            }
            EditorEvent::LightChanged { intensity } => {
                write!(f, "LightChanged intensity={intensity:.3}")
            }
            EditorEvent::SnapshotSaved { path, entities } => {
                write!(f, "SnapshotSaved path={path} entities={entities}")
            }
            EditorEvent::SnapshotLoaded { path, spawned, skipped } => {
                write!(f, "SnapshotLoaded path={path} spawned={spawned} skipped={skipped}")
            }
        }
    }
}

/// Drain-style queue of editor happenings. Absent consumers are harmless;
/// events simply accumulate until the next drain.
#[derive(Default)]
pub struct EventBus {
    events: Vec<EditorEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }
}

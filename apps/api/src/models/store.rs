//! Entity state store — the read-only lookup service templates resolve against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Live state of a single entity: the state string plus its attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub state: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Read-only entity lookup. The core never writes through this seam; the
/// host owns subscription and freshness.
pub trait StateStore {
    fn get(&self, entity_id: &str) -> Option<&EntityState>;
}

/// In-memory snapshot keyed by entity id, deserialized straight from the
/// render request. Each request carries its own snapshot, so a render is a
/// pure function of (config, snapshot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    entities: BTreeMap<String, EntityState>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, state: EntityState) {
        self.entities.insert(entity_id.into(), state);
    }

    /// Convenience for tests and fixtures: an entity with a state string and
    /// no attributes.
    pub fn with_state(mut self, entity_id: &str, state: &str) -> Self {
        self.insert(
            entity_id,
            EntityState {
                state: state.to_string(),
                attributes: BTreeMap::new(),
            },
        );
        self
    }
}

impl StateStore for StateSnapshot {
    fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }
}

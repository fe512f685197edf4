use super::{EvalError, EvalResult};
use crate::world::EntityId;

/// Name of the trigger information field holding the triggering entity.
pub const INFO_TRIGGERING_ENTITY: &str = "InfoTriggeringEntity";

/// Payload of the game event that fired an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerContext {
    event: Option<String>,
    triggering_entity: Option<EntityId>,
}

impl TriggerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_triggering_entity(mut self, entity: EntityId) -> Self {
        self.triggering_entity = Some(entity);
        self
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    pub fn triggering_entity(&self) -> EvalResult<EntityId> {
        self.triggering_entity.ok_or(EvalError::MissingTriggerInfo {
            field: INFO_TRIGGERING_ENTITY,
        })
    }
}

//! Evaluator: resolves argument slots through the typed request protocol and
//! performs action side effects.

pub mod context;
pub mod dispatch;
pub mod evaluator;
pub mod resolver;
pub mod value;

use thiserror::Error;

use crate::node::{NodeId, NodeKind, TreeError, ValueKind};
use crate::world::EntityId;

pub use context::{TriggerContext, INFO_TRIGGERING_ENTITY};
pub use dispatch::{DispatchReport, Dispatcher, FailurePolicy};
pub use evaluator::Evaluator;
pub use resolver::{Resolver, DEFAULT_MAX_DEPTH};
pub use value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Node {node} of kind {kind} is not an action")]
    NotAnAction { node: NodeId, kind: NodeKind },

    #[error("Node {node} of kind {kind} is not a condition")]
    NotACondition { node: NodeId, kind: NodeKind },

    #[error("Node {node} of kind {kind} does not produce a value")]
    NotAValue { node: NodeId, kind: NodeKind },

    #[error("Node {node} has no argument in slot '{slot}'")]
    MissingArgument { node: NodeId, slot: String },

    #[error("Value node {node} was never assigned")]
    Unassigned { node: NodeId },

    #[error("Node {node} produces {found}, expected {expected}")]
    TypeMismatch {
        node: NodeId,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Unknown item template: {0}")]
    UnknownItemTemplate(String),

    #[error("Region with network id {network_id} was never resolved")]
    UnresolvedRegion { network_id: i64 },

    #[error("Region {entity} (network id {network_id}) no longer exists")]
    RegionGone { network_id: i64, entity: EntityId },

    #[error("Trigger context carries no {field}")]
    MissingTriggerInfo { field: &'static str },

    #[error("{0} has no display name")]
    NoDisplayName(EntityId),

    #[error("Node {node} resolved to invalid amount {amount}")]
    InvalidAmount { node: NodeId, amount: i64 },

    #[error("Unknown chat template: {0}")]
    UnknownTemplate(String),

    #[error("Node {node} nests deeper than {max_depth} levels")]
    TooDeep { node: NodeId, max_depth: usize },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type EvalResult<T> = Result<T, EvalError>;

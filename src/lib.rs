//! Scenario behaviour trees: a builder that rebuilds trees from flat
//! construction strings and an evaluator that runs their actions against a
//! host [`World`].

pub mod build;
pub mod config;
pub mod error;
pub mod eval;
pub mod event_bus;
pub mod literal;
pub mod node;
pub mod sandbox;
pub mod template;
pub mod world;

// Re-exports
pub use build::{encode, BuildError, BuildResult, TreeBuilder};
pub use config::ScenarioConfig;
pub use error::*;
pub use eval::{Dispatcher, EvalError, EvalResult, Evaluator, FailurePolicy, TriggerContext, Value};
pub use event_bus::{ErrorEvent, EventBus, WorldEvent};
pub use literal::{Comparator, Literal, PlayerRef, RegionBinding};
pub use node::{ActionKind, ConditionKind, ExpressionKind, Node, NodeId, NodeKind, ScenarioTree, ValueKind};
pub use sandbox::SandboxWorld;
pub use template::{Template, TemplateCatalog, TemplateRegistry};
pub use world::{Color, EntityId, World};

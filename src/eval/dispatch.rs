use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::TriggerContext;
use super::evaluator::Evaluator;
use super::{EvalError, EvalResult};
use crate::event_bus::{ErrorEvent, EventBus};
use crate::node::{NodeId, ScenarioTree};
use crate::world::World;

/// What to do with the remaining actions once one of them fails.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    LogAndContinue,
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// False when a condition did not hold.
    pub fired: bool,
    pub succeeded: Vec<NodeId>,
    pub failed: Vec<(NodeId, EvalError)>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Routes one trigger to the conditions and actions attached to it.
pub struct Dispatcher {
    evaluator: Evaluator,
    policy: FailurePolicy,
    event_bus: Option<Arc<EventBus>>,
}

impl Dispatcher {
    pub fn new(evaluator: Evaluator, policy: FailurePolicy) -> Self {
        Self {
            evaluator,
            policy,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Evaluates every condition, then runs the actions in order.
    ///
    /// A failing condition stops the dispatch regardless of policy; action
    /// failures are handled according to the configured [`FailurePolicy`].
    #[tracing::instrument(level = "debug", skip_all, fields(tree = %tree.id(), policy = %self.policy))]
    pub fn dispatch(
        &self,
        tree: &ScenarioTree,
        conditions: &[NodeId],
        actions: &[NodeId],
        context: &TriggerContext,
        world: &mut dyn World,
    ) -> EvalResult<DispatchReport> {
        let mut report = DispatchReport::default();

        for &condition in conditions {
            match self.evaluator.evaluate_condition(tree, condition, context, &*world) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(%condition, "condition does not hold");
                    return Ok(report);
                }
                Err(e) => {
                    self.report_failure(condition, &e);
                    return Err(e);
                }
            }
        }
        report.fired = true;

        for &action in actions {
            match self.evaluator.on_trigger(tree, action, context, world) {
                Ok(()) => report.succeeded.push(action),
                Err(e) => {
                    self.report_failure(action, &e);
                    match self.policy {
                        FailurePolicy::LogAndContinue => report.failed.push((action, e)),
                        FailurePolicy::Abort => return Err(e),
                    }
                }
            }
        }
        Ok(report)
    }

    fn report_failure(&self, node: NodeId, error: &EvalError) {
        warn!(%node, %error, "scenario evaluation failed");
        if let Some(bus) = &self.event_bus {
            let event = ErrorEvent {
                error_type: "evaluation".to_string(),
                message: format!("{}: {}", node, error),
            };
            if let Err(e) = bus.publish_error(event) {
                debug!(%e, "no error subscribers");
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Evaluator::default(), FailurePolicy::default())
    }
}

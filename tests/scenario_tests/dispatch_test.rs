use std::sync::Arc;

use pretty_assertions::assert_eq;
use scenario_tree::{
    config::{self, ScenarioConfig},
    sandbox::{SandboxConfig, SandboxWorld},
    Dispatcher, EvalError, Evaluator, EventBus, FailurePolicy, TriggerContext,
};

use super::build;

fn sandbox() -> SandboxWorld {
    let sandbox: SandboxConfig = config::from_str(
        r#"{
            "blocks": ["core:stone"],
            "items": ["core:apple"],
            "players": ["Alice"]
        }"#,
    )
    .unwrap();
    SandboxWorld::from_config(&sandbox)
}

#[test]
fn test_fires_actions_only_when_conditions_hold() {
    let mut world = sandbox();
    let alice = world.player("Alice").unwrap().character;
    let context = TriggerContext::new().with_triggering_entity(alice);
    let give = build(
        &world,
        &["[PREFAB]giveItemAction", "{item}[VALUE]core:apple", "{amount}[VALUE]1"],
    );
    let dispatcher = Dispatcher::default();

    let gate = build(
        &world,
        &[
            "[PREFAB]intComparison",
            "{first}[VALUE]5",
            "{comparator}[VALUE]GREATER_THAN_EQUAL_TO",
            "{second}[VALUE]5",
        ],
    );
    let report = dispatcher
        .dispatch(&gate, &[gate.root()], &[], &context, &mut world)
        .unwrap();
    assert!(report.fired);

    let closed = build(
        &world,
        &[
            "[PREFAB]intComparison",
            "{comparator}[VALUE]GREATER_THAN",
        ],
    );
    let report = dispatcher
        .dispatch(&closed, &[closed.root()], &[], &context, &mut world)
        .unwrap();
    assert!(!report.fired);

    let report = dispatcher
        .dispatch(&give, &[], &[give.root()], &context, &mut world)
        .unwrap();
    assert_eq!(report.succeeded, vec![give.root()]);
    assert_eq!(world.inventory(alice).len(), 1);
}

#[test]
fn test_applies_the_configured_failure_policy() {
    let config: ScenarioConfig =
        config::from_str(r#"{ "evaluator": { "failure_policy": "abort" } }"#).unwrap();
    let bus = Arc::new(EventBus::new(config.event_buffer_size));
    let (_, mut errors) = bus.subscribe();
    let dispatcher = Dispatcher::new(
        Evaluator::from_config(&config.evaluator),
        config.evaluator.failure_policy,
    )
    .with_event_bus(bus.clone());
    assert_eq!(config.evaluator.failure_policy, FailurePolicy::Abort);

    let mut world = sandbox();
    let tree = build(&world, &["[PREFAB]giveItemAction", "{amount}[VALUE]1"]);
    let item = tree.resolve_path(&["item"]).unwrap();

    let result = dispatcher.dispatch(&tree, &[], &[tree.root()], &TriggerContext::new(), &mut world);
    assert_eq!(result, Err(EvalError::Unassigned { node: item }));
    assert!(errors.try_recv().is_some());
    assert_eq!(world.item_count(), 0);
}

use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scenario_tree::{
    sandbox::SandboxWorld, Color, EvalError, Evaluator, EventBus, NodeKind, TriggerContext, Value, ValueKind,
    World, WorldEvent,
};

use super::build;

const GIVE_STONE: [&str; 5] = [
    "[PREFAB]giveBlockAction",
    "{block}[PREFAB]blockValue",
    "{block}{type}[CONST]stone",
    "{amount}[CONST]5",
    "{player}[CONST]TRIGGERING_PLAYER",
];

#[test]
fn test_gives_one_stack_of_stone_to_the_triggering_player() {
    let mut world = SandboxWorld::new();
    world.add_block("stone");
    let alice = world.add_player("Alice");
    let bob = world.add_player("Bob");
    let tree = build(&world, &GIVE_STONE);
    let context = TriggerContext::new()
        .with_event("onEnterRegion")
        .with_triggering_entity(alice.character);

    Evaluator::new()
        .on_trigger(&tree, tree.root(), &context, &mut world)
        .unwrap();

    let inventory = world.inventory(alice.character);
    assert_eq!(inventory.len(), 1);
    let stack = world.item(inventory[0]).unwrap();
    assert_eq!(stack.source, "stone");
    assert_eq!(stack.amount, 5);
    assert!(world.inventory(bob.character).is_empty());
    assert_eq!(world.item_count(), 1);
}

#[test]
fn test_repeats_side_effects_on_re_evaluation() {
    let mut world = SandboxWorld::new();
    world.add_block("stone");
    let alice = world.add_player("Alice");
    let tree = build(&world, &GIVE_STONE);
    let context = TriggerContext::new().with_triggering_entity(alice.character);
    let evaluator = Evaluator::new();

    let block = tree.resolve_path(&["block"]).unwrap();
    let first = evaluator.resolve(&tree, block, ValueKind::BlockType, &context, &world);
    evaluator.on_trigger(&tree, tree.root(), &context, &mut world).unwrap();
    evaluator.on_trigger(&tree, tree.root(), &context, &mut world).unwrap();
    let second = evaluator.resolve(&tree, block, ValueKind::BlockType, &context, &world);

    assert_eq!(first, second);
    let inventory = world.inventory(alice.character).to_vec();
    assert_eq!(inventory.len(), 2);
    assert_ne!(inventory[0], inventory[1]);
}

#[test]
fn test_broadcasts_chat_to_every_client() {
    let bus = Arc::new(EventBus::new(64));
    let (mut events, _) = bus.subscribe();
    let mut world = SandboxWorld::new().with_event_bus(bus.clone());
    let alice = world.add_player("Alice");
    let bob = world.add_player("Bob");
    let tree = build(
        &world,
        &[
            "[PREFAB]sendChatAction",
            "{message}[PREFAB]concatString",
            "{message}{first}[PREFAB]playerName",
            "{message}{second}[VALUE] found the key",
            "{owner}[VALUE]Dungeon",
        ],
    );
    let context = TriggerContext::new().with_triggering_entity(bob.character);

    Evaluator::new()
        .on_trigger(&tree, tree.root(), &context, &mut world)
        .unwrap();

    let clients: Vec<_> = world.chat_log().iter().map(|record| record.client).collect();
    assert_eq!(clients, vec![alice.client, bob.client]);
    for record in world.chat_log() {
        assert_eq!(record.message, "Bob found the key");
        assert_eq!(record.sender_name, "Dungeon");
        assert_eq!(record.color, Color::CYAN);
    }

    let mut messages = 0;
    while let Some(event) = events.try_recv() {
        if let WorldEvent::ChatMessage { message, .. } = event {
            assert_eq!(message, "Bob found the key");
            messages += 1;
        }
    }
    assert_eq!(messages, 2);
}

#[test]
fn test_logs_info_without_touching_the_world() {
    let mut world = SandboxWorld::new();
    let tree = build(
        &world,
        &[
            "[PREFAB]logInfoAction",
            "{text}[PREFAB]intToString",
            "{text}{int}[VALUE]12",
        ],
    );

    Evaluator::new()
        .on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world)
        .unwrap();

    assert_eq!(world.item_count(), 0);
    assert!(world.chat_log().is_empty());
}

#[test]
fn test_fails_a_single_invocation_on_unknown_block() {
    let mut world = SandboxWorld::new();
    let alice = world.add_player("Alice");
    let tree = build(&world, &GIVE_STONE);
    let context = TriggerContext::new().with_triggering_entity(alice.character);

    let result = Evaluator::new().on_trigger(&tree, tree.root(), &context, &mut world);
    assert_eq!(result, Err(EvalError::UnknownBlock("stone".to_string())));
    assert_eq!(world.item_count(), 0);

    world.add_block("stone");
    Evaluator::new()
        .on_trigger(&tree, tree.root(), &context, &mut world)
        .unwrap();
    assert_eq!(world.item_count(), 1);
}

#[test]
fn test_names_every_player_for_all_players() {
    let mut world = SandboxWorld::new();
    world.add_player("Alice");
    world.add_player("Bob");
    let tree = build(&world, &["[PREFAB]playerName", "{player}[VALUE]ALL_PLAYERS"]);
    assert!(matches!(
        tree.node(tree.root()).unwrap().kind(),
        NodeKind::Expression(_)
    ));

    let value = Evaluator::new().resolve(
        &tree,
        tree.root(),
        ValueKind::String,
        &TriggerContext::new(),
        &world,
    );
    assert_eq!(value, Ok(Value::String("Alice, Bob".to_string())));
    assert_eq!(world.players().len(), 2);
}

#[test]
fn test_rejects_concat_chains_nested_past_the_depth_limit() {
    let mut world = SandboxWorld::new();
    let mut entries = vec!["[PREFAB]logInfoAction".to_string()];
    entries.extend((0..500).map(|level| format!("{{text}}{}[PREFAB]concatString", "{first}".repeat(level))));
    let entries: Vec<&str> = entries.iter().map(String::as_str).collect();
    let tree = build(&world, &entries);
    let text = tree.resolve_path(&["text"]).unwrap();

    let result = Evaluator::new().resolve(&tree, text, ValueKind::String, &TriggerContext::new(), &world);
    assert!(matches!(result, Err(EvalError::TooDeep { max_depth: 64, .. })));
    assert_eq!(
        Evaluator::new().on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world),
        result.map(|_| ())
    );
    assert_eq!(tree.to_string().lines().count(), tree.walk().len());
}

proptest! {
    #[test]
    fn test_creates_exactly_n_items(n in 0u32..40) {
        let mut world = SandboxWorld::new();
        world.add_item_template("core:arrow");
        let alice = world.add_player("Alice");
        let amount = format!("{{amount}}[VALUE]{}", n);
        let tree = build(
            &world,
            &["[PREFAB]giveItemAction", "{item}[VALUE]core:arrow", amount.as_str()],
        );
        let context = TriggerContext::new().with_triggering_entity(alice.character);

        Evaluator::new()
            .on_trigger(&tree, tree.root(), &context, &mut world)
            .unwrap();

        let inventory = world.inventory(alice.character).to_vec();
        prop_assert_eq!(inventory.len(), n as usize);
        prop_assert_eq!(world.item_count(), n as usize);
        for item in inventory {
            prop_assert_eq!(world.item(item).map(|record| record.amount), Some(1));
        }
    }
}

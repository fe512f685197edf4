use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::select;
use scenario_tree::{
    encode, sandbox::SandboxWorld, Comparator, Literal, PlayerRef, RegionBinding, ValueKind,
};
use strum::IntoEnumIterator;

use super::build;

fn arena_world() -> SandboxWorld {
    let mut world = SandboxWorld::new();
    for network_id in 0..5 {
        world.add_region(network_id, format!("region-{}", network_id));
    }
    world
}

fn literal_strategy(world: &SandboxWorld) -> impl Strategy<Value = Literal> {
    let regions: Vec<_> = (0..10)
        .map(|network_id| Literal::parse(ValueKind::RegionRef, &network_id.to_string(), world).unwrap())
        .collect();
    prop_oneof![
        any::<i64>().prop_map(Literal::Integer),
        "[^\n]*".prop_map(Literal::String),
        "[a-z]{1,8}:[a-z]{1,8}".prop_map(Literal::BlockType),
        "[a-z]{1,8}:[a-z]{1,8}".prop_map(Literal::ItemTemplateRef),
        select(PlayerRef::iter().collect::<Vec<_>>()).prop_map(Literal::PlayerRef),
        select(Comparator::iter().collect::<Vec<_>>()).prop_map(Literal::Comparator),
        select(regions),
    ]
}

#[test]
fn test_binds_known_regions_only() {
    let world = arena_world();
    let known = Literal::parse(ValueKind::RegionRef, "3", &world).unwrap();
    let unknown = Literal::parse(ValueKind::RegionRef, "9", &world).unwrap();
    assert!(matches!(known, Literal::RegionRef(RegionBinding::Bound { network_id: 3, .. })));
    assert_eq!(unknown, Literal::RegionRef(RegionBinding::Unresolved { network_id: 9 }));
}

proptest! {
    #[test]
    fn test_reparses_every_literal_kind(literal in literal_strategy(&arena_world())) {
        let world = arena_world();
        let reparsed = Literal::parse(literal.kind(), &literal.to_string(), &world).unwrap();
        prop_assert_eq!(reparsed, literal);
    }

    #[test]
    fn test_places_every_entry_at_its_key_path(
        message in "[a-zA-Z0-9 !?.\\[\\]]{0,24}",
        owner in "[a-zA-Z ]{0,12}",
        count in any::<i64>(),
    ) {
        let world = arena_world();
        let message_entry = format!("{{message}}{{first}}[VALUE]{}", message);
        let count_entry = format!("{{message}}{{second}}{{int}}[VALUE]{}", count);
        let owner_entry = format!("{{owner}}[VALUE]{}", owner);
        let tree = build(
            &world,
            &[
                "[PREFAB]sendChatAction",
                "{message}[PREFAB]concatString",
                message_entry.as_str(),
                "{message}{second}[PREFAB]intToString",
                count_entry.as_str(),
                owner_entry.as_str(),
            ],
        );

        let template_at = |path: &[&str]| {
            tree.resolve_path(path)
                .and_then(|id| tree.get(id))
                .map(|node| node.template().to_string())
        };
        prop_assert_eq!(template_at(&["message"]), Some("concatString".to_string()));
        prop_assert_eq!(template_at(&["message", "second"]), Some("intToString".to_string()));
        prop_assert_eq!(template_at(&["message", "second", "int"]), Some("integerValue".to_string()));

        let literal_at = |path: &[&str]| {
            tree.resolve_path(path)
                .and_then(|id| tree.get(id))
                .and_then(|node| node.literal().cloned())
        };
        prop_assert_eq!(literal_at(&["message", "first"]), Some(Literal::String(message.clone())));
        prop_assert_eq!(literal_at(&["message", "second", "int"]), Some(Literal::Integer(count)));
        prop_assert_eq!(literal_at(&["owner"]), Some(Literal::String(owner.clone())));

        let encoded = encode(&tree).unwrap();
        let lines: Vec<&str> = encoded.iter().map(String::as_str).collect();
        let rebuilt = build(&world, &lines);
        prop_assert_eq!(encode(&rebuilt).unwrap(), encoded);
        prop_assert_eq!(rebuilt.walk().len(), tree.walk().len());
    }
}

use tracing::{debug, info};

use super::context::TriggerContext;
use super::resolver::{Resolver, DEFAULT_MAX_DEPTH};
use super::value::Value;
use super::{EvalError, EvalResult};
use crate::config::{EvaluatorConfig, DEFAULT_CHAT_TEMPLATE};
use crate::node::{ActionKind, ConditionKind, NodeId, NodeKind, ScenarioTree, ValueKind};
use crate::world::{Color, World};

/// Performs scenario actions.
///
/// Every argument slot of an action is resolved before the first side effect,
/// so an invocation either fails without touching the world or runs to the
/// end.
#[derive(Debug, Clone)]
pub struct Evaluator {
    chat_template: String,
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            chat_template: DEFAULT_CHAT_TEMPLATE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EvaluatorConfig) -> Self {
        Self {
            chat_template: config.chat_template.clone(),
            max_depth: config.max_depth,
        }
    }

    /// Resolves a single value request without side effects.
    pub fn resolve(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        request: ValueKind,
        context: &TriggerContext,
        world: &dyn World,
    ) -> EvalResult<Value> {
        self.resolver(tree, context, world).resolve(node, request)
    }

    fn resolver<'a>(
        &self,
        tree: &'a ScenarioTree,
        context: &'a TriggerContext,
        world: &'a dyn World,
    ) -> Resolver<'a> {
        Resolver::new(tree, context, world).with_max_depth(self.max_depth)
    }

    #[tracing::instrument(level = "debug", skip(self, tree, context, world), fields(tree = %tree.id()))]
    pub fn on_trigger(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        context: &TriggerContext,
        world: &mut dyn World,
    ) -> EvalResult<()> {
        let kind = tree.node(node)?.kind();
        let NodeKind::Action(action) = kind else {
            return Err(EvalError::NotAnAction { node, kind });
        };
        match action {
            ActionKind::GiveBlock => self.give_block(tree, node, context, world),
            ActionKind::GiveItem => self.give_item(tree, node, context, world),
            ActionKind::LogInfo => self.log_info(tree, node, context, world),
            ActionKind::SendChat => self.send_chat(tree, node, context, world),
        }
    }

    pub fn evaluate_condition(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        context: &TriggerContext,
        world: &dyn World,
    ) -> EvalResult<bool> {
        let kind = tree.node(node)?.kind();
        let NodeKind::Condition(condition) = kind else {
            return Err(EvalError::NotACondition { node, kind });
        };
        let resolver = self.resolver(tree, context, world);
        match condition {
            ConditionKind::IntComparison => {
                let first = resolver.integer(node, "first")?;
                let comparator = resolver.comparator(node, "comparator")?;
                let second = resolver.integer(node, "second")?;
                let holds = comparator.compare(first, second);
                debug!(%node, first, %comparator, second, holds, "condition evaluated");
                Ok(holds)
            }
        }
    }

    fn give_block(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        context: &TriggerContext,
        world: &mut dyn World,
    ) -> EvalResult<()> {
        let (family, amount, receivers) = {
            let resolver = self.resolver(tree, context, &*world);
            let family = resolver.block(node, "block")?;
            let amount = amount(&resolver, node)?;
            let player = resolver.player(node, "player")?;
            (family, amount, resolver.recipients(player)?)
        };
        if amount == 0 {
            return Ok(());
        }
        for receiver in receivers {
            let item = world.create_block_item(&family, amount);
            world.give_item(item, receiver);
            debug!(block = %family.uri, amount, %item, %receiver, "gave block");
        }
        Ok(())
    }

    fn give_item(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        context: &TriggerContext,
        world: &mut dyn World,
    ) -> EvalResult<()> {
        let (template, amount, player) = {
            let resolver = self.resolver(tree, context, &*world);
            let template = resolver.item_template(node, "item")?;
            let amount = amount(&resolver, node)?;
            let player = resolver.player(node, "player")?;
            resolver.recipients(player)?;
            (template, amount, player)
        };
        for _ in 0..amount {
            // Recipients are looked up again for every item.
            let receivers = self.resolver(tree, context, &*world).recipients(player)?;
            for receiver in receivers {
                let item = world.create_item(&template);
                world.give_item(item, receiver);
            }
        }
        debug!(template = %template.uri, amount, %player, "gave items");
        Ok(())
    }

    fn log_info(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        context: &TriggerContext,
        world: &mut dyn World,
    ) -> EvalResult<()> {
        let text = self.resolver(tree, context, &*world).string(node, "text")?;
        info!(target: "scenario", "{}", text);
        Ok(())
    }

    fn send_chat(
        &self,
        tree: &ScenarioTree,
        node: NodeId,
        context: &TriggerContext,
        world: &mut dyn World,
    ) -> EvalResult<()> {
        let (message, owner) = {
            let resolver = self.resolver(tree, context, &*world);
            (resolver.string(node, "message")?, resolver.string(node, "owner")?)
        };
        let sender = world
            .create_chat_sender(&self.chat_template, &owner, Color::CYAN)
            .ok_or_else(|| EvalError::UnknownTemplate(self.chat_template.clone()))?;
        let clients = world.clients();
        for client in &clients {
            world.send_chat(*client, &message, sender);
        }
        debug!(%sender, %owner, clients = clients.len(), "chat broadcast");
        Ok(())
    }
}

fn amount(resolver: &Resolver<'_>, node: NodeId) -> EvalResult<u32> {
    let amount = resolver.integer(node, "amount")?;
    u32::try_from(amount).map_err(|_| EvalError::InvalidAmount {
        node: resolver.slot(node, "amount").unwrap_or(node),
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::TreeBuilder;
    use crate::literal::PlayerRef;
    use crate::sandbox::SandboxWorld;
    use crate::template::TemplateCatalog;
    use crate::world::{BlockFamily, EntityId, MockWorld};
    use mockall::predicate;
    use pretty_assertions::assert_eq;

    fn build(world: &dyn World, constructions: &[&str]) -> ScenarioTree {
        TreeBuilder::new(&TemplateCatalog::with_builtins(), world)
            .build(constructions)
            .unwrap()
    }

    fn stone_world() -> MockWorld {
        let mut world = MockWorld::new();
        world.expect_regions().returning(Vec::new);
        world
            .expect_block_family()
            .returning(|uri| Some(BlockFamily { uri: uri.to_string() }));
        world
    }

    #[test]
    fn test_give_block_to_triggering_player() {
        let player = EntityId::new(1);
        let stack = EntityId::new(100);
        let tree = build(
            &stone_world(),
            &[
                "[PREFAB]giveBlockAction",
                "{block}[PREFAB]blockValue",
                "{block}{type}[CONST]stone",
                "{amount}[CONST]5",
                "{player}[CONST]TRIGGERING_PLAYER",
            ],
        );

        let mut world = stone_world();
        world
            .expect_create_block_item()
            .with(
                predicate::eq(BlockFamily {
                    uri: "stone".to_string(),
                }),
                predicate::eq(5),
            )
            .times(1)
            .returning(move |_, _| stack);
        world
            .expect_give_item()
            .with(predicate::eq(stack), predicate::eq(player))
            .times(1)
            .return_const(());

        let context = TriggerContext::new().with_triggering_entity(player);
        Evaluator::new()
            .on_trigger(&tree, tree.root(), &context, &mut world)
            .unwrap();
    }

    #[test]
    fn test_failed_resolution_has_no_side_effects() {
        let tree = build(
            &stone_world(),
            &["[PREFAB]giveBlockAction", "{block}{type}[VALUE]stone", "{amount}[VALUE]2"],
        );

        // Missing trigger info is only discovered after the block resolved.
        let mut world = stone_world();
        world.expect_create_block_item().never();
        world.expect_give_item().never();
        let result = Evaluator::new().on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world);
        assert!(matches!(result, Err(EvalError::MissingTriggerInfo { .. })));

        let mut world = MockWorld::new();
        world.expect_block_family().returning(|_| None);
        world.expect_create_block_item().never();
        let context = TriggerContext::new().with_triggering_entity(EntityId::new(1));
        let result = Evaluator::new().on_trigger(&tree, tree.root(), &context, &mut world);
        assert_eq!(result, Err(EvalError::UnknownBlock("stone".to_string())));
    }

    #[test]
    fn test_give_item_creates_one_entity_per_unit() {
        let mut world = SandboxWorld::new();
        world.add_item_template("core:pickaxe");
        let alice = world.add_player("Alice");
        let tree = build(
            &world,
            &["[PREFAB]giveItemAction", "{item}[VALUE]core:pickaxe", "{amount}[VALUE]3"],
        );
        let context = TriggerContext::new().with_triggering_entity(alice.character);

        Evaluator::new()
            .on_trigger(&tree, tree.root(), &context, &mut world)
            .unwrap();

        let inventory = world.inventory(alice.character).to_vec();
        assert_eq!(inventory.len(), 3);
        for item in inventory {
            assert_eq!(world.item(item).map(|record| record.amount), Some(1));
        }
    }

    #[test]
    fn test_all_players_receive_blocks() {
        let mut world = SandboxWorld::new();
        world.add_block("core:dirt");
        let alice = world.add_player("Alice");
        let bob = world.add_player("Bob");
        let tree = build(
            &world,
            &[
                "[PREFAB]giveBlockAction",
                "{block}{type}[VALUE]core:dirt",
                "{amount}[VALUE]4",
                "{player}[VALUE]ALL_PLAYERS",
            ],
        );

        Evaluator::new()
            .on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world)
            .unwrap();

        for player in [alice.character, bob.character] {
            let inventory = world.inventory(player);
            assert_eq!(inventory.len(), 1);
            assert_eq!(world.item(inventory[0]).map(|record| record.amount), Some(4));
        }
    }

    #[test]
    fn test_amount_bounds() {
        let mut world = SandboxWorld::new();
        world.add_item_template("core:apple");
        let alice = world.add_player("Alice");
        let context = TriggerContext::new().with_triggering_entity(alice.character);

        let tree = build(
            &world,
            &["[PREFAB]giveItemAction", "{item}[VALUE]core:apple", "{amount}[VALUE]0"],
        );
        Evaluator::new()
            .on_trigger(&tree, tree.root(), &context, &mut world)
            .unwrap();
        assert_eq!(world.item_count(), 0);

        let tree = build(
            &world,
            &["[PREFAB]giveItemAction", "{item}[VALUE]core:apple", "{amount}[VALUE]-2"],
        );
        let amount = tree.resolve_path(&["amount"]).unwrap();
        assert_eq!(
            Evaluator::new().on_trigger(&tree, tree.root(), &context, &mut world),
            Err(EvalError::InvalidAmount { node: amount, amount: -2 })
        );
        assert_eq!(world.item_count(), 0);
    }

    #[test]
    fn test_send_chat_broadcasts_to_every_client() {
        let mut world = SandboxWorld::new();
        let alice = world.add_player("Alice");
        let bob = world.add_player("Bob");
        let tree = build(
            &world,
            &[
                "[PREFAB]sendChatAction",
                "{message}[VALUE]The gate opens",
                "{owner}[VALUE]Gatekeeper",
            ],
        );

        Evaluator::new()
            .on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world)
            .unwrap();

        let log = world.chat_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].client, alice.client);
        assert_eq!(log[1].client, bob.client);
        for record in log {
            assert_eq!(record.message, "The gate opens");
            assert_eq!(record.sender_name, "Gatekeeper");
            assert_eq!(record.color, Color::CYAN);
        }
    }

    #[test]
    fn test_send_chat_with_unknown_template() {
        let mut world = SandboxWorld::new();
        let tree = build(&world, &["[PREFAB]sendChatAction"]);
        let evaluator = Evaluator::from_config(&EvaluatorConfig {
            chat_template: "scenario:missing".to_string(),
            ..Default::default()
        });
        assert_eq!(
            evaluator.on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world),
            Err(EvalError::UnknownTemplate("scenario:missing".to_string()))
        );
    }

    #[test]
    fn test_log_info_and_non_actions() {
        let mut world = SandboxWorld::new();
        let tree = build(&world, &["[PREFAB]logInfoAction", "{text}[VALUE]hello"]);
        Evaluator::new()
            .on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world)
            .unwrap();

        let text = tree.resolve_path(&["text"]).unwrap();
        assert!(matches!(
            Evaluator::new().on_trigger(&tree, text, &TriggerContext::new(), &mut world),
            Err(EvalError::NotAnAction { .. })
        ));
    }

    #[test]
    fn test_int_comparison() {
        let world = SandboxWorld::new();
        let evaluator = Evaluator::new();
        let context = TriggerContext::new();

        let tree = build(
            &world,
            &[
                "[PREFAB]intComparison",
                "{first}[VALUE]3",
                "{comparator}[VALUE]LESS_THAN",
                "{second}[VALUE]10",
            ],
        );
        assert_eq!(evaluator.evaluate_condition(&tree, tree.root(), &context, &world), Ok(true));

        let tree = build(&world, &["[PREFAB]intComparison", "{first}[VALUE]3"]);
        assert_eq!(evaluator.evaluate_condition(&tree, tree.root(), &context, &world), Ok(false));

        let tree = build(&world, &["[PREFAB]logInfoAction"]);
        assert!(matches!(
            evaluator.evaluate_condition(&tree, tree.root(), &context, &world),
            Err(EvalError::NotACondition { .. })
        ));
    }

    #[test]
    fn test_max_depth_comes_from_config() {
        let mut world = SandboxWorld::new();
        let tree = build(
            &world,
            &[
                "[PREFAB]logInfoAction",
                "{text}[PREFAB]concatString",
                "{text}{first}[PREFAB]intToString",
            ],
        );
        let evaluator = Evaluator::from_config(&EvaluatorConfig {
            max_depth: 2,
            ..Default::default()
        });
        let int = tree.resolve_path(&["text", "first", "int"]).unwrap();
        assert_eq!(
            evaluator.on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world),
            Err(EvalError::TooDeep { node: int, max_depth: 2 })
        );
        Evaluator::new()
            .on_trigger(&tree, tree.root(), &TriggerContext::new(), &mut world)
            .unwrap();
    }

    #[test]
    fn test_resolve_player_reference() {
        let world = SandboxWorld::new();
        let tree = build(&world, &["[PREFAB]playerValue", "[VALUE]ALL_PLAYERS"]);
        assert_eq!(
            Evaluator::new().resolve(&tree, tree.root(), ValueKind::PlayerRef, &TriggerContext::new(), &world),
            Ok(Value::Player(PlayerRef::AllPlayers))
        );
    }
}

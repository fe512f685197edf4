use std::cell::Cell;

use tracing::debug;

use super::context::TriggerContext;
use super::value::Value;
use super::{EvalError, EvalResult};
use crate::literal::{Comparator, Literal, PlayerRef, RegionBinding};
use crate::node::{ExpressionKind, NodeId, NodeKind, ScenarioTree, ValueKind};
use crate::world::{BlockFamily, EntityId, ItemTemplate, RegionInfo, World};

/// Nesting limit for value requests sent through expression slots.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Answers typed evaluation requests against one tree and one trigger.
///
/// A request names the value-kind the caller wants. Value leaves answer from
/// their literal; expression nodes answer by sending further requests to
/// their own slots. Nothing here mutates the tree or the world.
pub struct Resolver<'a> {
    tree: &'a ScenarioTree,
    context: &'a TriggerContext,
    world: &'a dyn World,
    max_depth: usize,
    depth: Cell<usize>,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a ScenarioTree, context: &'a TriggerContext, world: &'a dyn World) -> Self {
        Self {
            tree,
            context,
            world,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: Cell::new(0),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Fails with [`EvalError::TooDeep`] once requests nest past the
    /// configured depth.
    pub fn resolve(&self, node: NodeId, request: ValueKind) -> EvalResult<Value> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(EvalError::TooDeep {
                node,
                max_depth: self.max_depth,
            });
        }
        self.depth.set(depth + 1);
        let result = self.resolve_node(node, request);
        self.depth.set(depth);
        result
    }

    fn resolve_node(&self, node: NodeId, request: ValueKind) -> EvalResult<Value> {
        let target = self.tree.node(node)?;
        let value = match target.kind() {
            NodeKind::Value(kind) => {
                self.check_kind(node, request, kind)?;
                let literal = target.literal().ok_or(EvalError::Unassigned { node })?;
                self.resolve_literal(literal)?
            }
            NodeKind::Expression(kind) => {
                self.check_kind(node, request, kind.output())?;
                self.resolve_expression(node, kind)?
            }
            kind => return Err(EvalError::NotAValue { node, kind }),
        };
        debug!(%node, %request, %value, "resolved");
        Ok(value)
    }

    /// The child bound at `slot` of `node`.
    pub fn slot(&self, node: NodeId, slot: &str) -> EvalResult<NodeId> {
        self.tree
            .child(node, slot)
            .ok_or_else(|| EvalError::MissingArgument {
                node,
                slot: slot.to_string(),
            })
    }

    pub fn resolve_slot(&self, node: NodeId, slot: &str, request: ValueKind) -> EvalResult<Value> {
        self.resolve(self.slot(node, slot)?, request)
    }

    pub fn integer(&self, node: NodeId, slot: &str) -> EvalResult<i64> {
        self.typed(node, slot, ValueKind::Integer)
    }

    pub fn string(&self, node: NodeId, slot: &str) -> EvalResult<String> {
        self.typed(node, slot, ValueKind::String)
    }

    pub fn block(&self, node: NodeId, slot: &str) -> EvalResult<BlockFamily> {
        self.typed(node, slot, ValueKind::BlockType)
    }

    pub fn item_template(&self, node: NodeId, slot: &str) -> EvalResult<ItemTemplate> {
        self.typed(node, slot, ValueKind::ItemTemplateRef)
    }

    pub fn player(&self, node: NodeId, slot: &str) -> EvalResult<PlayerRef> {
        self.typed(node, slot, ValueKind::PlayerRef)
    }

    pub fn region(&self, node: NodeId, slot: &str) -> EvalResult<RegionInfo> {
        self.typed(node, slot, ValueKind::RegionRef)
    }

    pub fn comparator(&self, node: NodeId, slot: &str) -> EvalResult<Comparator> {
        self.typed(node, slot, ValueKind::Comparator)
    }

    /// Entities a player reference designates for this trigger.
    pub fn recipients(&self, player: PlayerRef) -> EvalResult<Vec<EntityId>> {
        match player {
            PlayerRef::TriggeringPlayer => Ok(vec![self.context.triggering_entity()?]),
            PlayerRef::AllPlayers => Ok(self.world.players()),
        }
    }

    fn typed<T: TryFrom<Value, Error = Value>>(&self, node: NodeId, slot: &str, request: ValueKind) -> EvalResult<T> {
        let child = self.slot(node, slot)?;
        T::try_from(self.resolve(child, request)?).map_err(|value| EvalError::TypeMismatch {
            node: child,
            expected: request,
            found: value.kind(),
        })
    }

    fn check_kind(&self, node: NodeId, expected: ValueKind, found: ValueKind) -> EvalResult<()> {
        if expected == found {
            Ok(())
        } else {
            Err(EvalError::TypeMismatch { node, expected, found })
        }
    }

    fn resolve_literal(&self, literal: &Literal) -> EvalResult<Value> {
        Ok(match literal {
            Literal::Integer(value) => Value::Integer(*value),
            Literal::String(value) => Value::String(value.clone()),
            Literal::BlockType(uri) => Value::Block(
                self.world
                    .block_family(uri)
                    .ok_or_else(|| EvalError::UnknownBlock(uri.clone()))?,
            ),
            Literal::ItemTemplateRef(uri) => Value::ItemTemplate(
                self.world
                    .item_template(uri)
                    .ok_or_else(|| EvalError::UnknownItemTemplate(uri.clone()))?,
            ),
            Literal::PlayerRef(player) => Value::Player(*player),
            Literal::Comparator(comparator) => Value::Comparator(*comparator),
            Literal::RegionRef(RegionBinding::Unresolved { network_id }) => {
                return Err(EvalError::UnresolvedRegion {
                    network_id: *network_id,
                })
            }
            // The binding does not keep the region alive; check it still exists.
            Literal::RegionRef(RegionBinding::Bound { network_id, entity }) => Value::Region(
                self.world
                    .regions()
                    .into_iter()
                    .find(|region| region.entity == *entity)
                    .ok_or(EvalError::RegionGone {
                        network_id: *network_id,
                        entity: *entity,
                    })?,
            ),
        })
    }

    fn resolve_expression(&self, node: NodeId, kind: ExpressionKind) -> EvalResult<Value> {
        match kind {
            ExpressionKind::BlockOfType => self.block(node, "type").map(Value::Block),
            ExpressionKind::ConcatString => {
                let first = self.string(node, "first")?;
                let second = self.string(node, "second")?;
                Ok(Value::String(first + &second))
            }
            ExpressionKind::IntToString => {
                self.integer(node, "int").map(|value| Value::String(value.to_string()))
            }
            ExpressionKind::PlayerName => {
                let player = self.player(node, "player")?;
                let names = self
                    .recipients(player)?
                    .into_iter()
                    .map(|entity| {
                        self.world
                            .display_name(entity)
                            .ok_or(EvalError::NoDisplayName(entity))
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::String(names.join(", ")))
            }
            ExpressionKind::RegionName => self
                .region(node, "region")
                .map(|region| Value::String(region.name)),
        }
    }
}

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::literal::Literal;

/// Index of a node inside its [`ScenarioTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    GiveBlock,
    GiveItem,
    LogInfo,
    SendChat,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Integer,
    String,
    BlockType,
    ItemTemplateRef,
    PlayerRef,
    RegionRef,
    Comparator,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpressionKind {
    /// The block family named by the `type` slot.
    BlockOfType,
    ConcatString,
    IntToString,
    PlayerName,
    RegionName,
}

impl ExpressionKind {
    /// Value-kind every expression of this kind resolves to.
    pub fn output(self) -> ValueKind {
        match self {
            ExpressionKind::BlockOfType => ValueKind::BlockType,
            ExpressionKind::ConcatString
            | ExpressionKind::IntToString
            | ExpressionKind::PlayerName
            | ExpressionKind::RegionName => ValueKind::String,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionKind {
    IntComparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Action(ActionKind),
    Value(ValueKind),
    Expression(ExpressionKind),
    Condition(ConditionKind),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Action(kind) => write!(f, "action:{}", kind),
            NodeKind::Value(kind) => write!(f, "value:{}", kind),
            NodeKind::Expression(kind) => write!(f, "expression:{}", kind),
            NodeKind::Condition(kind) => write!(f, "condition:{}", kind),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Slot '{slot}' is not declared by template '{template}'")]
    UnknownSlot { template: String, slot: String },
    #[error("Node {node} of kind {kind} cannot hold a literal")]
    NotAValueNode { node: NodeId, kind: NodeKind },
    #[error("Literal of kind {found} does not fit node {node} of kind {expected}")]
    LiteralKindMismatch {
        node: NodeId,
        expected: ValueKind,
        found: ValueKind,
    },
}

/// One element of a scenario tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    template: String,
    slots: Vec<String>,
    arguments: HashMap<String, NodeId>,
    literal: Option<Literal>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, template: impl Into<String>, slots: Vec<String>) -> Self {
        Self {
            kind,
            template: template.into(),
            slots,
            arguments: HashMap::new(),
            literal: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Name of the template this node was instantiated from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Slot names declared by the template, in declaration order.
    pub fn declared_slots(&self) -> &[String] {
        &self.slots
    }

    pub fn declares(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s == slot)
    }

    pub fn argument(&self, slot: &str) -> Option<NodeId> {
        self.arguments.get(slot).copied()
    }

    /// Populated slots in declaration order.
    pub fn arguments(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| self.arguments.get(slot).map(|id| (slot.as_str(), *id)))
    }

    pub fn literal(&self) -> Option<&Literal> {
        self.literal.as_ref()
    }
}

/// Arena holding every node of one built scenario object.
///
/// Only the builder mutates a tree; evaluation borrows it immutably.
#[derive(Debug, Clone)]
pub struct ScenarioTree {
    id: Uuid,
    nodes: Vec<Node>,
    root: NodeId,
}

impl ScenarioTree {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    /// Number of nodes in the arena, including replaced template defaults.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child(&self, parent: NodeId, slot: &str) -> Option<NodeId> {
        self.get(parent).and_then(|node| node.argument(slot))
    }

    /// Walks `path` from the root, one slot per key.
    pub fn resolve_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root, |current, key| self.child(current, key.as_ref()))
    }

    /// Nodes reachable from the root in pre-order, with their key paths.
    pub fn walk(&self) -> Vec<(Vec<String>, NodeId)> {
        let mut out = Vec::new();
        let mut stack = vec![(Vec::new(), self.root)];
        while let Some((path, id)) = stack.pop() {
            if let Some(node) = self.get(id) {
                let children: Vec<_> = node.arguments().collect();
                for (slot, child) in children.into_iter().rev() {
                    let mut child_path = path.clone();
                    child_path.push(slot.to_string());
                    stack.push((child_path, child));
                }
            }
            out.push((path, id));
        }
        out
    }

    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Installs `child` into `parent`'s slot, returning the node it replaced.
    pub(crate) fn set_argument(
        &mut self,
        parent: NodeId,
        slot: &str,
        child: NodeId,
    ) -> Result<Option<NodeId>, TreeError> {
        let node = self
            .nodes
            .get_mut(parent.0)
            .ok_or(TreeError::NodeNotFound(parent))?;
        if !node.declares(slot) {
            return Err(TreeError::UnknownSlot {
                template: node.template.clone(),
                slot: slot.to_string(),
            });
        }
        Ok(node.arguments.insert(slot.to_string(), child))
    }

    pub(crate) fn set_literal(&mut self, id: NodeId, literal: Literal) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(id.0).ok_or(TreeError::NodeNotFound(id))?;
        match node.kind {
            NodeKind::Value(expected) if expected == literal.kind() => {
                node.literal = Some(literal);
                Ok(())
            }
            NodeKind::Value(expected) => Err(TreeError::LiteralKindMismatch {
                node: id,
                expected,
                found: literal.kind(),
            }),
            kind => Err(TreeError::NotAValueNode { node: id, kind }),
        }
    }

}

impl fmt::Display for ScenarioTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, None, 0)];
        while let Some((id, slot, depth)) = stack.pop() {
            write!(f, "{:indent$}", "", indent = depth * 2)?;
            if let Some(slot) = slot {
                write!(f, "{}: ", slot)?;
            }
            let Some(node) = self.get(id) else {
                writeln!(f, "<missing {}>", id)?;
                continue;
            };
            write!(f, "{} {} [{}]", node.template, id, node.kind)?;
            match &node.literal {
                Some(literal) => writeln!(f, " = {}", literal)?,
                None => writeln!(f)?,
            }
            let children: Vec<_> = node.arguments().collect();
            for (slot, child) in children.into_iter().rev() {
                stack.push((child, Some(slot), depth + 1));
            }
        }
        Ok(())
    }
}

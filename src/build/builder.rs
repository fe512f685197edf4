use tracing::{debug, info};

use super::parser::{Construction, Segment};
use super::{BuildError, BuildResult};
use crate::literal::Literal;
use crate::node::{Node, NodeId, NodeKind, ScenarioTree};
use crate::template::TemplateRegistry;
use crate::world::World;

pub const DEFAULT_MAX_TEMPLATE_DEPTH: usize = 32;

/// Rebuilds scenario trees from their flat construction strings.
///
/// Entry 0 names the root template. Every later entry walks its `{key}` path
/// from the root through nodes that already exist, then either instantiates a
/// sub-template into the last slot (`[PREFAB]name`) or assigns a literal to
/// the leaf at the end of the path (`[anything]value`).
pub struct TreeBuilder<'a> {
    templates: &'a dyn TemplateRegistry,
    world: &'a dyn World,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(templates: &'a dyn TemplateRegistry, world: &'a dyn World) -> Self {
        Self {
            templates,
            world,
            max_depth: DEFAULT_MAX_TEMPLATE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[tracing::instrument(level = "debug", skip_all, fields(entries = constructions.len()))]
    pub fn build<S: AsRef<str>>(&self, constructions: &[S]) -> BuildResult<ScenarioTree> {
        let (first, rest) = constructions
            .split_first()
            .ok_or(BuildError::EmptyConstruction)?;

        let root_template = match parse_entry(0, first.as_ref())? {
            Construction {
                path,
                segment: Segment::Template(name),
            } if path.is_empty() => name,
            _ => {
                return Err(BuildError::RootNotTemplate {
                    found: first.as_ref().to_string(),
                })
            }
        };

        let mut tree = ScenarioTree::new();
        let root = self.instantiate(&mut tree, 0, &root_template, 0)?;
        tree.set_root(root);

        for (offset, raw) in rest.iter().enumerate() {
            let entry = offset + 1;
            let construction = parse_entry(entry, raw.as_ref())?;
            self.apply(&mut tree, entry, construction)?;
        }

        info!(tree = %tree.id(), root = %root_template, nodes = tree.len(), "scenario tree built");
        Ok(tree)
    }

    fn apply(&self, tree: &mut ScenarioTree, entry: usize, construction: Construction) -> BuildResult<()> {
        let Construction { path, segment } = construction;
        let root = tree.root();
        let Some((last, parents)) = path.split_last() else {
            return match segment {
                Segment::Template(name) => Err(BuildError::MissingSlotKey { entry, name }),
                Segment::Literal { value, .. } => self.assign_constant(tree, entry, root, &value),
            };
        };

        let mut parent = root;
        for (depth, key) in parents.iter().enumerate() {
            parent = tree.child(parent, key).ok_or_else(|| BuildError::UnresolvedPath {
                entry,
                path: path[..=depth].to_vec(),
            })?;
        }

        match segment {
            Segment::Template(name) => {
                let child = self.instantiate(tree, entry, &name, 0)?;
                let replaced = tree
                    .set_argument(parent, last, child)
                    .map_err(|e| BuildError::from_tree(entry, e))?;
                debug!(entry, slot = %last, template = %name, ?replaced, "installed sub-template");
                Ok(())
            }
            Segment::Literal { value, .. } => {
                let target = tree
                    .child(parent, last)
                    .ok_or_else(|| BuildError::UnresolvedPath {
                        entry,
                        path: path.clone(),
                    })?;
                self.assign_constant(tree, entry, target, &value)
            }
        }
    }

    /// Creates a node from `name` and, recursively, its slot defaults.
    fn instantiate(&self, tree: &mut ScenarioTree, entry: usize, name: &str, depth: usize) -> BuildResult<NodeId> {
        if depth > self.max_depth {
            return Err(BuildError::TemplateRecursion {
                entry,
                name: name.to_string(),
                max_depth: self.max_depth,
            });
        }
        let template = self
            .templates
            .template_by_name(name)
            .ok_or_else(|| BuildError::UnknownTemplate {
                entry,
                name: name.to_string(),
            })?;

        let id = tree.insert(Node::new(template.kind, &template.name, template.slot_names()));

        for slot in &template.slots {
            if let Some(default) = &slot.default {
                let child = self.instantiate(tree, entry, default, depth + 1)?;
                tree.set_argument(id, &slot.name, child)
                    .map_err(|e| BuildError::from_tree(entry, e))?;
            }
        }
        if let Some(literal) = &template.default_literal {
            self.assign_constant(tree, entry, id, literal)?;
        }
        Ok(id)
    }

    /// Interprets `value` according to the target leaf's value-kind and
    /// stores it on the leaf.
    fn assign_constant(&self, tree: &mut ScenarioTree, entry: usize, target: NodeId, value: &str) -> BuildResult<()> {
        let kind = tree
            .node(target)
            .map_err(|e| BuildError::from_tree(entry, e))?
            .kind();
        let NodeKind::Value(value_kind) = kind else {
            return Err(BuildError::NotAValueNode {
                entry,
                kind,
                literal: value.to_string(),
            });
        };
        let literal = Literal::parse(value_kind, value, self.world)
            .map_err(|source| BuildError::Literal { entry, source })?;
        tree.set_literal(target, literal)
            .map_err(|e| BuildError::from_tree(entry, e))
    }
}

fn parse_entry(entry: usize, raw: &str) -> BuildResult<Construction> {
    Construction::parse(raw).map_err(|source| BuildError::MalformedConstruction { entry, source })
}

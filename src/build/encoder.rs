use super::parser::Construction;
use super::{BuildError, BuildResult};
use crate::node::ScenarioTree;

const RESERVED: [char; 4] = ['{', '}', '[', ']'];

/// Produces the canonical construction list of `tree`.
///
/// Reachable nodes are emitted in pre-order: every populated slot as a
/// `[PREFAB]` entry followed, for assigned leaves, by a literal entry.
/// Building the result again yields a tree with the same templates, slot
/// placement and literals.
pub fn encode(tree: &ScenarioTree) -> BuildResult<Vec<String>> {
    let mut out = Vec::new();
    for (path, id) in tree.walk() {
        if let Some(key) = path.iter().find(|key| key.is_empty() || key.contains(&RESERVED[..])) {
            return Err(BuildError::ReservedCharacter { key: key.clone() });
        }
        let node = tree.node(id).map_err(|e| BuildError::from_tree(out.len(), e))?;
        out.push(Construction::template(path.clone(), node.template()).to_string());
        if let Some(literal) = node.literal() {
            out.push(Construction::literal(path, literal.to_string()).to_string());
        }
    }
    Ok(out)
}

//! Tree Builder: construction strings in, [`ScenarioTree`](crate::node::ScenarioTree) out.

pub mod builder;
pub mod encoder;
pub mod parser;

use thiserror::Error;

use crate::literal::LiteralError;
use crate::node::{NodeKind, TreeError};

pub use builder::{TreeBuilder, DEFAULT_MAX_TEMPLATE_DEPTH};
pub use encoder::encode;
pub use parser::{Construction, ParseError, Segment, LITERAL_MARKER, TEMPLATE_MARKER};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Construction list is empty")]
    EmptyConstruction,

    #[error("Entry {entry}: {source}")]
    MalformedConstruction {
        entry: usize,
        #[source]
        source: ParseError,
    },

    #[error("Entry 0 must be a template reference, found '{found}'")]
    RootNotTemplate { found: String },

    #[error("Entry {entry}: unknown template '{name}'")]
    UnknownTemplate { entry: usize, name: String },

    #[error("Entry {entry}: key path {path:?} does not resolve to an existing node")]
    UnresolvedPath { entry: usize, path: Vec<String> },

    #[error("Entry {entry}: template '{name}' has no slot key to be installed into")]
    MissingSlotKey { entry: usize, name: String },

    #[error("Entry {entry}: slot '{slot}' is not declared by template '{template}'")]
    UnknownSlot {
        entry: usize,
        template: String,
        slot: String,
    },

    #[error("Entry {entry}: literal '{literal}' targets a {kind} node")]
    NotAValueNode {
        entry: usize,
        kind: NodeKind,
        literal: String,
    },

    #[error("Entry {entry}: template defaults of '{name}' nest deeper than {max_depth}")]
    TemplateRecursion {
        entry: usize,
        name: String,
        max_depth: usize,
    },

    #[error("Entry {entry}: {source}")]
    Literal {
        entry: usize,
        #[source]
        source: LiteralError,
    },

    #[error("Slot key '{key}' contains a reserved character")]
    ReservedCharacter { key: String },

    #[error("Entry {entry}: {source}")]
    Tree {
        entry: usize,
        #[source]
        source: TreeError,
    },
}

impl BuildError {
    pub(crate) fn from_tree(entry: usize, error: TreeError) -> Self {
        match error {
            TreeError::UnknownSlot { template, slot } => BuildError::UnknownSlot {
                entry,
                template,
                slot,
            },
            other => BuildError::Tree {
                entry,
                source: other,
            },
        }
    }
}

pub type BuildResult<T> = Result<T, BuildError>;

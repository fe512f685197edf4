use std::fmt;

use crate::literal::{Comparator, PlayerRef};
use crate::node::ValueKind;
use crate::world::{BlockFamily, ItemTemplate, RegionInfo};

/// A fully resolved argument, one variant per value-kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    String(String),
    Block(BlockFamily),
    ItemTemplate(ItemTemplate),
    Player(PlayerRef),
    Region(RegionInfo),
    Comparator(Comparator),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Block(_) => ValueKind::BlockType,
            Value::ItemTemplate(_) => ValueKind::ItemTemplateRef,
            Value::Player(_) => ValueKind::PlayerRef,
            Value::Region(_) => ValueKind::RegionRef,
            Value::Comparator(_) => ValueKind::Comparator,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Block(block) => write!(f, "{}", block.uri),
            Value::ItemTemplate(template) => write!(f, "{}", template.uri),
            Value::Player(player) => write!(f, "{}", player),
            Value::Region(region) => write!(f, "{}", region.name),
            Value::Comparator(comparator) => write!(f, "{}", comparator),
        }
    }
}

// Extraction hands the value back unchanged when the variant does not match.
macro_rules! impl_try_from_value {
    ($($variant:ident => $target:ty),* $(,)?) => {
        $(
            impl TryFrom<Value> for $target {
                type Error = Value;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_try_from_value! {
    Integer => i64,
    String => String,
    Block => BlockFamily,
    ItemTemplate => ItemTemplate,
    Player => PlayerRef,
    Region => RegionInfo,
    Comparator => Comparator,
}

//! Leaf payloads and the constant-assignment step of tree building.
//!
//! A construction entry such as `{amount}[VALUE]5` carries a raw literal; the
//! value-kind of the leaf it lands on decides how the text is interpreted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::node::ValueKind;
use crate::world::{EntityId, World};

/// Which player(s) an action addresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerRef {
    /// The entity stored as `InfoTriggeringEntity` in the trigger context.
    TriggeringPlayer,
    AllPlayers,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    GreaterThan,
    GreaterThanEqualTo,
    LessThan,
    LessThanEqualTo,
    EqualTo,
}

impl Comparator {
    pub fn compare<T: PartialOrd>(self, left: T, right: T) -> bool {
        match self {
            Comparator::GreaterThan => left > right,
            Comparator::GreaterThanEqualTo => left >= right,
            Comparator::LessThan => left < right,
            Comparator::LessThanEqualTo => left <= right,
            Comparator::EqualTo => left == right,
        }
    }
}

/// Non-owning link from a region leaf to a region entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionBinding {
    Bound { network_id: i64, entity: EntityId },
    /// No region carried the network id when the literal was assigned.
    Unresolved { network_id: i64 },
}

impl RegionBinding {
    pub fn network_id(&self) -> i64 {
        match self {
            RegionBinding::Bound { network_id, .. } | RegionBinding::Unresolved { network_id } => {
                *network_id
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(i64),
    String(String),
    BlockType(String),
    ItemTemplateRef(String),
    PlayerRef(PlayerRef),
    Comparator(Comparator),
    RegionRef(RegionBinding),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("Malformed {kind} literal '{literal}': {message}")]
    Malformed {
        kind: ValueKind,
        literal: String,
        message: String,
    },
    #[error("Unknown {kind} variant '{literal}'")]
    UnknownVariant { kind: ValueKind, literal: String },
}

pub type LiteralResult<T> = Result<T, LiteralError>;

impl Literal {
    pub fn kind(&self) -> ValueKind {
        match self {
            Literal::Integer(_) => ValueKind::Integer,
            Literal::String(_) => ValueKind::String,
            Literal::BlockType(_) => ValueKind::BlockType,
            Literal::ItemTemplateRef(_) => ValueKind::ItemTemplateRef,
            Literal::PlayerRef(_) => ValueKind::PlayerRef,
            Literal::Comparator(_) => ValueKind::Comparator,
            Literal::RegionRef(_) => ValueKind::RegionRef,
        }
    }

    /// Interprets `text` according to `kind`.
    ///
    /// Region literals are network ids; they are bound by scanning the
    /// world's regions and become [`RegionBinding::Unresolved`] when nothing
    /// matches.
    pub fn parse(kind: ValueKind, text: &str, world: &dyn World) -> LiteralResult<Self> {
        match kind {
            ValueKind::Integer => parse_integer(kind, text).map(Literal::Integer),
            ValueKind::String => Ok(Literal::String(text.to_string())),
            ValueKind::BlockType => Ok(Literal::BlockType(text.to_string())),
            ValueKind::ItemTemplateRef => Ok(Literal::ItemTemplateRef(text.to_string())),
            ValueKind::PlayerRef => parse_variant(kind, text).map(Literal::PlayerRef),
            ValueKind::Comparator => parse_variant(kind, text).map(Literal::Comparator),
            ValueKind::RegionRef => {
                let network_id = parse_integer(kind, text)?;
                Ok(Literal::RegionRef(bind_region(network_id, world)))
            }
        }
    }
}

/// The construction-string form of a literal, i.e. what [`Literal::parse`]
/// reads back.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{}", value),
            Literal::String(value) | Literal::BlockType(value) | Literal::ItemTemplateRef(value) => {
                write!(f, "{}", value)
            }
            Literal::PlayerRef(player) => write!(f, "{}", player),
            Literal::Comparator(comparator) => write!(f, "{}", comparator),
            Literal::RegionRef(binding) => write!(f, "{}", binding.network_id()),
        }
    }
}

fn parse_integer(kind: ValueKind, text: &str) -> LiteralResult<i64> {
    text.parse::<i64>().map_err(|e| LiteralError::Malformed {
        kind,
        literal: text.to_string(),
        message: e.to_string(),
    })
}

fn parse_variant<T: FromStr>(kind: ValueKind, text: &str) -> LiteralResult<T> {
    T::from_str(text).map_err(|_| LiteralError::UnknownVariant {
        kind,
        literal: text.to_string(),
    })
}

fn bind_region(network_id: i64, world: &dyn World) -> RegionBinding {
    match world
        .regions()
        .into_iter()
        .find(|region| region.network_id == network_id)
    {
        Some(region) => {
            debug!(network_id, entity = %region.entity, "bound region literal");
            RegionBinding::Bound {
                network_id,
                entity: region.entity,
            }
        }
        None => {
            warn!(network_id, "no region carries this network id, leaving it unresolved");
            RegionBinding::Unresolved { network_id }
        }
    }
}

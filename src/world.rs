//! Host-side collaborators of the scenario engine.
//!
//! Everything the engine needs from the surrounding game (entity creation,
//! block and item registries, region lookup, client sessions) goes through the
//! [`World`] trait. The engine never owns world entities; it only holds
//! [`EntityId`] handles handed out by the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a host entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// A registered block family, looked up by URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockFamily {
    pub uri: String,
}

/// An item template (prefab) that item entities are instantiated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub uri: String,
}

/// A region entity as seen by scenario logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionInfo {
    pub entity: EntityId,
    pub network_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const CYAN: Color = Color::rgba(0, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// The game world as exposed to the builder and the evaluator.
///
/// Read methods are used while resolving values; the `&mut self` methods are
/// the side effects performed by actions.
#[mockall::automock]
pub trait World {
    /// All entities carrying a region name marker.
    fn regions(&self) -> Vec<RegionInfo>;

    fn block_family(&self, uri: &str) -> Option<BlockFamily>;

    fn item_template(&self, uri: &str) -> Option<ItemTemplate>;

    fn display_name(&self, entity: EntityId) -> Option<String>;

    /// Connected client sessions, the receivers of chat broadcasts.
    fn clients(&self) -> Vec<EntityId>;

    /// Characters of every connected player.
    fn players(&self) -> Vec<EntityId>;

    /// Creates a block item stack of `amount` blocks.
    fn create_block_item(&mut self, family: &BlockFamily, amount: u32) -> EntityId;

    fn create_item(&mut self, template: &ItemTemplate) -> EntityId;

    fn give_item(&mut self, item: EntityId, receiver: EntityId);

    /// Instantiates a chat sender entity from `template`.
    /// Returns `None` if the template is unknown to the host.
    fn create_chat_sender(&mut self, template: &str, name: &str, color: Color) -> Option<EntityId>;

    fn send_chat(&mut self, client: EntityId, message: &str, sender: EntityId);
}

//! In-memory [`World`] used by the command line tool, tests and benches.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{self, DEFAULT_CHAT_TEMPLATE};
use crate::event_bus::{EventBus, WorldEvent};
use crate::world::{BlockFamily, Color, EntityId, ItemTemplate, RegionInfo, World};
use crate::InternalResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default = "default_chat_templates")]
    pub chat_templates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub network_id: i64,
    pub name: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            items: Vec::new(),
            regions: Vec::new(),
            players: Vec::new(),
            chat_templates: default_chat_templates(),
        }
    }
}

impl SandboxConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        config::from_file(path)
    }
}

fn default_chat_templates() -> Vec<String> {
    vec![DEFAULT_CHAT_TEMPLATE.to_string()]
}

/// A connected player: one client session plus the character it controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerHandle {
    pub name: String,
    pub client: EntityId,
    pub character: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Block family or item template URI.
    pub source: String,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub client: EntityId,
    pub sender_name: String,
    pub color: Color,
    pub message: String,
}

pub struct SandboxWorld {
    next_entity: u64,
    blocks: HashSet<String>,
    item_templates: HashSet<String>,
    chat_templates: HashSet<String>,
    regions: Vec<RegionInfo>,
    players: Vec<PlayerHandle>,
    names: HashMap<EntityId, String>,
    chat_senders: HashMap<EntityId, Color>,
    items: HashMap<EntityId, ItemRecord>,
    inventories: HashMap<EntityId, Vec<EntityId>>,
    chat_log: Vec<ChatRecord>,
    event_bus: Option<Arc<EventBus>>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::from_config(&SandboxConfig::default())
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        let mut world = Self {
            next_entity: 0,
            blocks: config.blocks.iter().cloned().collect(),
            item_templates: config.items.iter().cloned().collect(),
            chat_templates: config.chat_templates.iter().cloned().collect(),
            regions: Vec::new(),
            players: Vec::new(),
            names: HashMap::new(),
            chat_senders: HashMap::new(),
            items: HashMap::new(),
            inventories: HashMap::new(),
            chat_log: Vec::new(),
            event_bus: None,
        };
        for region in &config.regions {
            world.add_region(region.network_id, &region.name);
        }
        for player in &config.players {
            world.add_player(player);
        }
        world
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn add_block(&mut self, uri: impl Into<String>) {
        self.blocks.insert(uri.into());
    }

    pub fn add_item_template(&mut self, uri: impl Into<String>) {
        self.item_templates.insert(uri.into());
    }

    pub fn add_region(&mut self, network_id: i64, name: impl Into<String>) -> EntityId {
        let entity = self.spawn();
        self.regions.push(RegionInfo {
            entity,
            network_id,
            name: name.into(),
        });
        entity
    }

    /// Destroys a region entity. Returns false if it did not exist.
    pub fn remove_region(&mut self, entity: EntityId) -> bool {
        let before = self.regions.len();
        self.regions.retain(|region| region.entity != entity);
        self.regions.len() != before
    }

    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerHandle {
        let name = name.into();
        let client = self.spawn();
        let character = self.spawn();
        self.names.insert(client, name.clone());
        self.names.insert(character, name.clone());
        let handle = PlayerHandle {
            name,
            client,
            character,
        };
        self.players.push(handle.clone());
        handle
    }

    pub fn player(&self, name: &str) -> Option<&PlayerHandle> {
        self.players.iter().find(|player| player.name == name)
    }

    pub fn inventory(&self, entity: EntityId) -> &[EntityId] {
        self.inventories
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn item(&self, entity: EntityId) -> Option<&ItemRecord> {
        self.items.get(&entity)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn chat_log(&self) -> &[ChatRecord] {
        &self.chat_log
    }

    fn spawn(&mut self) -> EntityId {
        self.next_entity += 1;
        EntityId::new(self.next_entity)
    }

    fn create_record(&mut self, source: &str, amount: u32) -> EntityId {
        let item = self.spawn();
        self.items.insert(
            item,
            ItemRecord {
                source: source.to_string(),
                amount,
            },
        );
        self.publish(WorldEvent::ItemCreated {
            item,
            source: source.to_string(),
        });
        item
    }

    fn publish(&self, event: WorldEvent) {
        trace!(%event, "world event");
        if let Some(bus) = &self.event_bus {
            if let Err(e) = bus.publish(event) {
                debug!(%e, "world event dropped");
            }
        }
    }
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl World for SandboxWorld {
    fn regions(&self) -> Vec<RegionInfo> {
        self.regions.clone()
    }

    fn block_family(&self, uri: &str) -> Option<BlockFamily> {
        self.blocks.contains(uri).then(|| BlockFamily {
            uri: uri.to_string(),
        })
    }

    fn item_template(&self, uri: &str) -> Option<ItemTemplate> {
        self.item_templates.contains(uri).then(|| ItemTemplate {
            uri: uri.to_string(),
        })
    }

    fn display_name(&self, entity: EntityId) -> Option<String> {
        self.names.get(&entity).cloned()
    }

    fn clients(&self) -> Vec<EntityId> {
        self.players.iter().map(|player| player.client).collect()
    }

    fn players(&self) -> Vec<EntityId> {
        self.players.iter().map(|player| player.character).collect()
    }

    fn create_block_item(&mut self, family: &BlockFamily, amount: u32) -> EntityId {
        self.create_record(&family.uri, amount)
    }

    fn create_item(&mut self, template: &ItemTemplate) -> EntityId {
        self.create_record(&template.uri, 1)
    }

    fn give_item(&mut self, item: EntityId, receiver: EntityId) {
        self.inventories.entry(receiver).or_default().push(item);
        self.publish(WorldEvent::ItemGiven { item, receiver });
    }

    fn create_chat_sender(&mut self, template: &str, name: &str, color: Color) -> Option<EntityId> {
        if !self.chat_templates.contains(template) {
            return None;
        }
        let sender = self.spawn();
        self.names.insert(sender, name.to_string());
        self.chat_senders.insert(sender, color);
        Some(sender)
    }

    fn send_chat(&mut self, client: EntityId, message: &str, sender: EntityId) {
        self.chat_log.push(ChatRecord {
            client,
            sender_name: self.names.get(&sender).cloned().unwrap_or_default(),
            color: self.chat_senders.get(&sender).copied().unwrap_or(Color::CYAN),
            message: message.to_string(),
        });
        self.publish(WorldEvent::ChatMessage {
            client,
            sender,
            message: message.to_string(),
        });
    }
}

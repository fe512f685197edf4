use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{ActionKind, ConditionKind, ExpressionKind, NodeKind, ValueKind};
use crate::{config, InternalResult};

/// A named argument position declared by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    /// Template instantiated into the slot when the owning node is created.
    #[serde(default)]
    pub default: Option<String>,
}

/// Named, reusable node shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
    /// Literal assigned to a value node right after instantiation.
    #[serde(default)]
    pub default_literal: Option<String>,
}

impl Template {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            slots: Vec::new(),
            default_literal: None,
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>, default: Option<&str>) -> Self {
        self.slots.push(SlotDef {
            name: name.into(),
            default: default.map(str::to_string),
        });
        self
    }

    pub fn with_default_literal(mut self, literal: impl Into<String>) -> Self {
        self.default_literal = Some(literal.into());
        self
    }

    pub fn slot_names(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.name.clone()).collect()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Template already registered: {0}")]
    AlreadyRegistered(String),
}

/// Lookup of templates by name, the asset manager seen from the builder.
pub trait TemplateRegistry {
    fn template_by_name(&self, name: &str) -> Option<Arc<Template>>;
}

#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Arc<DashMap<String, Arc<Template>>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every built-in template.
    pub fn with_builtins() -> Self {
        let catalog = Self::new();
        for template in builtin_templates() {
            catalog
                .templates
                .insert(template.name.clone(), Arc::new(template));
        }
        catalog
    }

    pub fn register(&self, template: Template) -> Result<(), TemplateError> {
        if self.templates.contains_key(&template.name) {
            return Err(TemplateError::AlreadyRegistered(template.name));
        }
        self.templates
            .insert(template.name.clone(), Arc::new(template));
        Ok(())
    }

    /// Registers every template of a JSON array file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> InternalResult<usize> {
        let templates: Vec<Template> = config::from_file(path)?;
        let count = templates.len();
        for template in templates {
            self.register(template)?;
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.templates.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

impl TemplateRegistry for TemplateCatalog {
    fn template_by_name(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).map(|entry| entry.value().clone())
    }
}

pub fn builtin_templates() -> Vec<Template> {
    use ActionKind::*;
    use ExpressionKind::*;

    vec![
        // actions
        Template::new("giveBlockAction", NodeKind::Action(GiveBlock))
            .with_slot("block", Some("blockValue"))
            .with_slot("amount", Some("integerValue"))
            .with_slot("player", Some("playerValue")),
        Template::new("giveItemAction", NodeKind::Action(GiveItem))
            .with_slot("item", Some("itemValue"))
            .with_slot("amount", Some("integerValue"))
            .with_slot("player", Some("playerValue")),
        Template::new("logInfoAction", NodeKind::Action(LogInfo)).with_slot("text", Some("stringValue")),
        Template::new("sendChatAction", NodeKind::Action(SendChat))
            .with_slot("message", Some("stringValue"))
            .with_slot("owner", Some("stringValue")),
        // values
        Template::new("integerValue", NodeKind::Value(ValueKind::Integer)).with_default_literal("0"),
        Template::new("stringValue", NodeKind::Value(ValueKind::String)).with_default_literal(""),
        Template::new("blockTypeValue", NodeKind::Value(ValueKind::BlockType))
            .with_default_literal("engine:air"),
        Template::new("itemValue", NodeKind::Value(ValueKind::ItemTemplateRef)),
        Template::new("playerValue", NodeKind::Value(ValueKind::PlayerRef))
            .with_default_literal("TRIGGERING_PLAYER"),
        Template::new("regionValue", NodeKind::Value(ValueKind::RegionRef)),
        Template::new("comparatorValue", NodeKind::Value(ValueKind::Comparator))
            .with_default_literal("EQUAL_TO"),
        // expressions
        Template::new("blockValue", NodeKind::Expression(BlockOfType)).with_slot("type", Some("blockTypeValue")),
        Template::new("concatString", NodeKind::Expression(ConcatString))
            .with_slot("first", Some("stringValue"))
            .with_slot("second", Some("stringValue")),
        Template::new("intToString", NodeKind::Expression(IntToString)).with_slot("int", Some("integerValue")),
        Template::new("playerName", NodeKind::Expression(PlayerName)).with_slot("player", Some("playerValue")),
        Template::new("regionName", NodeKind::Expression(RegionName)).with_slot("region", Some("regionValue")),
        // conditions
        Template::new("intComparison", NodeKind::Condition(ConditionKind::IntComparison))
            .with_slot("first", Some("integerValue"))
            .with_slot("comparator", Some("comparatorValue"))
            .with_slot("second", Some("integerValue")),
    ]
}

//! Read-only access to practice items and lessons.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Item, ItemId, Lesson};

pub trait ItemCatalog {
    /// Items for `skill` at or below `max_level`, optionally narrowed to one lesson.
    fn items_for(&self, skill: &str, max_level: u32, lesson: Option<&str>) -> Vec<Item>;

    fn item(&self, id: ItemId) -> Option<Item>;

    fn lessons_for(&self, skill: &str) -> Vec<Lesson>;

    fn skills(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    lessons: BTreeMap<String, Vec<Lesson>>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn with_lessons(mut self, skill: impl Into<String>, lessons: Vec<Lesson>) -> Self {
        self.lessons.insert(skill.into(), lessons);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            items = catalog.items.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemCatalog for InMemoryCatalog {
    fn items_for(&self, skill: &str, max_level: u32, lesson: Option<&str>) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| item.skill == skill && item.level <= max_level)
            .filter(|item| lesson.is_none() || item.lesson.as_deref() == lesson)
            .cloned()
            .collect()
    }

    fn item(&self, id: ItemId) -> Option<Item> {
        self.items.iter().find(|item| item.id == id).cloned()
    }

    fn lessons_for(&self, skill: &str) -> Vec<Lesson> {
        self.lessons.get(skill).cloned().unwrap_or_default()
    }

    fn skills(&self) -> Vec<String> {
        let skills: BTreeSet<String> = self
            .skills
            .iter()
            .cloned()
            .chain(self.items.iter().map(|item| item.skill.clone()))
            .collect();
        skills.into_iter().collect()
    }
}

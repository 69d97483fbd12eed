//! Category schema: which prompts compete in which classification.
//!
//! A category is an ordered list of primary groups (the competing labels, such
//! as the four seasons) plus an ordered list of override groups (escapes such
//! as "no person") that win whenever they score strictly higher than every
//! primary group. A group is one label backed by one or more paraphrased
//! prompts.
//!
//! Schemas are static TOML:
//!
//! ```toml
//! [[category]]
//! name = "blur"
//!
//! [[category.primary]]
//! label = "blurry"
//! prompts = ["a blurry, out of focus, or motion blurred photo"]
//!
//! [[category.primary]]
//! label = "sharp"
//! prompts = ["a sharp, clear, and in-focus photo"]
//! ```

mod builtin;

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ClassifyResult, SchemaError};
use crate::store::EmbeddingStore;

/// One label backed by paraphrased prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    pub prompts: Vec<String>,
}

impl Group {
    pub fn new<L, I, P>(label: L, prompts: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            label: label.into(),
            prompts: prompts.into_iter().map(Into::into).collect(),
        }
    }
}

/// A classification task: competing primary groups plus override escapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    /// Competing labels, in declaration order (ties go to the first).
    #[serde(default)]
    pub primary: Vec<Group>,

    /// Escape labels that beat the primary set only on a strictly higher score.
    #[serde(default, rename = "override", skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<Group>,
}

impl Category {
    pub fn new(name: impl Into<String>, primary: Vec<Group>, overrides: Vec<Group>) -> Self {
        Self {
            name: name.into(),
            primary,
            overrides,
        }
    }

    /// All groups: primary first, then overrides.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.primary.iter().chain(&self.overrides)
    }

    /// Check that every prompt this category references is stored.
    pub fn validate(&self, store: &EmbeddingStore) -> ClassifyResult<()> {
        match self.missing_prompts(store).into_iter().next() {
            Some(missing) => Err(missing.into_error()),
            None => Ok(()),
        }
    }

    /// Every referenced prompt absent from `store`, in declaration order.
    pub fn missing_prompts<'a>(&'a self, store: &EmbeddingStore) -> Vec<PromptRef<'a>> {
        self.groups()
            .flat_map(|group| {
                group.prompts.iter().map(move |text| PromptRef {
                    category: &self.name,
                    label: &group.label,
                    text,
                })
            })
            .filter(|r| !store.contains(r.text))
            .collect()
    }
}

/// A prompt's position in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptRef<'a> {
    pub category: &'a str,
    pub label: &'a str,
    pub text: &'a str,
}

impl PromptRef<'_> {
    /// The error raised when this prompt is missing from the store.
    pub fn into_error(self) -> ClassifyError {
        ClassifyError::MissingPrompt {
            category: self.category.to_string(),
            label: self.label.to_string(),
            text: self.text.to_string(),
        }
    }
}

/// A validated, immutable table of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySchema {
    #[serde(default, rename = "category")]
    categories: Vec<Category>,
}

impl CategorySchema {
    /// Build a schema, checking it for structural mistakes.
    pub fn new(categories: Vec<Category>) -> Result<Self, SchemaError> {
        let schema = Self { categories };
        schema.check_structure()?;
        Ok(schema)
    }

    /// The built-in watermark, season, blur, and scene-type categories.
    pub fn builtin() -> Self {
        Self {
            categories: builtin::categories(),
        }
    }

    /// Parse a schema from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        let schema: Self = toml::from_str(content)?;
        schema.check_structure()?;
        Ok(schema)
    }

    /// Load a schema from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded schema: {} categories from {:?}",
            schema.categories.len(),
            path
        );
        Ok(schema)
    }

    /// Serialize the schema to pretty TOML.
    pub fn to_toml(&self) -> Result<String, SchemaError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn check_structure(&self) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(SchemaError::DuplicateCategory(category.name.clone()));
            }
            let mut labels = HashSet::new();
            for group in category.groups() {
                if !labels.insert(group.label.as_str()) {
                    return Err(SchemaError::DuplicateLabel {
                        category: category.name.clone(),
                        label: group.label.clone(),
                    });
                }
                if group.prompts.is_empty() {
                    return Err(SchemaError::EmptyGroup {
                        category: category.name.clone(),
                        label: group.label.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fail with [`ClassifyError::MissingPrompt`] unless every prompt of
    /// every category is in `store`.
    pub fn validate(&self, store: &EmbeddingStore) -> ClassifyResult<()> {
        self.categories.iter().try_for_each(|c| c.validate(store))
    }

    /// Every prompt absent from `store`, across all categories.
    pub fn missing_prompts<'a>(&'a self, store: &EmbeddingStore) -> Vec<PromptRef<'a>> {
        self.categories
            .iter()
            .flat_map(|c| c.missing_prompts(store))
            .collect()
    }

    /// Look up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Every distinct prompt referenced by any group.
    pub fn referenced_prompts(&self) -> BTreeSet<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.groups())
            .flat_map(|g| g.prompts.iter().map(String::as_str))
            .collect()
    }
}

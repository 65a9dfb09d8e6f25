use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, UnknownCategoryError};

/// A single required compliance question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistQuestion {
    /// Identifier, unique within its category (e.g. "item_3")
    pub id: String,
    /// The question text shown to the oracle
    pub description: String,
}

impl ChecklistQuestion {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Subject-matter category of a call (e.g. "Mit Beratung – Fonds")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLabel(String);

impl CategoryLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Static mapping from category to its ordered questions
///
/// Loaded once at startup and shared read-only between requests. Categories
/// keep the order they were declared in.
#[derive(Debug, Clone)]
pub struct ChecklistTable {
    version: Option<String>,
    checklists: Vec<(CategoryLabel, Vec<ChecklistQuestion>)>,
}

impl ChecklistTable {
    /// Build a validated table
    ///
    /// Rejects an empty table, empty or repeated labels, empty ids or
    /// descriptions and duplicate ids within one category.
    pub fn new(
        version: Option<String>,
        checklists: impl IntoIterator<Item = (CategoryLabel, Vec<ChecklistQuestion>)>,
    ) -> Result<Self, ConfigError> {
        let checklists: Vec<_> = checklists.into_iter().collect();
        if checklists.is_empty() {
            return Err(ConfigError::MalformedChecklist(
                "no categories defined".to_string(),
            ));
        }

        let mut labels = HashSet::new();
        for (category, questions) in &checklists {
            if category.as_str().trim().is_empty() {
                return Err(ConfigError::MalformedChecklist(
                    "empty category label".to_string(),
                ));
            }
            if !labels.insert(category) {
                return Err(ConfigError::MalformedChecklist(format!(
                    "category {:?} defined twice",
                    category.as_str()
                )));
            }

            let mut seen = HashSet::new();
            for question in questions {
                if question.id.trim().is_empty() {
                    return Err(ConfigError::MalformedChecklist(format!(
                        "question without id in category {:?}",
                        category.as_str()
                    )));
                }
                if question.description.trim().is_empty() {
                    return Err(ConfigError::MalformedChecklist(format!(
                        "question {} in category {:?} has no description",
                        question.id,
                        category.as_str()
                    )));
                }
                if !seen.insert(question.id.as_str()) {
                    return Err(ConfigError::MalformedChecklist(format!(
                        "duplicate question id {} in category {:?}",
                        question.id,
                        category.as_str()
                    )));
                }
            }
        }

        Ok(Self {
            version,
            checklists,
        })
    }

    /// Look up the ordered questions for a category
    pub fn resolve(&self, category: &str) -> Result<&[ChecklistQuestion], UnknownCategoryError> {
        self.checklists
            .iter()
            .find(|(label, _)| label.as_str() == category)
            .map(|(_, questions)| questions.as_slice())
            .ok_or_else(|| UnknownCategoryError(category.to_string()))
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Categories in declaration order
    pub fn categories(&self) -> impl Iterator<Item = &CategoryLabel> {
        self.checklists.iter().map(|(label, _)| label)
    }

    pub fn len(&self) -> usize {
        self.checklists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checklists.is_empty()
    }
}

//! System analysis boundary types
//!
//! The orchestration layer feeds the core a "system analysis": one entry per
//! analyzed document, each describing discovered components, relationships,
//! and critical components. The core never writes these; missing keys
//! deserialize to empty collections rather than erroring.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Analysis of the modeled system, keyed by document identifier.
///
/// Component lookups scan every document entry; the first component with a
/// matching name wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SystemAnalysis {
    documents: BTreeMap<String, DocumentAnalysis>,
}

/// Components and relationships extracted from a single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentAnalysis {
    /// Components discovered in the document.
    #[serde(default)]
    pub components: Vec<ComponentInfo>,
    /// Relationships between components.
    #[serde(default)]
    pub relationships: Vec<ComponentRelationship>,
    /// Names of components deemed critical to the system.
    #[serde(default)]
    pub critical_components: Vec<String>,
}

/// A single component of the modeled system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentInfo {
    /// Component name (lookup key for experiments).
    pub name: String,
    /// Component type tag, e.g. `"database"` or `"cache"`.
    #[serde(rename = "type", default)]
    pub component_type: String,
    /// Open-ended properties; safety rules test for key presence only.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// A directed relationship between two components.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentRelationship {
    /// Source component name.
    pub from: String,
    /// Destination component name.
    pub to: String,
    /// Relationship type tag.
    #[serde(rename = "type", default)]
    pub relationship_type: String,
    /// Open-ended properties.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl SystemAnalysis {
    /// Create an empty analysis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the analysis for one document.
    pub fn insert_document(&mut self, document_id: impl Into<String>, doc: DocumentAnalysis) {
        self.documents.insert(document_id.into(), doc);
    }

    /// Iterate over all document analyses.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentAnalysis> {
        self.documents.values()
    }

    /// Iterate over every component across all documents.
    pub fn components(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.documents.values().flat_map(|d| d.components.iter())
    }

    /// Find a component by name, scanning all documents.
    #[must_use]
    pub fn find_component(&self, name: &str) -> Option<&ComponentInfo> {
        self.components().find(|c| c.name == name)
    }

    /// Union of critical component names across all documents.
    #[must_use]
    pub fn critical_components(&self) -> BTreeSet<&str> {
        self.documents
            .values()
            .flat_map(|d| d.critical_components.iter())
            .map(String::as_str)
            .collect()
    }
}

impl ComponentInfo {
    /// Create a component with a name and type and no properties.
    #[must_use]
    pub fn new(name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a property, returning self for chaining.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Check whether any of the given property keys is present.
    #[must_use]
    pub fn has_any_property(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.properties.contains_key(*k))
    }
}

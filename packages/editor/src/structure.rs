//! # Document Structure Tree
//!
//! The editable representation of a document: sections of paragraphs and
//! tables plus document-level metadata. This is the single source of truth for
//! content during an edit session; the binary document is regenerated from it.
//!
//! Serialized as JSON with stable field names, so a tree written by one
//! session can be loaded by another.

use docedit_actions::{Justification, StyleType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Paragraph types share the action vocabulary
pub type ParagraphType = StyleType;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub paragraph_count: usize,
    #[serde(default)]
    pub table_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Style name -> overrides, applied to the style definitions on reconcile
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, StyleOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleOverride {
    #[serde(default)]
    pub size_pt: Option<u32>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub justification: Option<Justification>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: ParagraphType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl DocumentStructure {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Every paragraph in section order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.sections
            .iter()
            .flat_map(|section| section.paragraphs.iter())
    }

    pub fn paragraph(&self, id: &str) -> Option<&Paragraph> {
        self.paragraphs().find(|paragraph| paragraph.id == id)
    }

    pub fn paragraph_mut(&mut self, id: &str) -> Option<&mut Paragraph> {
        self.sections
            .iter_mut()
            .flat_map(|section| section.paragraphs.iter_mut())
            .find(|paragraph| paragraph.id == id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.id == id)
    }

    pub fn paragraph_ids(&self) -> HashSet<&str> {
        self.paragraphs().map(|paragraph| paragraph.id.as_str()).collect()
    }
}

impl Section {
    pub fn position(&self, paragraph_id: &str) -> Option<usize> {
        self.paragraphs
            .iter()
            .position(|paragraph| paragraph.id == paragraph_id)
    }
}

impl Paragraph {
    pub fn new(id: impl Into<String>, text: impl Into<String>, kind: ParagraphType) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let mut structure = DocumentStructure {
            meta: Meta {
                paragraph_count: 1,
                table_count: 0,
                ..Default::default()
            },
            sections: vec![Section {
                id: "s1".to_string(),
                title: "Document Start".to_string(),
                paragraphs: vec![Paragraph::new("s1_p1", "Hello", ParagraphType::H1)],
                tables: vec![],
            }],
        };
        structure.meta.styles.insert(
            "Normal".to_string(),
            StyleOverride {
                size_pt: Some(12),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&structure).unwrap();
        assert_eq!(
            value,
            json!({
                "meta": {
                    "paragraph_count": 1,
                    "table_count": 0,
                    "styles": {
                        "Normal": {"size_pt": 12, "bold": null, "italic": null, "justification": null}
                    }
                },
                "sections": [{
                    "id": "s1",
                    "title": "Document Start",
                    "paragraphs": [{"id": "s1_p1", "text": "Hello", "type": "h1"}],
                    "tables": []
                }]
            })
        );
    }

    #[test]
    fn test_missing_type_is_text() {
        let structure = DocumentStructure::from_json(
            r#"{"meta": {}, "sections": [{"id": "s1", "paragraphs": [{"id": "s1_p1", "text": "x"}]}]}"#,
        )
        .unwrap();

        assert_eq!(structure.paragraph("s1_p1").unwrap().kind, ParagraphType::Text);
        assert_eq!(structure.section("s1").unwrap().title, "");
    }

    #[test]
    fn test_lookup_across_sections() {
        let structure = DocumentStructure {
            meta: Meta::default(),
            sections: vec![
                Section {
                    id: "s1".to_string(),
                    paragraphs: vec![Paragraph::new("a", "", ParagraphType::Text)],
                    ..Default::default()
                },
                Section {
                    id: "s2".to_string(),
                    paragraphs: vec![Paragraph::new("b", "", ParagraphType::Text)],
                    ..Default::default()
                },
            ],
        };

        assert!(structure.paragraph("b").is_some());
        assert_eq!(structure.section("s2").unwrap().position("b"), Some(0));
        assert_eq!(structure.paragraph_ids().len(), 2);
    }
}

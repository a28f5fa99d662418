//! Relationship parts (`_rels/*.rels`) and `[Content_Types].xml`.

use crate::error::{DocxError, DocxResult};
use crate::ns;
use crate::xml::XmlTree;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";

#[derive(Debug, Clone)]
pub struct Relationships {
    tree: XmlTree,
}

impl Relationships {
    pub fn parse(part: &str, xml: &str) -> DocxResult<Self> {
        let tree = XmlTree::parse(xml).map_err(|e| DocxError::xml(part, e))?;
        Ok(Self { tree })
    }

    pub fn empty() -> Self {
        Self {
            tree: XmlTree::with_root(ns::PACKAGE_RELS, "Relationships"),
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.tree
            .child_elements(self.tree.root(), ns::PACKAGE_RELS, "Relationship")
            .filter_map(|rel| {
                Some((
                    self.tree.attribute(rel, None, "Id")?,
                    self.tree.attribute(rel, None, "Type")?,
                    self.tree.attribute(rel, None, "Target")?,
                ))
            })
    }

    /// Target of the first relationship of `rel_type`
    pub fn target_of_type(&self, rel_type: &str) -> Option<&str> {
        self.entries()
            .find(|(_, ty, _)| *ty == rel_type)
            .map(|(_, _, target)| target)
    }

    pub fn target_of_id(&self, id: &str) -> Option<&str> {
        self.entries()
            .find(|(rel_id, _, _)| *rel_id == id)
            .map(|(_, _, target)| target)
    }

    /// Add a relationship and return its new id (`rId<n>`, above every
    /// existing numeric id)
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .entries()
            .filter_map(|(id, _, _)| id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);

        let root = self.tree.root();
        let rel = self.tree.create_element(ns::PACKAGE_RELS, "Relationship");
        self.tree.set_attribute(rel, None, "Id", &id);
        self.tree.set_attribute(rel, None, "Type", rel_type);
        self.tree.set_attribute(rel, None, "Target", target);
        self.tree.append_child(root, rel);

        id
    }

    pub fn to_xml(&self) -> String {
        self.tree.to_xml()
    }
}

#[derive(Debug, Clone)]
pub struct ContentTypes {
    tree: XmlTree,
}

impl ContentTypes {
    pub fn parse(xml: &str) -> DocxResult<Self> {
        let tree = XmlTree::parse(xml).map_err(|e| DocxError::xml(CONTENT_TYPES_PART, e))?;
        Ok(Self { tree })
    }

    pub fn has_default(&self, extension: &str) -> bool {
        self.tree
            .child_elements(self.tree.root(), ns::CONTENT_TYPES, "Default")
            .any(|node| {
                self.tree
                    .attribute(node, None, "Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
    }

    /// Register a default content type for an extension unless one exists.
    /// Defaults are placed before the first override.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        if self.has_default(extension) {
            return;
        }

        let root = self.tree.root();
        let index = self
            .tree
            .children(root)
            .iter()
            .position(|child| self.tree.is_element(*child, ns::CONTENT_TYPES, "Override"))
            .unwrap_or(self.tree.children(root).len());

        let node = self.tree.create_element(ns::CONTENT_TYPES, "Default");
        self.tree.set_attribute(node, None, "Extension", extension);
        self.tree.set_attribute(node, None, "ContentType", content_type);
        self.tree.insert_child(root, index, node);
    }

    pub fn to_xml(&self) -> String {
        self.tree.to_xml()
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/></Relationships>"#;

    #[test]
    fn test_lookup_and_add() {
        let mut rels = Relationships::parse("word/_rels/document.xml.rels", RELS).unwrap();
        assert_eq!(rels.target_of_type(ns::REL_STYLES), Some("styles.xml"));

        let id = rels.add(ns::REL_IMAGE, "media/diagram1.png");
        assert_eq!(id, "rId8");
        assert_eq!(rels.target_of_id("rId8"), Some("media/diagram1.png"));
        assert!(rels.to_xml().contains(r#"<Relationship Id="rId8" Type="#));
    }

    #[test]
    fn test_empty_relationships() {
        let mut rels = Relationships::empty();
        assert_eq!(rels.add(ns::REL_IMAGE, "media/a.png"), "rId1");
    }

    #[test]
    fn test_content_type_defaults() {
        let mut types = ContentTypes::parse(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="x"/></Types>"#,
        )
        .unwrap();

        types.ensure_default("png", "image/png");
        types.ensure_default("PNG", "image/png");

        let xml = types.to_xml();
        assert_eq!(xml.matches("Extension=\"png\"").count(), 1);
        assert!(xml.find("png").unwrap() < xml.find("Override").unwrap());
    }

    #[test]
    fn test_paths() {
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(resolve_target("word/document.xml", "styles.xml"), "word/styles.xml");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("_rels/.rels", "/word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }
}

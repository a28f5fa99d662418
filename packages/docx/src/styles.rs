//! Style definitions (`word/styles.xml`).
//!
//! Styles are found by display name: exact match first, then a
//! case-insensitive match (Word stores built-in names such as `heading 1` in
//! lower case), then the style id.

use crate::error::{DocxError, DocxResult};
use crate::ns;
use crate::xml::{NodeId, XmlTree};

pub(crate) const STYLE_ORDER: &[&str] = &[
    "name", "aliases", "basedOn", "next", "link", "autoRedefine", "hidden", "uiPriority",
    "semiHidden", "unhideWhenUsed", "qFormat", "locked", "personal", "personalCompose",
    "personalReply", "rsid", "pPr", "rPr", "tblPr", "trPr", "tcPr", "tblStylePr",
];

pub(crate) const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle",
    "rPr", "sectPr", "pPrChange",
];

pub(crate) const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleKind::Paragraph),
            "character" => Some(StyleKind::Character),
            "table" => Some(StyleKind::Table),
            "numbering" => Some(StyleKind::Numbering),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    /// Justified on both margins
    Both,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Both => "both",
        }
    }
}

/// Font and paragraph overrides applied to a style definition. `None` leaves
/// the corresponding property untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontOverride {
    pub size_pt: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub alignment: Option<Alignment>,
}

#[derive(Debug, Clone)]
pub struct StyleSheet {
    tree: XmlTree,
}

impl StyleSheet {
    pub fn parse(part: &str, xml: &str) -> DocxResult<Self> {
        let tree = XmlTree::parse(xml).map_err(|e| DocxError::xml(part, e))?;
        Ok(Self { tree })
    }

    fn styles(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.tree.child_elements(self.tree.root(), ns::W, "style")
    }

    fn kind(&self, style: NodeId) -> Option<StyleKind> {
        self.tree
            .attribute(style, Some(ns::W), "type")
            .and_then(StyleKind::parse)
    }

    fn id(&self, style: NodeId) -> Option<&str> {
        self.tree.attribute(style, Some(ns::W), "styleId")
    }

    fn display_name(&self, style: NodeId) -> Option<&str> {
        let name = self.tree.first_child_element(style, ns::W, "name")?;
        self.tree.attribute(name, Some(ns::W), "val")
    }

    fn find_node(&self, name: &str, kind: Option<StyleKind>) -> Option<NodeId> {
        let candidates: Vec<NodeId> = self
            .styles()
            .filter(|style| kind.is_none() || self.kind(*style) == kind)
            .collect();

        candidates
            .iter()
            .copied()
            .find(|style| self.display_name(*style) == Some(name))
            .or_else(|| {
                candidates.iter().copied().find(|style| {
                    self.display_name(*style)
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
                })
            })
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .find(|style| self.id(*style) == Some(name))
            })
    }

    /// Style id for a style name, restricted to `kind` when given
    pub fn style_id(&self, name: &str, kind: Option<StyleKind>) -> Option<String> {
        let style = self.find_node(name, kind)?;
        self.id(style).map(str::to_string)
    }

    /// Display name of the style with id `style_id`
    pub fn name_of(&self, style_id: &str) -> Option<String> {
        self.styles()
            .find(|style| self.id(*style) == Some(style_id))
            .and_then(|style| self.display_name(style))
            .map(str::to_string)
    }

    /// Style id of the document's default style of `kind`
    pub fn default_style_id(&self, kind: StyleKind) -> Option<String> {
        self.styles()
            .find(|style| {
                self.kind(*style) == Some(kind)
                    && matches!(
                        self.tree.attribute(*style, Some(ns::W), "default"),
                        Some("1") | Some("true") | Some("on")
                    )
            })
            .and_then(|style| self.id(style))
            .map(str::to_string)
    }

    pub fn contains(&self, name: &str, kind: Option<StyleKind>) -> bool {
        self.find_node(name, kind).is_some()
    }

    /// Apply `overrides` to the named style. Returns `false` when the style
    /// does not exist.
    pub fn apply_override(&mut self, name: &str, overrides: &FontOverride) -> bool {
        let Some(style) = self.find_node(name, None) else {
            return false;
        };

        // A zero size means "leave the size alone"
        let size_pt = overrides.size_pt.filter(|size| *size > 0);

        if size_pt.is_some() || overrides.bold.is_some() || overrides.italic.is_some() {
            let rpr = self.tree.ensure_child(style, ns::W, "rPr", STYLE_ORDER);

            if let Some(size) = size_pt {
                let half_points = u64::from(size) * 2;
                let sz = self.tree.ensure_child(rpr, ns::W, "sz", RPR_ORDER);
                self.tree
                    .set_attribute(sz, Some(ns::W), "val", &half_points.to_string());
            }
            if let Some(bold) = overrides.bold {
                set_toggle(&mut self.tree, rpr, "b", bold);
            }
            if let Some(italic) = overrides.italic {
                set_toggle(&mut self.tree, rpr, "i", italic);
            }
        }

        if let Some(alignment) = overrides.alignment {
            let ppr = self.tree.ensure_child(style, ns::W, "pPr", STYLE_ORDER);
            let jc = self.tree.ensure_child(ppr, ns::W, "jc", PPR_ORDER);
            self.tree.set_attribute(jc, Some(ns::W), "val", alignment.as_str());
        }

        true
    }

    /// Font size of the named style in points, when it sets one
    pub fn font_size_pt(&self, name: &str) -> Option<f32> {
        let style = self.find_node(name, None)?;
        let rpr = self.tree.first_child_element(style, ns::W, "rPr")?;
        let sz = self.tree.first_child_element(rpr, ns::W, "sz")?;
        let half_points: f32 = self.tree.attribute(sz, Some(ns::W), "val")?.parse().ok()?;
        Some(half_points / 2.0)
    }

    /// Whether the named style turns a run toggle (`b`, `i`) on
    pub fn toggle(&self, name: &str, local: &str) -> Option<bool> {
        let style = self.find_node(name, None)?;
        let rpr = self.tree.first_child_element(style, ns::W, "rPr")?;
        let node = self.tree.first_child_element(rpr, ns::W, local)?;
        Some(toggle_value(self.tree.attribute(node, Some(ns::W), "val")))
    }

    /// Paragraph alignment set by the named style
    pub fn alignment(&self, name: &str) -> Option<String> {
        let style = self.find_node(name, None)?;
        let ppr = self.tree.first_child_element(style, ns::W, "pPr")?;
        let jc = self.tree.first_child_element(ppr, ns::W, "jc")?;
        self.tree.attribute(jc, Some(ns::W), "val").map(str::to_string)
    }

    pub fn to_xml(&self) -> String {
        self.tree.to_xml()
    }
}

/// `<w:b/>` for on, `<w:b w:val="0"/>` for off
pub(crate) fn set_toggle(tree: &mut XmlTree, rpr: NodeId, local: &str, on: bool) {
    let node = tree.ensure_child(rpr, ns::W, local, RPR_ORDER);
    if on {
        tree.remove_attribute(node, Some(ns::W), "val");
    } else {
        tree.set_attribute(node, Some(ns::W), "val", "0");
    }
}

pub(crate) fn toggle_value(val: Option<&str>) -> bool {
    !matches!(val, Some("0") | Some("false") | Some("off"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/></w:style>
</w:styles>"#;

    fn sheet() -> StyleSheet {
        StyleSheet::parse("word/styles.xml", STYLES).unwrap()
    }

    #[test]
    fn test_lookup_by_name() {
        let sheet = sheet();

        assert_eq!(sheet.style_id("Normal", None).as_deref(), Some("Normal"));
        assert_eq!(sheet.style_id("Heading 1", Some(StyleKind::Paragraph)).as_deref(), Some("Heading1"));
        assert_eq!(sheet.style_id("Heading1", None).as_deref(), Some("Heading1"));
        assert_eq!(sheet.style_id("Table Grid", Some(StyleKind::Paragraph)), None);
        assert_eq!(sheet.style_id("Table Grid", Some(StyleKind::Table)).as_deref(), Some("TableGrid"));
        assert_eq!(sheet.name_of("Heading1").as_deref(), Some("heading 1"));
        assert_eq!(sheet.default_style_id(StyleKind::Paragraph).as_deref(), Some("Normal"));
    }

    #[test]
    fn test_override_creates_properties() {
        let mut sheet = sheet();
        let applied = sheet.apply_override(
            "Normal",
            &FontOverride {
                size_pt: Some(14),
                bold: Some(true),
                italic: Some(false),
                alignment: Some(Alignment::Both),
            },
        );

        assert!(applied);
        assert_eq!(sheet.font_size_pt("Normal"), Some(14.0));
        assert_eq!(sheet.toggle("Normal", "b"), Some(true));
        assert_eq!(sheet.toggle("Normal", "i"), Some(false));
        assert_eq!(sheet.alignment("Normal").as_deref(), Some("both"));

        let xml = sheet.to_xml();
        let style = &xml[xml.find("w:styleId=\"Normal\"").unwrap()..];
        assert!(style.find("<w:qFormat/>").unwrap() < style.find("<w:pPr>").unwrap());
        assert!(style.find("<w:pPr>").unwrap() < style.find("<w:rPr>").unwrap());
    }

    #[test]
    fn test_override_updates_existing_size() {
        let mut sheet = sheet();
        sheet.apply_override(
            "heading 1",
            &FontOverride {
                size_pt: Some(20),
                bold: Some(false),
                ..FontOverride::default()
            },
        );

        assert_eq!(sheet.font_size_pt("Heading 1"), Some(20.0));
        assert_eq!(sheet.toggle("Heading 1", "b"), Some(false));
        assert_eq!(sheet.alignment("Heading 1"), None);
    }

    #[test]
    fn test_largest_size_does_not_overflow() {
        let mut sheet = sheet();
        sheet.apply_override(
            "Normal",
            &FontOverride {
                size_pt: Some(u32::MAX),
                ..FontOverride::default()
            },
        );

        assert!(sheet.to_xml().contains(r#"<w:sz w:val="8589934590"/>"#));
    }

    #[test]
    fn test_zero_size_keeps_existing_size() {
        let mut sheet = sheet();
        sheet.apply_override(
            "Heading 1",
            &FontOverride {
                size_pt: Some(0),
                italic: Some(true),
                ..FontOverride::default()
            },
        );

        assert_eq!(sheet.font_size_pt("Heading 1"), Some(16.0));
        assert_eq!(sheet.toggle("Heading 1", "i"), Some(true));

        let mut untouched = self::sheet();
        untouched.apply_override(
            "Normal",
            &FontOverride {
                size_pt: Some(0),
                ..FontOverride::default()
            },
        );
        assert_eq!(untouched.font_size_pt("Normal"), None);
        assert!(untouched
            .to_xml()
            .contains(r#"w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#));
    }

    #[test]
    fn test_unknown_style_is_reported() {
        let mut sheet = sheet();
        assert!(!sheet.apply_override("Quote", &FontOverride::default()));
    }
}

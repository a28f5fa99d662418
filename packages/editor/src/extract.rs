//! # Structure Extraction
//!
//! Flattens a document's body into a single section. Paragraph ids are
//! positional (`s1_p<n>`) and only meaningful against the document they were
//! extracted from; the reconciler re-derives the same ids from the original
//! document on every call.

use crate::errors::EditorResult;
use crate::id_generator::IdGenerator;
use crate::structure::{DocumentStructure, Meta, Paragraph, ParagraphType, Section, Table};
use docedit_docx::{Document, Paragraph as DocParagraph};
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_SECTION_TITLE: &str = "Document Start";

/// A body paragraph of the original document with its positional id
#[derive(Debug, Clone)]
pub(crate) struct IndexedParagraph {
    pub id: String,
    pub paragraph: DocParagraph,
    pub text: String,
    pub kind: ParagraphType,
}

pub fn extract_file(path: impl AsRef<Path>) -> EditorResult<DocumentStructure> {
    let document = Document::open(path)?;
    Ok(extract(&document))
}

pub fn extract_bytes(bytes: &[u8]) -> EditorResult<DocumentStructure> {
    let document = Document::from_bytes(bytes)?;
    Ok(extract(&document))
}

#[instrument(skip_all)]
pub fn extract(document: &Document) -> DocumentStructure {
    let mut ids = IdGenerator::new(1);

    let paragraphs: Vec<Paragraph> = index_paragraphs(document)
        .into_iter()
        .map(|indexed| Paragraph {
            id: indexed.id,
            text: indexed.text,
            kind: indexed.kind,
        })
        .collect();

    let tables: Vec<Table> = document
        .tables()
        .into_iter()
        .map(|table| Table {
            id: ids.next_table(),
            rows: document.table_rows(table),
        })
        .collect();

    info!(
        paragraphs = paragraphs.len(),
        tables = tables.len(),
        "Extracted structure"
    );

    DocumentStructure {
        meta: Meta {
            paragraph_count: paragraphs.len(),
            table_count: tables.len(),
            created_at: document.created_at().map(str::to_string),
            styles: Default::default(),
        },
        sections: vec![Section {
            id: ids.section_id(),
            title: DEFAULT_SECTION_TITLE.to_string(),
            paragraphs,
            tables,
        }],
    }
}

/// Body paragraphs in document order with their positional ids
pub(crate) fn index_paragraphs(document: &Document) -> Vec<IndexedParagraph> {
    let mut ids = IdGenerator::new(1);

    document
        .paragraphs()
        .into_iter()
        .map(|paragraph| IndexedParagraph {
            id: ids.next_paragraph(),
            paragraph,
            text: document.paragraph_text(paragraph),
            kind: paragraph_type_for_style(document.paragraph_style_name(paragraph).as_deref()),
        })
        .collect()
}

/// Classify a paragraph by its style's display name
pub fn paragraph_type_for_style(style_name: Option<&str>) -> ParagraphType {
    let Some(name) = style_name else {
        return ParagraphType::Text;
    };
    let name = name.to_lowercase();

    if name.contains("heading") {
        match name.chars().find(|c| matches!(c, '1' | '2' | '3')) {
            Some('2') => ParagraphType::H2,
            Some('3') => ParagraphType::H3,
            _ => ParagraphType::H1,
        }
    } else if name.contains("list") || name.contains("bullet") {
        ParagraphType::ListItem
    } else if name.contains("title") {
        ParagraphType::Title
    } else {
        ParagraphType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docedit_docx::fixture::DocxBuilder;

    #[test]
    fn test_style_mapping() {
        let cases = [
            (Some("heading 1"), ParagraphType::H1),
            (Some("Heading 2"), ParagraphType::H2),
            (Some("heading 3"), ParagraphType::H3),
            (Some("Heading 4"), ParagraphType::H1),
            (Some("Subheading"), ParagraphType::H1),
            (Some("List Bullet"), ParagraphType::ListItem),
            (Some("Bullet Points"), ParagraphType::ListItem),
            (Some("Title"), ParagraphType::Title),
            (Some("Subtitle"), ParagraphType::Title),
            (Some("Normal"), ParagraphType::Text),
            (None, ParagraphType::Text),
        ];

        for (name, expected) in cases {
            assert_eq!(paragraph_type_for_style(name), expected, "{:?}", name);
        }
    }

    #[test]
    fn test_extracts_single_section() {
        let bytes = DocxBuilder::new()
            .created_at("2024-01-02T03:04:05Z")
            .paragraph("Report", Some("Title"))
            .paragraph("Intro", Some("Heading1"))
            .paragraph("", None)
            .paragraph("Point", Some("ListBullet"))
            .table(&[&["h1", "h2"], &["a", "b"]])
            .build();

        let structure = extract_bytes(&bytes).unwrap();

        assert_eq!(structure.sections.len(), 1);
        let section = &structure.sections[0];
        assert_eq!(section.id, "s1");
        assert_eq!(section.title, DEFAULT_SECTION_TITLE);

        let summary: Vec<_> = section
            .paragraphs
            .iter()
            .map(|p| (p.id.as_str(), p.text.as_str(), p.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("s1_p1", "Report", ParagraphType::Title),
                ("s1_p2", "Intro", ParagraphType::H1),
                ("s1_p3", "", ParagraphType::Text),
                ("s1_p4", "Point", ParagraphType::ListItem),
            ]
        );

        assert_eq!(section.tables.len(), 1);
        assert_eq!(section.tables[0].id, "s1_t1");
        assert_eq!(section.tables[0].rows[1], vec!["a", "b"]);

        assert_eq!(structure.meta.paragraph_count, 4);
        assert_eq!(structure.meta.table_count, 1);
        assert_eq!(structure.meta.created_at.as_deref(), Some("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_without_style_sheet_uses_style_id() {
        let bytes = DocxBuilder::new()
            .without_styles()
            .paragraph("Heading-looking", Some("Heading1"))
            .build();

        let structure = extract_bytes(&bytes).unwrap();
        assert_eq!(structure.sections[0].paragraphs[0].kind, ParagraphType::H1);
    }
}

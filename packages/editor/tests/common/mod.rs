//! Shared fixtures for editor integration tests

use docedit_docx::fixture::DocxBuilder;
use docedit_docx::Document;

/// Title, two body paragraphs mentioning Acme, a list item and a table
pub fn report() -> Vec<u8> {
    DocxBuilder::new()
        .paragraph("Quarterly Report", Some("Title"))
        .paragraph("Acme grew and Acme hired.", None)
        .paragraph("Outlook", Some("Heading1"))
        .paragraph("Acme expects more growth.", None)
        .paragraph("Keep hiring", Some("ListBullet"))
        .table(&[&["Metric", "Value"], &["Revenue", "10"]])
        .build()
}

pub fn texts(bytes: &[u8]) -> Vec<String> {
    let document = Document::from_bytes(bytes).expect("reconciled output should load");
    document
        .paragraphs()
        .into_iter()
        .map(|p| document.paragraph_text(p))
        .collect()
}

//! Minimal in-memory `.docx` packages for tests.
//!
//! The generated package has a style sheet with the built-in styles the
//! editor relies on, a US Letter section and optional core properties.

use crate::package::Package;
use std::io::Cursor;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/><w:rPr><w:sz w:val="22"/></w:rPr></w:style>
<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:qFormat/><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:qFormat/><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:qFormat/><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:qFormat/><w:rPr><w:sz w:val="56"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720"/></w:pPr></w:style>
<w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="ListNumber"><w:name w:val="List Number"/><w:basedOn w:val="Normal"/></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style>
</w:styles>"#;

const SECT_PR: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

#[derive(Debug, Clone)]
pub struct DocxBuilder {
    body: String,
    styles: bool,
    omitted_styles: Vec<String>,
    created_at: Option<String>,
}

impl Default for DocxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            body: String::new(),
            styles: true,
            omitted_styles: Vec::new(),
            created_at: None,
        }
    }

    /// A paragraph with one run, optionally pointing at a style id
    pub fn paragraph(mut self, text: &str, style_id: Option<&str>) -> Self {
        self.body.push_str("<w:p>");
        if let Some(style_id) = style_id {
            self.body
                .push_str(&format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, escape(style_id)));
        }
        if !text.is_empty() {
            self.body.push_str(&format!(
                r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                escape(text)
            ));
        }
        self.body.push_str("</w:p>");
        self
    }

    /// Body XML inserted verbatim
    pub fn raw_paragraph(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in row.iter() {
                self.body.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>",
                    escape(cell)
                ));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = false;
        self
    }

    /// Leave one built-in style out of the style sheet
    pub fn without_style(mut self, style_id: &str) -> Self {
        self.omitted_styles.push(format!(r#"w:styleId="{}""#, style_id));
        self
    }

    pub fn created_at(mut self, timestamp: &str) -> Self {
        self.created_at = Some(timestamp.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut package = Package::default();

        let mut overrides = String::from(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        if self.styles {
            overrides.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
        }
        if self.created_at.is_some() {
            overrides.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        }
        package.set_part(
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
                overrides
            )
            .into_bytes(),
        );

        let mut package_rels = String::from(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        );
        if self.created_at.is_some() {
            package_rels.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
        }
        package.set_part("_rels/.rels", rels(&package_rels).into_bytes());

        package.set_part(
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}{}</w:body></w:document>"#,
                self.body, SECT_PR
            )
            .into_bytes(),
        );

        if self.styles {
            package.set_part(
                "word/_rels/document.xml.rels",
                rels(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#).into_bytes(),
            );
            let styles: Vec<&str> = STYLES
                .lines()
                .filter(|line| !self.omitted_styles.iter().any(|id| line.contains(id.as_str())))
                .collect();
            package.set_part("word/styles.xml", styles.join("\n").into_bytes());
        }

        if let Some(created) = &self.created_at {
            package.set_part(
                "docProps/core.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created></cp:coreProperties>"#,
                    escape(created)
                )
                .into_bytes(),
            );
        }

        // Building from literals cannot produce an unwritable archive
        package.to_bytes().unwrap_or_default()
    }
}

/// PNG of the given size, for diagram renderers in tests
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    match image.write_to(&mut out, image::ImageFormat::Png) {
        Ok(()) => out.into_inner(),
        Err(_) => Vec::new(),
    }
}

fn rels(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

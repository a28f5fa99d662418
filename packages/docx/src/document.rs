//! # Document
//!
//! A loaded word-processing package with its main part parsed into an
//! [`XmlTree`]. Paragraphs and tables are addressed by lightweight handles
//! into that tree. All mutation goes through `&mut Document`.
//!
//! Only body-level content is modelled: paragraphs and tables that are direct
//! children of `w:body`. Headers, footers, comments and tracked changes are
//! carried through untouched.

use crate::error::{DocxError, DocxResult};
use crate::ns;
use crate::package::{write_atomic, Package, Part};
use crate::rels::{
    rels_part_for, resolve_target, ContentTypes, Relationships, CONTENT_TYPES_PART,
    PACKAGE_RELS_PART,
};
use crate::styles::{set_toggle, toggle_value, FontOverride, StyleKind, StyleSheet, PPR_ORDER};
use crate::xml::{NodeId, XmlTree};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Text width of a US Letter page with one inch margins, in twips
const DEFAULT_BLOCK_WIDTH: i64 = 9360;

pub const EMU_PER_INCH: u64 = 914_400;

/// Handle to a body-level paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Paragraph(NodeId);

impl Paragraph {
    pub fn node(&self) -> NodeId {
        self.0
    }
}

/// Handle to a body-level table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table(NodeId);

impl Table {
    pub fn node(&self) -> NodeId {
        self.0
    }
}

/// Text and formatting of one run, as read back from a paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    main_part: String,
    tree: XmlTree,
    body: NodeId,
    styles: Option<StyleSheet>,
    styles_part: Option<String>,
    styles_dirty: bool,
    rels: Relationships,
    rels_dirty: bool,
    content_types: ContentTypes,
    content_types_dirty: bool,
    media: Vec<Part>,
    next_drawing_id: u64,
    created_at: Option<String>,
}

impl Document {
    pub fn open(path: impl AsRef<Path>) -> DocxResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        let package = Package::from_bytes(bytes)?;

        let package_rels = if package.contains(PACKAGE_RELS_PART) {
            Some(Relationships::parse(
                PACKAGE_RELS_PART,
                package.part_str(PACKAGE_RELS_PART)?,
            )?)
        } else {
            None
        };

        let main_part = package_rels
            .as_ref()
            .and_then(|rels| rels.target_of_type(ns::REL_OFFICE_DOCUMENT))
            .map(|target| resolve_target("", target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let tree = XmlTree::parse(package.part_str(&main_part)?)
            .map_err(|e| DocxError::xml(&main_part, e))?;
        let body = tree
            .first_child_element(tree.root(), ns::W, "body")
            .ok_or_else(|| DocxError::MissingBody(main_part.clone()))?;

        let rels_part = rels_part_for(&main_part);
        let rels = if package.contains(&rels_part) {
            Relationships::parse(&rels_part, package.part_str(&rels_part)?)?
        } else {
            Relationships::empty()
        };

        let styles_part = rels
            .target_of_type(ns::REL_STYLES)
            .map(|target| resolve_target(&main_part, target))
            .filter(|part| package.contains(part));
        let styles = match &styles_part {
            Some(part) => Some(StyleSheet::parse(part, package.part_str(part)?)?),
            None => None,
        };

        let content_types = ContentTypes::parse(package.part_str(CONTENT_TYPES_PART)?)?;
        let created_at = package_rels
            .as_ref()
            .and_then(|rels| rels.target_of_type(ns::REL_CORE_PROPERTIES))
            .and_then(|target| read_created(&package, &resolve_target("", target)));

        let next_drawing_id = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|node| tree.is_element(*node, ns::WP, "docPr"))
            .filter_map(|node| tree.attribute(node, None, "id")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let document = Self {
            package,
            main_part,
            tree,
            body,
            styles,
            styles_part,
            styles_dirty: false,
            rels,
            rels_dirty: false,
            content_types,
            content_types_dirty: false,
            media: Vec::new(),
            next_drawing_id,
            created_at,
        };

        info!(
            part = %document.main_part,
            paragraphs = document.paragraphs().len(),
            tables = document.tables().len(),
            "Loaded document"
        );

        Ok(document)
    }

    /// Serialize to `.docx` bytes. Unmodified parts are copied verbatim.
    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        let mut package = self.package.clone();

        package.set_part(&self.main_part, self.tree.to_xml().into_bytes());

        if self.styles_dirty {
            if let (Some(part), Some(styles)) = (&self.styles_part, &self.styles) {
                package.set_part(part, styles.to_xml().into_bytes());
            }
        }
        if self.rels_dirty {
            package.set_part(&rels_part_for(&self.main_part), self.rels.to_xml().into_bytes());
        }
        if self.content_types_dirty {
            package.set_part(CONTENT_TYPES_PART, self.content_types.to_xml().into_bytes());
        }
        for part in &self.media {
            package.set_part(&part.name, part.data.clone());
        }

        package.to_bytes()
    }

    /// Write to `path` through a temporary file, so a failed save leaves no
    /// partial document behind.
    pub fn save(&self, path: impl AsRef<Path>) -> DocxResult<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path.as_ref(), &bytes)
    }

    pub fn xml(&self) -> &XmlTree {
        &self.tree
    }

    pub fn styles(&self) -> Option<&StyleSheet> {
        self.styles.as_ref()
    }

    /// `dcterms:created` from the core properties, verbatim
    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    // ---- Reading ----

    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.tree
            .child_elements(self.body, ns::W, "p")
            .map(Paragraph)
            .collect()
    }

    pub fn tables(&self) -> Vec<Table> {
        self.tree
            .child_elements(self.body, ns::W, "tbl")
            .map(Table)
            .collect()
    }

    /// Visible text: run text, tabs as `\t`, line breaks as `\n`.
    /// Runs inside hyperlinks are included.
    pub fn paragraph_text(&self, paragraph: Paragraph) -> String {
        self.text_of(paragraph.0)
    }

    fn text_of(&self, p: NodeId) -> String {
        let mut text = String::new();

        for child in self.tree.children(p) {
            match self.tree.local_name_in(*child, ns::W) {
                Some("r") => self.run_text(*child, &mut text),
                Some("hyperlink") => {
                    for run in self.tree.child_elements(*child, ns::W, "r") {
                        self.run_text(run, &mut text);
                    }
                }
                _ => {}
            }
        }

        text
    }

    fn run_text(&self, run: NodeId, out: &mut String) {
        for child in self.tree.children(run) {
            match self.tree.local_name_in(*child, ns::W) {
                Some("t") => out.push_str(&self.tree.text_content(*child)),
                Some("tab") | Some("ptab") => out.push('\t'),
                Some("cr") => out.push('\n'),
                Some("br") => match self.tree.attribute(*child, Some(ns::W), "type") {
                    None | Some("textWrapping") => out.push('\n'),
                    Some(_) => {}
                },
                Some("noBreakHyphen") => out.push('-'),
                _ => {}
            }
        }
    }

    pub fn runs(&self, paragraph: Paragraph) -> Vec<RunInfo> {
        self.tree
            .child_elements(paragraph.0, ns::W, "r")
            .map(|run| {
                let mut text = String::new();
                self.run_text(run, &mut text);

                let bold = self
                    .tree
                    .first_child_element(run, ns::W, "rPr")
                    .and_then(|rpr| self.tree.first_child_element(rpr, ns::W, "b"))
                    .is_some_and(|b| toggle_value(self.tree.attribute(b, Some(ns::W), "val")));

                RunInfo { text, bold }
            })
            .collect()
    }

    /// Explicit `w:pStyle` of a paragraph
    pub fn paragraph_style_id(&self, paragraph: Paragraph) -> Option<&str> {
        let ppr = self.tree.first_child_element(paragraph.0, ns::W, "pPr")?;
        let pstyle = self.tree.first_child_element(ppr, ns::W, "pStyle")?;
        self.tree.attribute(pstyle, Some(ns::W), "val")
    }

    /// Display name of the paragraph's style, falling back to the document's
    /// default paragraph style when none is set
    pub fn paragraph_style_name(&self, paragraph: Paragraph) -> Option<String> {
        let styles = self.styles.as_ref();

        let style_id = match self.paragraph_style_id(paragraph) {
            Some(id) => id.to_string(),
            None => styles?.default_style_id(StyleKind::Paragraph)?,
        };

        Some(
            styles
                .and_then(|s| s.name_of(&style_id))
                .unwrap_or(style_id),
        )
    }

    pub fn paragraph_has_drawing(&self, paragraph: Paragraph) -> bool {
        self.tree
            .descendants(paragraph.0)
            .into_iter()
            .any(|node| self.tree.is_element(node, ns::W, "drawing"))
    }

    /// Serialized XML of one paragraph, for comparisons
    pub fn paragraph_xml(&self, paragraph: Paragraph) -> String {
        self.tree.node_to_xml(paragraph.0)
    }

    /// Cell text grid. Cells spanning several grid columns are repeated.
    pub fn table_rows(&self, table: Table) -> Vec<Vec<String>> {
        self.tree
            .child_elements(table.0, ns::W, "tr")
            .map(|row| {
                let mut cells = Vec::new();
                for cell in self.tree.child_elements(row, ns::W, "tc") {
                    let text = self
                        .tree
                        .child_elements(cell, ns::W, "p")
                        .map(|p| self.text_of(p))
                        .collect::<Vec<_>>()
                        .join("\n");

                    let span = self
                        .tree
                        .first_child_element(cell, ns::W, "tcPr")
                        .and_then(|pr| self.tree.first_child_element(pr, ns::W, "gridSpan"))
                        .and_then(|span| self.tree.attribute(span, Some(ns::W), "val"))
                        .and_then(|val| val.parse::<usize>().ok())
                        .unwrap_or(1)
                        .max(1);

                    cells.extend(std::iter::repeat(text).take(span));
                }
                cells
            })
            .collect()
    }

    pub fn table_style_id(&self, table: Table) -> Option<&str> {
        let pr = self.tree.first_child_element(table.0, ns::W, "tblPr")?;
        let style = self.tree.first_child_element(pr, ns::W, "tblStyle")?;
        self.tree.attribute(style, Some(ns::W), "val")
    }

    // ---- Styles ----

    pub fn apply_style_override(&mut self, name: &str, overrides: &FontOverride) -> bool {
        let applied = self
            .styles
            .as_mut()
            .is_some_and(|styles| styles.apply_override(name, overrides));
        self.styles_dirty |= applied;
        applied
    }

    pub fn has_style(&self, name: &str, kind: StyleKind) -> bool {
        self.styles
            .as_ref()
            .is_some_and(|styles| styles.contains(name, Some(kind)))
    }

    /// Point a paragraph at the named paragraph style. Returns `false`, leaving
    /// the paragraph as is, when the document has no such style.
    pub fn set_paragraph_style(&mut self, paragraph: Paragraph, name: &str) -> bool {
        let Some(style_id) = self
            .styles
            .as_ref()
            .and_then(|styles| styles.style_id(name, Some(StyleKind::Paragraph)))
        else {
            debug!(style = name, "Paragraph style not defined");
            return false;
        };

        let ppr = self.tree.ensure_child(paragraph.0, ns::W, "pPr", &["pPr"]);
        let pstyle = self.tree.ensure_child(ppr, ns::W, "pStyle", PPR_ORDER);
        self.tree.set_attribute(pstyle, Some(ns::W), "val", &style_id);
        true
    }

    /// Drop the explicit style so the paragraph uses the default style
    pub fn clear_paragraph_style(&mut self, paragraph: Paragraph) {
        if let Some(ppr) = self.tree.first_child_element(paragraph.0, ns::W, "pPr") {
            self.tree
                .retain_children(ppr, |tree, child| !tree.is_element(child, ns::W, "pStyle"));
        }
    }

    // ---- Content ----

    /// Remove all content except paragraph properties
    pub fn clear_runs(&mut self, paragraph: Paragraph) {
        self.tree
            .retain_children(paragraph.0, |tree, child| tree.is_element(child, ns::W, "pPr"));
    }

    /// Append a run. `\n` and `\r` become line breaks, `\t` becomes a tab.
    pub fn add_run(&mut self, paragraph: Paragraph, text: &str, bold: bool) {
        let run = self.tree.create_element(ns::W, "r");
        if bold {
            let rpr = self.tree.ensure_child(run, ns::W, "rPr", &["rPr"]);
            set_toggle(&mut self.tree, rpr, "b", true);
        }

        let mut buffer = String::new();
        for c in text.chars() {
            match c {
                '\t' => {
                    self.flush_text(run, &mut buffer);
                    let tab = self.tree.create_element(ns::W, "tab");
                    self.tree.append_child(run, tab);
                }
                '\n' | '\r' => {
                    self.flush_text(run, &mut buffer);
                    let br = self.tree.create_element(ns::W, "br");
                    self.tree.append_child(run, br);
                }
                _ => buffer.push(c),
            }
        }
        self.flush_text(run, &mut buffer);

        self.tree.append_child(paragraph.0, run);
    }

    fn flush_text(&mut self, run: NodeId, buffer: &mut String) {
        if buffer.is_empty() {
            return;
        }

        let t = self.tree.create_element(ns::W, "t");
        if buffer.trim() != buffer.as_str() {
            self.tree.set_attribute(t, Some(ns::XML), "space", "preserve");
        }
        let text = self.tree.create_text(buffer);
        self.tree.append_child(t, text);
        self.tree.append_child(run, t);
        buffer.clear();
    }

    /// A new, detached paragraph
    pub fn new_paragraph(&mut self) -> Paragraph {
        Paragraph(self.tree.create_element(ns::W, "p"))
    }

    /// A new, detached `rows` x `cols` table with one empty paragraph per
    /// cell. `style` is a table style name; unknown names are ignored.
    pub fn new_table(&mut self, rows: usize, cols: usize, style: Option<&str>) -> Table {
        let column_width = (self.block_width() / cols.max(1) as i64).to_string();
        let style_id = style.and_then(|name| {
            self.styles
                .as_ref()
                .and_then(|styles| styles.style_id(name, Some(StyleKind::Table)))
        });

        let tbl = self.tree.create_element(ns::W, "tbl");
        let tbl_pr = self.child(tbl, "tblPr");
        if let Some(style_id) = style_id {
            let tbl_style = self.child(tbl_pr, "tblStyle");
            self.tree.set_attribute(tbl_style, Some(ns::W), "val", &style_id);
        } else if let Some(name) = style {
            debug!(style = name, "Table style not defined");
        }
        let tbl_w = self.child(tbl_pr, "tblW");
        self.tree.set_attribute(tbl_w, Some(ns::W), "type", "auto");
        self.tree.set_attribute(tbl_w, Some(ns::W), "w", "0");
        let look = self.child(tbl_pr, "tblLook");
        for (name, value) in [
            ("val", "04A0"),
            ("firstRow", "1"),
            ("lastRow", "0"),
            ("firstColumn", "1"),
            ("lastColumn", "0"),
            ("noHBand", "0"),
            ("noVBand", "1"),
        ] {
            self.tree.set_attribute(look, Some(ns::W), name, value);
        }

        let grid = self.child(tbl, "tblGrid");
        for _ in 0..cols {
            let col = self.child(grid, "gridCol");
            self.tree.set_attribute(col, Some(ns::W), "w", &column_width);
        }

        for _ in 0..rows {
            let tr = self.child(tbl, "tr");
            for _ in 0..cols {
                let tc = self.child(tr, "tc");
                let tc_pr = self.child(tc, "tcPr");
                let tc_w = self.child(tc_pr, "tcW");
                self.tree.set_attribute(tc_w, Some(ns::W), "w", &column_width);
                self.tree.set_attribute(tc_w, Some(ns::W), "type", "dxa");
                self.child(tc, "p");
            }
        }

        Table(tbl)
    }

    fn child(&mut self, parent: NodeId, local: &str) -> NodeId {
        let node = self.tree.create_element(ns::W, local);
        self.tree.append_child(parent, node);
        node
    }

    /// Replace a cell's content with a single plain run. Returns `false` when
    /// the cell does not exist.
    pub fn set_cell_text(&mut self, table: Table, row: usize, col: usize, text: &str) -> bool {
        let Some(tc) = self
            .tree
            .child_elements(table.0, ns::W, "tr")
            .nth(row)
            .and_then(|tr| self.tree.child_elements(tr, ns::W, "tc").nth(col))
        else {
            return false;
        };

        let paragraph = match self.tree.first_child_element(tc, ns::W, "p") {
            Some(p) => p,
            None => self.child(tc, "p"),
        };
        self.tree.retain_children(tc, |tree, child| {
            child == paragraph || !tree.is_element(child, ns::W, "p")
        });

        let paragraph = Paragraph(paragraph);
        self.clear_runs(paragraph);
        if !text.is_empty() {
            self.add_run(paragraph, text, false);
        }
        true
    }

    /// A new, detached paragraph holding `image` inline at `width_emu`,
    /// height scaled to keep the aspect ratio. The image is stored as a new
    /// media part.
    pub fn new_image_paragraph(&mut self, image: &[u8], width_emu: u64) -> DocxResult<Paragraph> {
        let reader = image::ImageReader::new(Cursor::new(image)).with_guessed_format()?;
        let format = reader.format().ok_or(DocxError::UnknownImageFormat)?;
        let (px_width, px_height) = reader.into_dimensions()?;
        if px_width == 0 {
            return Err(DocxError::UnknownImageFormat);
        }
        let height_emu = width_emu * u64::from(px_height) / u64::from(px_width);

        let extension = format.extensions_str().first().copied().unwrap_or("bin");
        let (part_name, target, ordinal) = self.next_media_name(extension);

        let rel_id = self.rels.add(ns::REL_IMAGE, &target);
        self.rels_dirty = true;
        self.content_types
            .ensure_default(extension, format.to_mime_type());
        self.content_types_dirty = true;
        self.media.push(Part {
            name: part_name,
            data: image.to_vec(),
        });

        let drawing_id = self.next_drawing_id;
        self.next_drawing_id += 1;

        let paragraph = self.new_paragraph();
        let run = self.child(paragraph.0, "r");
        let drawing = self.child(run, "drawing");
        self.build_inline(drawing, &rel_id, drawing_id, ordinal, extension, width_emu, height_emu);

        debug!(rel = %rel_id, width_emu, height_emu, "Added inline image");
        Ok(paragraph)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_inline(
        &mut self,
        drawing: NodeId,
        rel_id: &str,
        drawing_id: u64,
        ordinal: usize,
        extension: &str,
        cx: u64,
        cy: u64,
    ) {
        let (cx, cy) = (cx.to_string(), cy.to_string());
        let (cx, cy) = (cx.as_str(), cy.as_str());
        let file_name = format!("diagram{}.{}", ordinal, extension);
        let id = drawing_id.to_string();
        let name = format!("Picture {}", drawing_id);

        let inline = self.ns_child(drawing, ns::WP, "inline", &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")]);
        self.ns_child(inline, ns::WP, "extent", &[("cx", cx), ("cy", cy)]);
        self.ns_child(
            inline,
            ns::WP,
            "docPr",
            &[("id", id.as_str()), ("name", name.as_str())],
        );
        let frame = self.ns_child(inline, ns::WP, "cNvGraphicFramePr", &[]);
        self.ns_child(frame, ns::A, "graphicFrameLocks", &[("noChangeAspect", "1")]);

        let graphic = self.ns_child(inline, ns::A, "graphic", &[]);
        let data = self.ns_child(graphic, ns::A, "graphicData", &[("uri", ns::PIC)]);
        let pic = self.ns_child(data, ns::PIC, "pic", &[]);

        let nv = self.ns_child(pic, ns::PIC, "nvPicPr", &[]);
        self.ns_child(nv, ns::PIC, "cNvPr", &[("id", "0"), ("name", file_name.as_str())]);
        self.ns_child(nv, ns::PIC, "cNvPicPr", &[]);

        let fill = self.ns_child(pic, ns::PIC, "blipFill", &[]);
        let blip = self.ns_child(fill, ns::A, "blip", &[]);
        self.tree.set_attribute(blip, Some(ns::R), "embed", rel_id);
        let stretch = self.ns_child(fill, ns::A, "stretch", &[]);
        self.ns_child(stretch, ns::A, "fillRect", &[]);

        let sp_pr = self.ns_child(pic, ns::PIC, "spPr", &[]);
        let xfrm = self.ns_child(sp_pr, ns::A, "xfrm", &[]);
        self.ns_child(xfrm, ns::A, "off", &[("x", "0"), ("y", "0")]);
        self.ns_child(xfrm, ns::A, "ext", &[("cx", cx), ("cy", cy)]);
        let geom = self.ns_child(sp_pr, ns::A, "prstGeom", &[("prst", "rect")]);
        self.ns_child(geom, ns::A, "avLst", &[]);
    }

    fn ns_child(&mut self, parent: NodeId, namespace: &str, local: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.tree.create_element(namespace, local);
        for (name, value) in attrs {
            self.tree.set_attribute(node, None, name, value);
        }
        self.tree.append_child(parent, node);
        node
    }

    fn next_media_name(&self, extension: &str) -> (String, String, usize) {
        let dir = self
            .main_part
            .rsplit_once('/')
            .map(|(dir, _)| format!("{}/", dir))
            .unwrap_or_default();

        let mut ordinal = self.media.len() + 1;
        loop {
            let target = format!("media/diagram{}.{}", ordinal, extension);
            let part = format!("{}{}", dir, target);
            if !self.package.contains(&part) && !self.media.iter().any(|m| m.name == part) {
                return (part, target, ordinal);
            }
            ordinal += 1;
        }
    }

    fn block_width(&self) -> i64 {
        let Some(sect_pr) = self.tree.first_child_element(self.body, ns::W, "sectPr") else {
            return DEFAULT_BLOCK_WIDTH;
        };

        let twips = |local: &str, attr: &str| -> Option<i64> {
            let node = self.tree.first_child_element(sect_pr, ns::W, local)?;
            self.tree.attribute(node, Some(ns::W), attr)?.parse().ok()
        };

        match (twips("pgSz", "w"), twips("pgMar", "left"), twips("pgMar", "right")) {
            (Some(width), Some(left), Some(right)) if width > left + right => width - left - right,
            _ => DEFAULT_BLOCK_WIDTH,
        }
    }

    // ---- Splicing ----

    /// Insert a detached element directly after `anchor`, or at the start of
    /// the body when there is no anchor.
    pub fn insert_after(&mut self, anchor: Option<NodeId>, node: NodeId) {
        let placed = match anchor {
            Some(anchor) => self.tree.insert_after(anchor, node),
            None => false,
        };

        if !placed {
            self.tree.insert_child(self.body, 0, node);
        }
    }

    /// Remove an element from the document
    pub fn remove(&mut self, node: NodeId) {
        self.tree.detach(node);
    }
}

fn read_created(package: &Package, part: &str) -> Option<String> {
    let xml = package.part_str(part).ok()?;
    let tree = match XmlTree::parse(xml) {
        Ok(tree) => tree,
        Err(err) => {
            debug!(part, error = %err, "Unreadable core properties");
            return None;
        }
    };

    tree.descendants(tree.root())
        .into_iter()
        .find(|node| tree.is_element(*node, ns::DCTERMS, "created"))
        .map(|node| tree.text_content(node).trim().to_string())
        .filter(|text| !text.is_empty())
}

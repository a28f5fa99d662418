//! # Docedit Docx
//!
//! Reading and writing word-processing packages (`.docx`).
//!
//! ```text
//! bytes ──Package──► parts ──XmlTree──► Document ──to_bytes()──► bytes
//!                      │                   │
//!                 rels, content      paragraphs, tables,
//!                 types, styles      runs, styles, images
//! ```
//!
//! The main document part is held as an owned, mutable XML tree so elements
//! can be re-styled, re-filled, inserted and removed without disturbing the
//! markup around them. Parts the editor never touches are written back
//! byte-for-byte, and output archives are deterministic.

pub mod document;
pub mod error;
pub mod ns;
pub mod package;
pub mod rels;
pub mod styles;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use document::{Document, Paragraph, RunInfo, Table, EMU_PER_INCH};
pub use error::{DocxError, DocxResult};
pub use package::{write_atomic, Package, Part};
pub use styles::{Alignment, FontOverride, StyleKind, StyleSheet};
pub use xml::{NodeId, XmlTree};

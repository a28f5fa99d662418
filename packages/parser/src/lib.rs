//! # Docedit Parser
//!
//! Text-level parsing of paragraph content.
//!
//! A paragraph in the structure tree carries free-form text that may embed
//! markdown tables, fenced diagram sources and light inline markup. This crate
//! turns that text into things a document writer can emit:
//!
//! ```text
//! paragraph text ──segment()──► [ContentBlock]  (text | table | diagram)
//!                                   │
//!            text block ──parse_inline()──► list marker + bold/plain runs
//!           table block ──parse_table()───► column count + rows
//! ```
//!
//! Everything here is pure: no I/O, no global state, safe to call from any
//! thread on independent inputs.

pub mod blocks;
pub mod markdown;
pub mod table;

pub use blocks::{segment, BlockKind, Blocks, ContentBlock, DIAGRAM_SENTINEL};
pub use markdown::{bold_runs, parse_inline, InlineMarkdown, ListMarker, Run};
pub use table::{parse_table, MarkdownTable, TableRow};

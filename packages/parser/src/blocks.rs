//! # Block Segmentation
//!
//! Splits paragraph text into typed content blocks.
//!
//! ## Rules
//!
//! - A line whose trimmed, lowercased form starts with ```` ```mermaid ````
//!   opens a diagram fence. Everything up to the closing fence (a trimmed line
//!   starting with ```` ``` ````) becomes one diagram block. An unclosed fence
//!   runs to the end of input.
//! - Lines whose trimmed form starts with `|` are table rows. Entering or
//!   leaving table mode flushes the buffered lines as one block.
//! - Every other line is text.
//! - A text block that mentions `mermaid` or `graph lr` is reclassified as a
//!   diagram with [`DIAGRAM_SENTINEL`] content, to recover from broken fences.
//!
//! Every input line lands in exactly one block. [`ContentBlock::source`] keeps
//! the raw lines (fences included), so joining the sources of all blocks with
//! `\n` reproduces the input.

use serde::{Deserialize, Serialize};

/// Content given to diagrams recovered by the text heuristic.
pub const DIAGRAM_SENTINEL: &str = "static_override";

const DIAGRAM_FENCE: &str = "```mermaid";
const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Table,
    Diagram,
}

/// A typed slice of paragraph text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// Text to render. For fenced diagrams this is the source between fences.
    pub content: String,

    #[serde(skip)]
    source: String,
}

impl ContentBlock {
    fn new(kind: BlockKind, content: String, source: String) -> Self {
        Self {
            kind,
            content,
            source,
        }
    }

    /// Raw input lines this block was built from, joined with `\n`
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_text(&self) -> bool {
        self.kind == BlockKind::Text
    }
}

/// Lazy block iterator returned by [`segment`].
///
/// Cloning snapshots the scan position; call [`segment`] again to rescan.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    lines: std::str::Split<'a, char>,
    mode: BlockKind,
    buffer: Vec<&'a str>,
    pending: Option<ContentBlock>,
}

/// Segment `text` into content blocks.
///
/// Empty input yields a single empty text block, matching a paragraph with no
/// text.
pub fn segment(text: &str) -> Blocks<'_> {
    Blocks {
        lines: text.split('\n'),
        mode: BlockKind::Text,
        buffer: Vec::new(),
        pending: None,
    }
}

impl<'a> Blocks<'a> {
    fn flush(&mut self) -> Option<ContentBlock> {
        if self.buffer.is_empty() {
            return None;
        }

        let joined = self.buffer.join("\n");
        self.buffer.clear();

        if self.mode == BlockKind::Text && mentions_diagram(&joined) {
            return Some(ContentBlock::new(
                BlockKind::Diagram,
                DIAGRAM_SENTINEL.to_string(),
                joined,
            ));
        }

        Some(ContentBlock::new(self.mode, joined.clone(), joined))
    }

    fn consume_diagram(&mut self, opening: &'a str) -> ContentBlock {
        let mut body = Vec::new();
        let mut closing = None;

        for line in self.lines.by_ref() {
            if line.trim().starts_with(FENCE) {
                closing = Some(line);
                break;
            }
            body.push(line);
        }

        let content = body.join("\n");
        let mut source = vec![opening];
        source.extend(body);
        source.extend(closing);

        ContentBlock::new(BlockKind::Diagram, content, source.join("\n"))
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = ContentBlock;

    fn next(&mut self) -> Option<ContentBlock> {
        if let Some(block) = self.pending.take() {
            return Some(block);
        }

        while let Some(line) = self.lines.next() {
            let trimmed = line.trim();

            if is_diagram_fence(trimmed) {
                let flushed = self.flush();
                self.mode = BlockKind::Text;
                let diagram = self.consume_diagram(line);

                return match flushed {
                    Some(block) => {
                        self.pending = Some(diagram);
                        Some(block)
                    }
                    None => Some(diagram),
                };
            }

            let mode = if trimmed.starts_with('|') {
                BlockKind::Table
            } else {
                BlockKind::Text
            };

            if mode != self.mode {
                let flushed = self.flush();
                self.mode = mode;
                self.buffer.push(line);
                if flushed.is_some() {
                    return flushed;
                }
            } else {
                self.buffer.push(line);
            }
        }

        self.flush()
    }
}

fn is_diagram_fence(trimmed: &str) -> bool {
    trimmed.to_lowercase().starts_with(DIAGRAM_FENCE)
}

fn mentions_diagram(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("mermaid") || lower.contains("graph lr")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<BlockKind> {
        segment(text).map(|b| b.kind).collect()
    }

    #[test]
    fn test_plain_text_is_one_block() {
        let blocks: Vec<_> = segment("Hello\nWorld").collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Text);
        assert_eq!(blocks[0].content, "Hello\nWorld");
    }

    #[test]
    fn test_empty_text_yields_empty_text_block() {
        let blocks: Vec<_> = segment("").collect();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_text());
        assert_eq!(blocks[0].content, "");
    }

    #[test]
    fn test_table_mode_switches_flush() {
        let text = "Intro\n| a | b |\n|---|---|\n| 1 | 2 |\nOutro";
        assert_eq!(
            kinds(text),
            vec![BlockKind::Text, BlockKind::Table, BlockKind::Text]
        );

        let table = segment(text).nth(1).unwrap();
        assert_eq!(table.content, "| a | b |\n|---|---|\n| 1 | 2 |");
    }

    #[test]
    fn test_indented_table_rows() {
        assert_eq!(kinds("  | a |\n\t| b |"), vec![BlockKind::Table]);
    }

    #[test]
    fn test_fenced_diagram() {
        let text = "Before\n```mermaid\ngraph TD\n  A --> B\n```\nAfter";
        let blocks: Vec<_> = segment(text).collect();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Diagram);
        assert_eq!(blocks[1].content, "graph TD\n  A --> B");
        assert_eq!(blocks[1].source(), "```mermaid\ngraph TD\n  A --> B\n```");
        assert_eq!(blocks[2].content, "After");
    }

    #[test]
    fn test_fence_tag_is_case_insensitive() {
        let blocks: Vec<_> = segment("```Mermaid\nflowchart TB\n```").collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "flowchart TB");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let blocks: Vec<_> = segment("```mermaid\nsequenceDiagram\nA->>B: hi").collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Diagram);
        assert_eq!(blocks[0].content, "sequenceDiagram\nA->>B: hi");
    }

    #[test]
    fn test_diagram_heuristic_reclassifies_text() {
        let blocks: Vec<_> = segment("Flow: graph LR; A-->B").collect();
        assert_eq!(blocks[0].kind, BlockKind::Diagram);
        assert_eq!(blocks[0].content, DIAGRAM_SENTINEL);
        assert_eq!(blocks[0].source(), "Flow: graph LR; A-->B");
    }

    #[test]
    fn test_heuristic_skips_tables() {
        assert_eq!(kinds("| mermaid | x |"), vec![BlockKind::Table]);
    }

    #[test]
    fn test_restartable() {
        let text = "a\n| b |\nc";
        let first: Vec<_> = segment(text).collect();
        let second: Vec<_> = segment(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_lazy_take() {
        let mut blocks = segment("a\n| b |\nc\n| d |");
        assert_eq!(blocks.next().map(|b| b.content), Some("a".to_string()));
        assert_eq!(blocks.next().map(|b| b.kind), Some(BlockKind::Table));
    }
}

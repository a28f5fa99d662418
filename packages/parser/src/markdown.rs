//! Inline markdown: list markers and `**bold**` runs.

const BOLD: &str = "**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    /// `* ` or `- `
    Bullet,
    /// `1. `
    Numbered,
}

/// A run of uniformly formatted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineMarkdown {
    pub list: Option<ListMarker>,
    pub runs: Vec<Run>,
}

impl InlineMarkdown {
    /// Visible text once markers and delimiters are gone
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Parse one block of paragraph text.
///
/// The text is trimmed, a leading list marker is detected and stripped, and
/// the rest is split into alternating plain/bold runs.
pub fn parse_inline(text: &str) -> InlineMarkdown {
    let clean = text.trim();
    let (list, body) = strip_list_marker(clean);

    InlineMarkdown {
        list,
        runs: bold_runs(body),
    }
}

fn strip_list_marker(text: &str) -> (Option<ListMarker>, &str) {
    if let Some(rest) = text.strip_prefix("* ").or_else(|| text.strip_prefix("- ")) {
        (Some(ListMarker::Bullet), rest)
    } else if let Some(rest) = text.strip_prefix("1. ") {
        (Some(ListMarker::Numbered), rest)
    } else {
        (None, text)
    }
}

/// Split on `**`: even segments plain, odd segments bold, empty segments
/// dropped. With an odd delimiter count the last `**` is literal text.
pub fn bold_runs(text: &str) -> Vec<Run> {
    let mut segments: Vec<String> = text.split(BOLD).map(str::to_string).collect();

    if segments.len() % 2 == 0 {
        if let Some(tail) = segments.pop() {
            if let Some(previous) = segments.last_mut() {
                previous.push_str(BOLD);
                previous.push_str(&tail);
            }
        }
    }

    segments
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| Run {
            text,
            bold: i % 2 == 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let md = parse_inline("  Hello world  ");
        assert_eq!(md.list, None);
        assert_eq!(md.runs, vec![Run::plain("Hello world")]);
    }

    #[test]
    fn test_bold_runs() {
        let md = parse_inline("The **quick** fox **jumps**");
        assert_eq!(
            md.runs,
            vec![
                Run::plain("The "),
                Run::bold("quick"),
                Run::plain(" fox "),
                Run::bold("jumps"),
            ]
        );
    }

    #[test]
    fn test_leading_bold_skips_empty_segment() {
        let md = parse_inline("**Note:** read this");
        assert_eq!(md.runs, vec![Run::bold("Note:"), Run::plain(" read this")]);
    }

    #[test]
    fn test_bullet_markers() {
        let star = parse_inline("* item");
        let dash = parse_inline("- item");
        assert_eq!(star.list, Some(ListMarker::Bullet));
        assert_eq!(dash.list, Some(ListMarker::Bullet));
        assert_eq!(star.text(), "item");
    }

    #[test]
    fn test_numbered_marker() {
        let md = parse_inline("1. first **step**");
        assert_eq!(md.list, Some(ListMarker::Numbered));
        assert_eq!(md.runs, vec![Run::plain("first "), Run::bold("step")]);
    }

    #[test]
    fn test_bold_prefix_is_not_a_bullet() {
        let md = parse_inline("**Bold** start");
        assert_eq!(md.list, None);
        assert_eq!(md.runs[0], Run::bold("Bold"));
    }

    #[test]
    fn test_unpaired_delimiter_is_literal() {
        assert_eq!(bold_runs("a **b"), vec![Run::plain("a **b")]);
        assert_eq!(
            bold_runs("a **b** c **d"),
            vec![Run::plain("a "), Run::bold("b"), Run::plain(" c **d")]
        );
    }

    #[test]
    fn test_empty_text_has_no_runs() {
        assert!(parse_inline("").runs.is_empty());
        assert!(bold_runs("****").is_empty());
    }
}

//! Markdown-style table parsing (`| cell | cell |` rows).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    /// A `|---|:--:|` style row. It still occupies a row slot.
    Separator,
    Cells(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTable {
    pub column_count: usize,
    pub rows: Vec<TableRow>,
}

impl MarkdownTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Parse table markup. The first non-empty row fixes the column count; extra
/// cells in later rows are dropped. Returns `None` when there is no row with a
/// non-empty cell to size the table from.
pub fn parse_table(markup: &str) -> Option<MarkdownTable> {
    let lines: Vec<&str> = markup
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let header = lines.first()?;
    let column_count = header
        .split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .count();

    if column_count == 0 {
        return None;
    }

    let rows = lines
        .iter()
        .map(|line| {
            if is_separator(line) {
                TableRow::Separator
            } else {
                TableRow::Cells(
                    line.split('|')
                        .filter(|cell| !cell.is_empty())
                        .map(|cell| cell.trim().to_string())
                        .take(column_count)
                        .collect(),
                )
            }
        })
        .collect();

    Some(MarkdownTable { column_count, rows })
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_table() {
        let table = parse_table("| Name | Role |\n|---|---|\n| Ada | Eng |").unwrap();

        assert_eq!(table.column_count, 2);
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.rows[0],
            TableRow::Cells(vec!["Name".to_string(), "Role".to_string()])
        );
        assert_eq!(table.rows[1], TableRow::Separator);
        assert_eq!(
            table.rows[2],
            TableRow::Cells(vec!["Ada".to_string(), "Eng".to_string()])
        );
    }

    #[test]
    fn test_aligned_separator() {
        let table = parse_table("| a | b |\n| :--- | ---: |").unwrap();
        assert_eq!(table.rows[1], TableRow::Separator);
    }

    #[test]
    fn test_blank_cell_kept_in_body_rows() {
        let table = parse_table("| a | b | c |\n| 1 |   | 3 |").unwrap();
        assert_eq!(
            table.rows[1],
            TableRow::Cells(vec!["1".to_string(), String::new(), "3".to_string()])
        );
    }

    #[test]
    fn test_extra_cells_truncated() {
        let table = parse_table("| a |\n| 1 | 2 | 3 |").unwrap();
        assert_eq!(table.column_count, 1);
        assert_eq!(table.rows[1], TableRow::Cells(vec!["1".to_string()]));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let table = parse_table("\n| a |\n\n| b |\n").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_empty_header_is_not_a_table() {
        assert!(parse_table("||").is_none());
        assert!(parse_table("").is_none());
    }
}

use crc32fast::Hasher;

/// Content fingerprint of a paragraph's text (CRC32, hex). Diagnostic only;
/// ids stay positional.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(text.as_bytes());
    format!("{:08x}", hasher.finalize())
}

pub fn section_id(section: usize) -> String {
    format!("s{}", section)
}

/// Id of an inserted paragraph. Contains `_new_`, which positional ids never do.
pub fn synthesized_paragraph_id(section_id: &str, timestamp_ms: i64, ordinal: usize) -> String {
    format!("{}_new_{}_{}", section_id, timestamp_ms, ordinal)
}

pub fn is_synthesized(id: &str) -> bool {
    id.contains("_new_")
}

/// Sequential positional ids within one section (`s1_p1`, `s1_p2`, `s1_t1`, ...)
#[derive(Debug, Clone)]
pub struct IdGenerator {
    section: usize,
    paragraphs: usize,
    tables: usize,
}

impl IdGenerator {
    pub fn new(section: usize) -> Self {
        Self {
            section,
            paragraphs: 0,
            tables: 0,
        }
    }

    pub fn section_id(&self) -> String {
        section_id(self.section)
    }

    pub fn next_paragraph(&mut self) -> String {
        self.paragraphs += 1;
        format!("s{}_p{}", self.section, self.paragraphs)
    }

    pub fn next_table(&mut self) -> String {
        self.tables += 1;
        format!("s{}_t{}", self.section, self.tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_ids() {
        let mut gen = IdGenerator::new(1);

        assert_eq!(gen.next_paragraph(), "s1_p1");
        assert_eq!(gen.next_paragraph(), "s1_p2");
        assert_eq!(gen.next_table(), "s1_t1");
        assert_eq!(gen.section_id(), "s1");
    }

    #[test]
    fn test_synthesized_ids_are_distinguishable() {
        let id = synthesized_paragraph_id("s1", 1_700_000_000_000, 3);

        assert_eq!(id, "s1_new_1700000000000_3");
        assert!(is_synthesized(&id));
        assert!(!is_synthesized(&IdGenerator::new(1).next_paragraph()));
    }

    #[test]
    fn test_fingerprint() {
        assert_eq!(fingerprint("Title"), fingerprint("Title"));
        assert_ne!(fingerprint("Title"), fingerprint("title"));
        assert_eq!(fingerprint("").len(), 8);
    }
}

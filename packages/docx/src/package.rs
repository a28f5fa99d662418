//! Zip container of an OOXML package.
//!
//! Parts keep their archive order. Writing is deterministic: every entry gets
//! the same fixed timestamp and deflate compression, so identical part bytes
//! always give identical archive bytes.

use crate::error::{DocxError, DocxResult};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: normalize_name(file.name()),
                data,
            });
        }

        debug!(parts = parts.len(), "Read package");
        Ok(Self { parts })
    }

    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = normalize_name(name);
        self.parts
            .iter()
            .find(|part| part.name == name)
            .map(|part| part.data.as_slice())
    }

    /// A part decoded as UTF-8 text
    pub fn part_str(&self, name: &str) -> DocxResult<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
        std::str::from_utf8(data).map_err(|_| DocxError::Encoding(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replace a part in place, or append it when new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        let name = normalize_name(name);
        match self.parts.iter_mut().find(|part| part.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part { name, data }),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }
}

/// Write `bytes` to a temporary file next to `path`, then rename it over
/// `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> DocxResult<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path)?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote package");
    Ok(())
}

/// Part names are stored without a leading slash
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

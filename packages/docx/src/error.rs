use thiserror::Error;

pub type DocxResult<T> = Result<T, DocxError>;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Missing part: {0}")]
    MissingPart(String),

    #[error("Part {0} is not valid UTF-8")]
    Encoding(String),

    #[error("No document body in {0}")]
    MissingBody(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unrecognized image format")]
    UnknownImageFormat,

    #[error("Could not persist file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl DocxError {
    pub fn xml(part: impl Into<String>, source: roxmltree::Error) -> Self {
        Self::Xml {
            part: part.into(),
            source,
        }
    }
}

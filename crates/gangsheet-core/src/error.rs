use thiserror::Error;

/// An image that cannot fit the sheet in either orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct OversizedItem {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

impl std::fmt::Display for OversizedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}x{})", self.id, self.width, self.height)
    }
}

pub(crate) fn join_oversized(items: &[OversizedItem]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum NestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("No images were provided for nesting")]
    Empty,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "Some images are too large for the sheet even when rotated. Offending images: {}",
        join_oversized(.items)
    )]
    Oversized { items: Vec<OversizedItem> },
    #[error("Nesting failed to produce any layout ({total} unit(s) requested). Check image dimensions.")]
    NoLayout { total: usize },
    #[error("Nesting was cancelled")]
    Cancelled,
    #[error("Nesting deadline expired before any strategy completed")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, NestError>;

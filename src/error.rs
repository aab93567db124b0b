use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatalogError::InvalidRequest(msg.into())
    }

    /// Client errors map to 400, everything else to 500.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CatalogError::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

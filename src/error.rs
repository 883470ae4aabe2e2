use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcoScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API key configured. Set one with `eco-scan config --set-api-key YOUR_KEY` or GEMINI_API_KEY")]
    MissingApiKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("API call failed: {0}")]
    ApiCall(String),

    #[error("Failed to parse API response: {0}")]
    ApiParse(String),

    #[error("No items found on receipt: {0}")]
    NoItemsFound(String),

    #[error("No receipt images found in: {0}")]
    NoImagesFound(String),

    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("Scan not found: {0}")]
    ScanNotFound(String),

    #[error("Excel export failed: {0}")]
    ExcelGeneration(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] eco_scan_common::Error),
}

pub type Result<T> = std::result::Result<T, EcoScanError>;

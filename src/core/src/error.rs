use thiserror::Error;

/// Modelcar extraction error types
#[derive(Error, Debug)]
pub enum ModelcarError {
    /// Image reference could not be parsed
    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    /// Container registry error (connect, manifest, config or blob)
    #[error("Registry error: {registry} - {message}")]
    RegistryError { registry: String, message: String },

    /// A bounded registry call ran out of time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Corrupt or undecodable layer payload
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Archive entry would land outside the destination directory
    #[error("Unsafe path: {0}")]
    UnsafePath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Catalog generation error
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for ModelcarError {
    fn from(err: serde_json::Error) -> Self {
        ModelcarError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ModelcarError {
    fn from(err: serde_yaml::Error) -> Self {
        ModelcarError::SerializationError(err.to_string())
    }
}

/// Result type alias for modelcar operations
pub type Result<T> = std::result::Result<T, ModelcarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reference_display() {
        let error = ModelcarError::InvalidReference("empty image reference".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid image reference: empty image reference"
        );
    }

    #[test]
    fn test_registry_error_display() {
        let error = ModelcarError::RegistryError {
            registry: "quay.io".to_string(),
            message: "Failed to pull manifest".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Registry error: quay.io - Failed to pull manifest"
        );
    }

    #[test]
    fn test_timeout_display() {
        let error = ModelcarError::Timeout("blob fetch exceeded 60s".to_string());
        assert_eq!(error.to_string(), "Timeout: blob fetch exceeded 60s");
    }

    #[test]
    fn test_unsafe_path_display() {
        let error = ModelcarError::UnsafePath("../../etc/passwd".to_string());
        assert_eq!(error.to_string(), "Unsafe path: ../../etc/passwd");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ModelcarError = io_error.into();
        assert!(matches!(error, ModelcarError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<Vec<String>>("a: [").unwrap_err();
        let error: ModelcarError = yaml_error.into();
        assert!(matches!(error, ModelcarError::SerializationError(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = ModelcarError::Other("Unknown error occurred".to_string());
        assert_eq!(error.to_string(), "Unknown error occurred");
    }
}

/// Errors raised by the detection core.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
}

impl DetectionError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        DetectionError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;

/// Reject images with a zero-sized dimension.
pub(crate) fn ensure_non_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "image has zero-sized dimension ({}x{})",
            width, height
        )));
    }
    Ok(())
}

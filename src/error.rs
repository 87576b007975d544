use std::fmt;

#[derive(Debug)]
pub enum BezelError {
    InvalidConfiguration(String),
    RenderFailed(String),
}

impl fmt::Display for BezelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BezelError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            BezelError::RenderFailed(message) => write!(f, "render failed: {}", message),
        }
    }
}

impl std::error::Error for BezelError {}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tempfile::PersistError> for RenderError {
    fn from(err: tempfile::PersistError) -> Self {
        RenderError::Io(err.error)
    }
}

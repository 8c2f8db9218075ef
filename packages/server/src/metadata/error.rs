use sea_orm::{DbErr, SqlErr};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("no record named {0:?}")]
    NotFound(String),
    #[error("a record named {0:?} already exists")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl MetadataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Classify a write error against `filename`.
    pub(crate) fn from_write(err: DbErr, filename: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict(filename.to_string()),
            _ => Self::Database(err),
        }
    }
}

pub mod document_store;
mod in_memory;

pub use document_store::Collection;
pub use document_store::Config;
pub use document_store::DocumentStore;
pub use document_store::UpdateOutcome;
pub use mongodb::bson;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
    #[error("unknown update operator '{0}'")]
    UnsupportedOperator(String),
    #[error("cannot apply '{operator}' on '{path}': {reason}")]
    InvalidUpdate {
        operator: String,
        path: String,
        reason: String,
    },
    #[error("duplicate key error on '_id': {0}")]
    DuplicateKey(bson::Bson),
}

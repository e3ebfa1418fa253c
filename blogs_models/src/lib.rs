pub mod blog;
mod category;
mod comment;
#[cfg(any(test, feature = "testing"))]
pub mod fixtures;
pub mod repository;
mod status;
mod vote;

pub use blog::Blog;
pub use category::Category;
pub use comment::Comment;
pub use repository::BlogRepository;
pub use status::Status;
pub use vote::Vote;

use std::time::Duration;

use chrono::DateTime;
use chrono::SubsecRound as _;
use chrono::Utc;
use database::DatabaseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{id}' is not a valid identifier")]
    InvalidId {
        id: String,
        source: bson::oid::Error,
    },
    #[error("blog '{blog_id}' could not be found")]
    BlogNotFound { blog_id: String },
    #[error("'{operation}' did not complete within {}s", timeout.as_secs())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("could not encode a blog document: {0}")]
    Encoding(#[from] bson::ser::Error),
    #[error("could not decode a blog document: {0}")]
    Decoding(#[from] bson::de::Error),
}

/// An integer code outside of an enumerated domain
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{value} is not a valid {kind}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: i32,
}

/// Truncates `time` to the millisecond, the precision of stored dates
pub fn stored_precision(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(3)
}

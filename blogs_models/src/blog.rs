use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::Category;
use crate::Comment;
use crate::Status;
use crate::Vote;
use crate::stored_precision;

/// A blog post, owning its comments and votes as embedded sub-documents
///
/// Every field is always written so that zero values (a [Status::Draft] blog, an empty
/// title) can be queried. Decoding is lenient: missing fields take their default value.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Blog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: u32,
    pub username: String,
    pub title: String,
    pub description: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub creation_time: DateTime<Utc>,
    pub status: Status,
    pub image: String,
    pub category: Category,
    #[serde(deserialize_with = "lenient_sequence")]
    pub comments: Vec<Comment>,
    #[serde(deserialize_with = "lenient_sequence")]
    pub votes: Vec<Vote>,
}

impl Blog {
    /// Upvotes minus downvotes
    pub fn votes_count(&self) -> i64 {
        self.votes
            .iter()
            .map(|vote| if vote.is_upvote { 1 } else { -1 })
            .sum()
    }

    /// Brings every date of the blog, its comments and votes to the stored precision
    pub(crate) fn truncate_timestamps(&mut self) {
        self.creation_time = stored_precision(self.creation_time);
        for comment in &mut self.comments {
            comment.truncate_timestamps();
        }
        for vote in &mut self.votes {
            vote.creation_time = stored_precision(vote.creation_time);
        }
    }
}

/// Positional updates past the end of a sequence leave `null` entries behind them,
/// those decode as default values.
fn lenient_sequence<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let entries = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::stored_precision;

/// A comment embedded in a blog
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    // Existing documents spell this key differently from the blog and vote ones
    #[serde(rename = "userID")]
    pub user_id: u32,
    pub username: String,
    pub text: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub creation_time: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_modification: DateTime<Utc>,
}

impl Comment {
    pub(crate) fn truncate_timestamps(&mut self) {
        self.creation_time = stored_precision(self.creation_time);
        self.last_modification = stored_precision(self.last_modification);
    }
}

//! Conversions between the wire messages and the models
//!
//! Both directions are total. Mapping a wire message never sets an identifier: blog and
//! comment identifiers are generated when they are stored. A missing or out of range
//! timestamp becomes the Unix epoch and an unknown enumerant becomes the default variant.
//! Incoming timestamps are truncated to the millisecond, the precision of stored dates.

use blogs_models::Category;
use blogs_models::Status;
use chrono::DateTime;
use chrono::Utc;
use prost_types::Timestamp;
use tracing::warn;

use crate::blog as wire;

fn timestamp_to_wire(time: DateTime<Utc>) -> Option<Timestamp> {
    Some(Timestamp {
        seconds: time.timestamp(),
        nanos: time.timestamp_subsec_nanos() as i32,
    })
}

fn timestamp_from_wire(timestamp: Option<Timestamp>) -> DateTime<Utc> {
    timestamp
        .and_then(|Timestamp { seconds, nanos }| {
            DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
        })
        .map(blogs_models::stored_precision)
        .unwrap_or_default()
}

fn id_to_wire(id: Option<bson::oid::ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

impl From<Status> for wire::BlogStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Published => Self::Published,
            Status::Closed => Self::Closed,
            Status::Active => Self::Active,
            Status::Famous => Self::Famous,
        }
    }
}

impl From<wire::BlogStatus> for Status {
    fn from(status: wire::BlogStatus) -> Self {
        match status {
            wire::BlogStatus::Draft => Self::Draft,
            wire::BlogStatus::Published => Self::Published,
            wire::BlogStatus::Closed => Self::Closed,
            wire::BlogStatus::Active => Self::Active,
            wire::BlogStatus::Famous => Self::Famous,
        }
    }
}

impl From<Category> for wire::BlogCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Destinations => Self::Destinations,
            Category::Travelogues => Self::Travelogues,
            Category::Activities => Self::Activities,
            Category::Gastronomy => Self::Gastronomy,
            Category::Tips => Self::Tips,
            Category::Culture => Self::Culture,
            Category::Accommodation => Self::Accommodation,
        }
    }
}

impl From<wire::BlogCategory> for Category {
    fn from(category: wire::BlogCategory) -> Self {
        match category {
            wire::BlogCategory::Destinations => Self::Destinations,
            wire::BlogCategory::Travelogues => Self::Travelogues,
            wire::BlogCategory::Activities => Self::Activities,
            wire::BlogCategory::Gastronomy => Self::Gastronomy,
            wire::BlogCategory::Tips => Self::Tips,
            wire::BlogCategory::Culture => Self::Culture,
            wire::BlogCategory::Accommodation => Self::Accommodation,
        }
    }
}

/// Maps a raw wire status, falling back to [Status::Draft] when it is unknown
pub fn status_from_wire(value: i32) -> Status {
    wire::BlogStatus::try_from(value)
        .map(Status::from)
        .unwrap_or_else(|_| {
            warn!(value, "unknown blog status, using the default one");
            Status::default()
        })
}

fn category_from_wire(value: i32) -> Category {
    wire::BlogCategory::try_from(value)
        .map(Category::from)
        .unwrap_or_else(|_| {
            warn!(value, "unknown blog category, using the default one");
            Category::default()
        })
}

impl From<blogs_models::Vote> for wire::Vote {
    fn from(vote: blogs_models::Vote) -> Self {
        Self {
            id: id_to_wire(vote.id),
            is_upvote: vote.is_upvote,
            user_id: vote.user_id,
            creation_time: timestamp_to_wire(vote.creation_time),
        }
    }
}

impl From<wire::Vote> for blogs_models::Vote {
    fn from(vote: wire::Vote) -> Self {
        Self {
            id: None,
            is_upvote: vote.is_upvote,
            user_id: vote.user_id,
            creation_time: timestamp_from_wire(vote.creation_time),
        }
    }
}

impl From<blogs_models::Comment> for wire::Comment {
    fn from(comment: blogs_models::Comment) -> Self {
        Self {
            id: id_to_wire(comment.id),
            user_id: comment.user_id,
            username: comment.username,
            text: comment.text,
            creation_time: timestamp_to_wire(comment.creation_time),
            last_modification: timestamp_to_wire(comment.last_modification),
        }
    }
}

impl From<wire::Comment> for blogs_models::Comment {
    fn from(comment: wire::Comment) -> Self {
        Self {
            id: None,
            user_id: comment.user_id,
            username: comment.username,
            text: comment.text,
            creation_time: timestamp_from_wire(comment.creation_time),
            last_modification: timestamp_from_wire(comment.last_modification),
        }
    }
}

impl From<blogs_models::Blog> for wire::Blog {
    fn from(blog: blogs_models::Blog) -> Self {
        Self {
            id: id_to_wire(blog.id),
            user_id: blog.user_id,
            username: blog.username,
            title: blog.title,
            description: blog.description,
            creation_time: timestamp_to_wire(blog.creation_time),
            status: wire::BlogStatus::from(blog.status).into(),
            image: blog.image,
            category: wire::BlogCategory::from(blog.category).into(),
            comments: blog.comments.into_iter().map(Into::into).collect(),
            votes: blog.votes.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<wire::Blog> for blogs_models::Blog {
    fn from(blog: wire::Blog) -> Self {
        Self {
            id: None,
            user_id: blog.user_id,
            username: blog.username,
            title: blog.title,
            description: blog.description,
            creation_time: timestamp_from_wire(blog.creation_time),
            status: status_from_wire(blog.status),
            image: blog.image,
            category: category_from_wire(blog.category),
            comments: blog.comments.into_iter().map(Into::into).collect(),
            votes: blog.votes.into_iter().map(Into::into).collect(),
        }
    }
}

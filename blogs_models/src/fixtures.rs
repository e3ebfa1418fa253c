use chrono::DateTime;
use chrono::TimeZone as _;
use chrono::Utc;

use crate::Blog;
use crate::Category;
use crate::Comment;
use crate::Status;
use crate::Vote;

/// Stored timestamps have a millisecond precision, fixtures stay within it
pub fn timestamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 12, 30, 0)
        .single()
        .expect("fixture timestamp should be valid")
}

pub fn simple_blog() -> Blog {
    Blog {
        id: None,
        user_id: 7,
        username: "mia".into(),
        title: "Three days in Lisbon".into(),
        description: "Trams, tiles and pastries".into(),
        creation_time: timestamp(1),
        status: Status::Published,
        image: "lisbon.png".into(),
        category: Category::Travelogues,
        comments: vec![],
        votes: vec![],
    }
}

pub fn vote(is_upvote: bool, user_id: u32) -> Vote {
    Vote {
        id: None,
        is_upvote,
        user_id,
        creation_time: timestamp(2),
    }
}

pub fn comment(text: &str) -> Comment {
    Comment {
        id: None,
        user_id: 11,
        username: "noah".into(),
        text: text.into(),
        creation_time: timestamp(3),
        last_modification: timestamp(4),
    }
}

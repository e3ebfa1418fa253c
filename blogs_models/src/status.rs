use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;
use strum::IntoStaticStr;

use crate::UnknownCode;

/// Publication state of a blog
///
/// Stored and transmitted as its integer code. The codes are part of the storage and wire
/// contracts: never renumber a variant.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
)]
#[serde(into = "i32", try_from = "i32")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum Status {
    #[default]
    Draft = 0,
    Published = 1,
    Closed = 2,
    Active = 3,
    Famous = 4,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Draft),
            1 => Some(Self::Published),
            2 => Some(Self::Closed),
            3 => Some(Self::Active),
            4 => Some(Self::Famous),
            _ => None,
        }
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for Status {
    type Error = UnknownCode;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or(UnknownCode {
            kind: "status",
            value,
        })
    }
}

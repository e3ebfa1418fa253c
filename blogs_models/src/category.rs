use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;
use strum::IntoStaticStr;

use crate::UnknownCode;

/// Topic of a blog, stored and transmitted as its integer code
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
pub enum Category {
    #[default]
    Destinations = 0,
    Travelogues = 1,
    Activities = 2,
    Gastronomy = 3,
    Tips = 4,
    Culture = 5,
    Accommodation = 6,
}

impl Category {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Destinations),
            1 => Some(Self::Travelogues),
            2 => Some(Self::Activities),
            3 => Some(Self::Gastronomy),
            4 => Some(Self::Tips),
            5 => Some(Self::Culture),
            6 => Some(Self::Accommodation),
            _ => None,
        }
    }
}

impl From<Category> for i32 {
    fn from(category: Category) -> Self {
        category.code()
    }
}

impl TryFrom<i32> for Category {
    type Error = UnknownCode;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or(UnknownCode {
            kind: "category",
            value,
        })
    }
}

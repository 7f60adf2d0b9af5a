use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::grid::Rect;

/// One inbound request on a player session.
///
/// `kind` stays a plain string so that an unknown kind (which terminates the
/// session) is distinguishable from a payload that does not decode at all
/// (which is ignored). Absent fields decode to their zero values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClientRequest {
    pub kind: String,
    pub x: i64,
    pub y: i64,
    pub name: String,
}

/// A symbolic cell as shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCell {
    /// Uncovered, with the number of neighboring mines.
    Count(u8),
    Blank,
    Flag,
    Question,
    /// A triggered mine. Never shown for covered cells.
    Mine,
}

impl ViewCell {
    pub fn as_char(self) -> char {
        match self {
            ViewCell::Count(n) => (b'0' + n.min(8)) as char,
            ViewCell::Blank => ' ',
            ViewCell::Flag => 'P',
            ViewCell::Question => '?',
            ViewCell::Mine => 'X',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '0'..='8' => Some(ViewCell::Count(ch as u8 - b'0')),
            ' ' => Some(ViewCell::Blank),
            'P' => Some(ViewCell::Flag),
            '?' => Some(ViewCell::Question),
            'X' => Some(ViewCell::Mine),
            _ => None,
        }
    }
}

impl Serialize for ViewCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for ViewCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ch = char::deserialize(deserializer)?;
        ViewCell::from_char(ch)
            .ok_or_else(|| de::Error::custom(format!("invalid cell symbol {ch:?}")))
    }
}

/// A player's window into the field: the rectangle it covers and its
/// row-major rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewPort {
    pub position: Rect,
    pub data: Vec<Vec<ViewCell>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HighscoreEntry {
    pub name: String,
    pub score: u64,
}

/// One outbound state update on a player session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateUpdate {
    pub score: u64,
    pub name: String,
    pub view_port: ViewPort,
    pub highscores: Vec<HighscoreEntry>,
}

/// One inbound request on an admin session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AdminRequest {
    pub request: String,
}

/// One row of the admin player listing. Ids are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerListEntry {
    pub name: String,
    pub score: u64,
}

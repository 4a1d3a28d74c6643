// Strong Types - Newtypes for page identity and the closed page-type tag set

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Local namespace prefix carried by page ids; never sent to the remote service
pub const PAGE_ID_PREFIX: &str = "page_";

/// Strongly-typed page ID - the opaque, possibly namespaced local identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a local id from a bare remote id
    pub fn from_remote(remote_id: &str) -> Self {
        Self(format!("{}{}", PAGE_ID_PREFIX, strip_prefix(remote_id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as the remote service knows it
    pub fn remote_id(&self) -> &str {
        strip_prefix(&self.0)
    }
}

/// Strip the local namespace prefix from any id
pub fn strip_prefix(id: &str) -> &str {
    id.strip_prefix(PAGE_ID_PREFIX).unwrap_or(id)
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Closed set of page types. Fixed at creation; never re-typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Academy,
    Venue,
    Community,
    Club,
    Pitch,
    Player,
    Coach,
}

impl PageType {
    pub const ALL: [PageType; 7] = [
        PageType::Academy,
        PageType::Venue,
        PageType::Community,
        PageType::Club,
        PageType::Pitch,
        PageType::Player,
        PageType::Coach,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Academy => "academy",
            PageType::Venue => "venue",
            PageType::Community => "community",
            PageType::Club => "club",
            PageType::Pitch => "pitch",
            PageType::Player => "player",
            PageType::Coach => "coach",
        }
    }

    /// Personal profiles carry an achievements/experience collection
    pub fn has_achievements(self) -> bool {
        matches!(self, PageType::Player | PageType::Coach)
    }

    /// View name handed to the navigator when this page becomes active
    pub fn view_name(self) -> String {
        format!("{}_page", self.as_str())
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = AppError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        PageType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| AppError::UnknownType(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_id_strips_only_the_local_prefix() {
        assert_eq!(PageId::new("page_42").remote_id(), "42");
        assert_eq!(PageId::new("42").remote_id(), "42");
        assert_eq!(PageId::new("page_page_7").remote_id(), "page_7");
        assert_eq!(PageId::from_remote("42").as_str(), "page_42");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!("venue".parse::<PageType>().unwrap(), PageType::Venue);
        assert_eq!(
            "stadium".parse::<PageType>(),
            Err(AppError::UnknownType("stadium".to_string()))
        );
        assert!("Venue".parse::<PageType>().is_err());
    }
}

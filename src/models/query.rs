//! Listing query: which endpoint to page through and in which order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Where photos are listed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Photos uploaded by a user
    User(String),
    /// Photos a user has liked
    UserLikes(String),
    /// Photos in a collection
    Collection(String),
}

impl Source {
    /// Pick exactly one source from the optional CLI selections.
    pub fn select(
        user: Option<String>,
        user_likes: Option<String>,
        collection: Option<String>,
    ) -> Result<Self> {
        let mut selected: Vec<Source> = [
            user.map(Source::User),
            user_likes.map(Source::UserLikes),
            collection.map(Source::Collection),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.key().trim().is_empty())
        .collect();

        match selected.len() {
            1 => Ok(selected.remove(0)),
            0 => Err(AppError::config(
                "Either user, userlikes or collection must be specified as a source",
            )),
            _ => Err(AppError::config(
                "Only one of user, userlikes or collection may be specified",
            )),
        }
    }

    /// Username or collection id.
    pub fn key(&self) -> &str {
        match self {
            Source::User(name) | Source::UserLikes(name) => name,
            Source::Collection(id) => id,
        }
    }

    /// API path relative to the base URL.
    pub fn endpoint(&self) -> String {
        match self {
            Source::User(name) => format!("users/{name}/photos"),
            Source::UserLikes(name) => format!("users/{name}/likes"),
            Source::Collection(id) => format!("collections/{id}/photos"),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::User(name) => write!(f, "photos of {name}"),
            Source::UserLikes(name) => write!(f, "likes of {name}"),
            Source::Collection(id) => write!(f, "collection {id}"),
        }
    }
}

/// Ordering key accepted by the listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Latest,
    Oldest,
    Popular,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Latest => "latest",
            Order::Oldest => "oldest",
            Order::Popular => "popular",
        }
    }
}

impl FromStr for Order {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "latest" => Ok(Order::Latest),
            "oldest" => Ok(Order::Oldest),
            "popular" => Ok(Order::Popular),
            other => Err(AppError::config(format!(
                "Unknown order '{other}', expected latest, oldest or popular"
            ))),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub source: Source,
    pub order: Order,
}

impl ListingQuery {
    pub fn new(source: Source, order: Order) -> Self {
        Self { source, order }
    }

    /// Endpoint path for the first page.
    pub fn path(&self) -> String {
        self.source.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(Source::User("jdoe".into()).endpoint(), "users/jdoe/photos");
        assert_eq!(
            Source::UserLikes("jdoe".into()).endpoint(),
            "users/jdoe/likes"
        );
        assert_eq!(
            Source::Collection("42".into()).endpoint(),
            "collections/42/photos"
        );
    }

    #[test]
    fn test_select_requires_exactly_one_source() {
        assert!(Source::select(None, None, None).is_err());
        assert!(Source::select(Some("a".into()), None, Some("1".into())).is_err());
        assert!(Source::select(Some("  ".into()), None, None).is_err());
        assert_eq!(
            Source::select(None, Some("b".into()), None).unwrap(),
            Source::UserLikes("b".into())
        );
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!("Popular".parse::<Order>().unwrap(), Order::Popular);
        assert_eq!(Order::default().as_str(), "latest");
        assert!("random".parse::<Order>().is_err());
    }
}

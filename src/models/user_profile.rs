use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One of the three per-session feedback lists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Wishlist,
    Watched,
    Disliked,
}

/// Feedback a user gives on the item currently shown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Goes to the wishlist
    Like,
    Dislike,
    Watched,
}

impl ActionKind {
    /// The list an action appends to
    pub fn list(self) -> ListKind {
        match self {
            ActionKind::Like => ListKind::Wishlist,
            ActionKind::Dislike => ListKind::Disliked,
            ActionKind::Watched => ListKind::Watched,
        }
    }
}

/// Feedback signals collected during one session
///
/// Every name in any of the three lists belongs to the excluded set and is
/// never recommended again until the profile is cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub wishlist: Vec<String>,
    pub watched: Vec<String>,
    pub disliked: Vec<String>,
}

impl UserProfile {
    /// Creates an empty profile
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Wishlist => &self.wishlist,
            ListKind::Watched => &self.watched,
            ListKind::Disliked => &self.disliked,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
        match kind {
            ListKind::Wishlist => &mut self.wishlist,
            ListKind::Watched => &mut self.watched,
            ListKind::Disliked => &mut self.disliked,
        }
    }

    /// Appends a name to a list, ignoring names the list already holds
    pub fn add(&mut self, kind: ListKind, name: impl Into<String>) {
        let name = name.into();
        let list = self.list_mut(kind);
        if !list.contains(&name) {
            list.push(name);
        }
    }

    /// Removes a name from a list. Returns whether it was present.
    pub fn remove(&mut self, kind: ListKind, name: &str) -> bool {
        let list = self.list_mut(kind);
        match list.iter().position(|n| n == name) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Union of all three lists
    pub fn excluded(&self) -> HashSet<&str> {
        self.wishlist
            .iter()
            .chain(self.watched.iter())
            .chain(self.disliked.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.wishlist.iter().any(|n| n == name)
            || self.watched.iter().any(|n| n == name)
            || self.disliked.iter().any(|n| n == name)
    }

    pub fn clear(&mut self) {
        self.wishlist.clear();
        self.watched.clear();
        self.disliked.clear();
    }
}

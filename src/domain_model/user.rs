use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// An unordered pair of users stored in canonical order (`low < high`).
///
/// `Uuid` ordering is byte order, which matches the lexicographic order of the
/// hyphenated lowercase form, so the canonical order is the same whichever
/// representation a store keys on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn low(&self) -> UserId {
        self.0
    }

    pub fn high(&self) -> UserId {
        self.1
    }

    pub fn is_degenerate(&self) -> bool {
        self.0 == self.1
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.0 == user_id || self.1 == user_id
    }

    pub fn other(&self, user_id: UserId) -> Option<UserId> {
        if self.0 == user_id {
            Some(self.1)
        } else if self.1 == user_id {
            Some(self.0)
        } else {
            None
        }
    }
}

/// Display data owned by the user directory, attached to outgoing events only.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

//! Per-session identity and state.
//!
//! A session is one "pick a genre, rate five, get five" interaction. Its user
//! id is generated fresh, passed explicitly through every stage and never
//! persisted.

use crate::error::PipelineError;
use data_loader::{Genre, ItemId, RatingRecord, UserId};
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Session ids are drawn from here so they stay clear of dataset user ids.
const SESSION_ID_RANGE: std::ops::Range<UserId> = 1_000_000..UserId::MAX;

/// The synthetic user a session's ratings are attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionUser(UserId);

impl SessionUser {
    pub fn new(id: UserId) -> Self {
        Self(id)
    }

    /// Draw a random id for which `is_taken` is false.
    pub fn fresh(is_taken: impl Fn(UserId) -> bool) -> Self {
        let mut rng = rand::rng();
        loop {
            let id = rng.random_range(SESSION_ID_RANGE);
            if !is_taken(id) {
                return Self(id);
            }
        }
    }

    pub fn id(&self) -> UserId {
        self.0
    }
}

impl fmt::Display for SessionUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Raw per-candidate input: a star rating or "not rated".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingInput {
    Skip,
    Stars(u8),
}

impl RatingInput {
    /// Validated constructor for star ratings.
    pub fn stars(value: u8) -> Result<Self, PipelineError> {
        if (1..=5).contains(&value) {
            Ok(RatingInput::Stars(value))
        } else {
            Err(PipelineError::InvalidRating(value.to_string()))
        }
    }
}

impl FromStr for RatingInput {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() || token == "-" || token.eq_ignore_ascii_case("skip") {
            return Ok(RatingInput::Skip);
        }
        let value: u8 = token
            .parse()
            .map_err(|_| PipelineError::InvalidRating(token.to_string()))?;
        RatingInput::stars(value)
    }
}

/// Parse a user-facing genre token, rejecting anything outside the vocabulary.
pub fn parse_genre(token: &str) -> Result<Genre, PipelineError> {
    token
        .parse()
        .map_err(|_| PipelineError::UnknownGenre(token.to_string()))
}

/// What the ranking stage needs to know about the session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user: SessionUser,
    pub genre: Genre,
    /// Items the user rated in this session (skips are not included)
    pub rated_items: HashSet<ItemId>,
}

impl SessionContext {
    pub fn new(user: SessionUser, genre: Genre, records: &[RatingRecord]) -> Self {
        Self {
            user,
            genre,
            rated_items: records.iter().map(|r| r.item_id).collect(),
        }
    }
}

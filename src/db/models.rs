use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

use super::timestamp;

/// A persisted quote. `text` and `comment` are raw (storage-normalized, not display-safe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub source_address: String,
    pub score: i64,
    pub vote_count: i64,
}

/// Submission handed to `QuoteStore::create`; the store assigns the id and zeroed tallies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub text: String,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub source_address: String,
}

/// Row as read from the `quotes` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbQuote {
    pub id: i64,
    pub text: String,
    pub comment: Option<String>,
    pub submitted_at: String,
    pub source_address: String,
    pub score: i64,
    pub vote_count: i64,
}

impl From<DbQuote> for Quote {
    fn from(row: DbQuote) -> Self {
        Self {
            id: row.id,
            text: row.text,
            comment: row.comment,
            submitted_at: timestamp::decode(&row.submitted_at),
            source_address: row.source_address,
            score: row.score,
            vote_count: row.vote_count,
        }
    }
}

/// Ordering for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Most recently submitted first.
    Recency,
    /// Highest score first; equal scores fall back to newest id.
    Score,
}

impl ListOrder {
    pub(crate) fn order_by(self) -> &'static str {
        match self {
            ListOrder::Recency => "submitted_at DESC, id DESC",
            ListOrder::Score => "score DESC, id DESC",
        }
    }
}

/// Direction of a single vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
        }
    }

    /// Change applied to `score`; `vote_count` always grows by one.
    pub fn score_delta(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVote(pub String);

impl fmt::Display for UnknownVote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vote must be up or down, got {:?}", self.0)
    }
}

impl std::error::Error for UnknownVote {}

impl FromStr for Vote {
    type Err = UnknownVote;

    /// Exact, case-sensitive match on `up` / `down`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            other => Err(UnknownVote(other.to_string())),
        }
    }
}

/// Rows to skip for a 1-indexed `page`; anything below 1 counts as page 1.
pub fn page_offset(page: i64, page_size: u32) -> i64 {
    (page.max(1) - 1).saturating_mul(i64::from(page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_tokens_are_exact() {
        assert_eq!("up".parse::<Vote>(), Ok(Vote::Up));
        assert_eq!("down".parse::<Vote>(), Ok(Vote::Down));
        assert!("UP".parse::<Vote>().is_err());
        assert!("sideways".parse::<Vote>().is_err());
        assert!("".parse::<Vote>().is_err());
    }

    #[test]
    fn offsets_clamp_to_first_page() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(-7, 10), 0);
        assert_eq!(page_offset(i64::MAX, 10), i64::MAX);
    }

    #[test]
    fn zero_date_rows_decode() {
        let row = DbQuote {
            id: 1,
            text: "t".into(),
            comment: None,
            submitted_at: "0000-00-00 00:00:00".into(),
            source_address: "127.0.0.1:1".into(),
            score: -2,
            vote_count: 4,
        };
        let quote = Quote::from(row);
        assert!(timestamp::is_zero(&quote.submitted_at));
        assert_eq!(quote.score, -2);
    }
}

use std::fmt;

use super::cards::Card;

// Domain errors raised by the table pieces. Everything is carried inside
// `anyhow::Error`, use `downcast_ref::<ErrorKind>()` to inspect the kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyDeck,
    PoolOverflow,
    PoolUnderflow,
    IllegalPlacement(Card),
    InvalidIndex { index: usize, len: usize },
    // The engine broke one of its own rules, e.g. a strategy picked an action
    // outside the legal set or a gated pool operation failed anyway.
    InvariantViolated(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDeck => write!(f, "cannot draw from an empty deck"),
            Self::PoolOverflow => write!(f, "hint token pool is already full"),
            Self::PoolUnderflow => write!(f, "hint token pool is empty"),
            Self::IllegalPlacement(card) => write!(f, "{} is not the next card of its tower", card),
            Self::InvalidIndex { index, len } => write!(f, "hand index {} out of range for hand of {} cards", index, len),
            Self::InvariantViolated(msg) => write!(f, "engine invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for ErrorKind {}

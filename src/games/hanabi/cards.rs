use std::collections::VecDeque;
use std::fmt;

use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

use super::error::ErrorKind;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub enum Color {
    Red, Yellow, Green, Blue, White,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize)]
pub enum Rank {
    One, Two, Three, Four, Five,
}

pub const COLORS: [Color; 5] = [Color::Red, Color::Yellow, Color::Green, Color::Blue, Color::White];
pub const RANKS: [Rank; 5] = [Rank::One, Rank::Two, Rank::Three, Rank::Four, Rank::Five];

// Physical copies of each rank in one color, indexed like RANKS
pub const RANK_COPIES: [usize; 5] = [3, 2, 2, 2, 1];
pub const DECK_SIZE: usize = 50;

impl Rank {
    pub fn value(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        RANKS.iter().copied().find(|r| r.value() == value)
    }

    // Rank that has to follow this one on a tower, None for the top rank
    pub fn next(self) -> Option<Self> {
        Self::from_value(self.value() + 1)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "Red",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::White => "White",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub struct Card {
    pub color: Color,
    pub rank: Rank,
}

impl Card {
    pub fn new(color: Color, rank: Rank) -> Self {
        Card { color, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.rank)
    }
}

// The standard unshuffled composition, color by color
pub fn standard_cards() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);

    for color in COLORS {
        for (rank, copies) in RANKS.iter().zip(RANK_COPIES) {
            for _ in 0..copies {
                cards.push(Card::new(color, *rank));
            }
        }
    }

    cards
}

// Draw pile. The front of the queue is the top of the pile.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = standard_cards();
        cards.shuffle(rng);
        Self::from_cards(cards)
    }

    // Deck with a fixed order, first card is drawn first
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Deck { cards: cards.into() }
    }

    pub fn draw(&mut self) -> Result<Card> {
        self.cards.pop_front().ok_or_else(|| ErrorKind::EmptyDeck.into())
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }
}

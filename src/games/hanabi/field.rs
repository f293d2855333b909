use std::collections::HashMap;
use std::fmt;

use anyhow::Result;

use super::cards::{Card, Color, Rank, COLORS};
use super::error::ErrorKind;

const TOP_RANK: u8 = 5;

// Fireworks of one color. placed_rank is 0 until the first card lands.
#[derive(Clone, Debug)]
pub struct Tower {
    color: Color,
    placed_rank: u8,
}

impl Tower {
    pub fn new(color: Color) -> Self {
        Tower { color, placed_rank: 0 }
    }

    pub fn placed_rank(&self) -> u8 {
        self.placed_rank
    }

    // Rank this tower is waiting for, None once it is completed
    pub fn next_rank(&self) -> Option<Rank> {
        match Rank::from_value(self.placed_rank) {
            Some(top) => top.next(),
            None => Some(Rank::One),
        }
    }

    pub fn can_add(&self, card: &Card) -> bool {
        card.color == self.color && self.next_rank() == Some(card.rank)
    }

    // Place the card and tell if that completed the tower
    pub fn add(&mut self, card: &Card) -> Result<bool> {
        if !self.can_add(card) {
            return Err(ErrorKind::IllegalPlacement(*card).into());
        }
        self.placed_rank = card.rank.value();
        Ok(self.is_completed())
    }

    pub fn is_completed(&self) -> bool {
        self.placed_rank == TOP_RANK
    }
}

impl fmt::Display for Tower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let placed = "■".repeat(self.placed_rank as usize);
        let missing = "□".repeat((TOP_RANK - self.placed_rank) as usize);
        write!(f, "{:<6} [{}{}] {}", self.color.to_string(), placed, missing, self.placed_rank)
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    towers: HashMap<Color, Tower>,
}

impl Field {
    pub fn new() -> Self {
        Field {
            towers: HashMap::from_iter(COLORS.iter().map(|&c| (c, Tower::new(c)))),
        }
    }

    pub fn tower(&self, color: Color) -> &Tower {
        &self.towers[&color]
    }

    pub fn can_add(&self, card: &Card) -> bool {
        self.towers[&card.color].can_add(card)
    }

    // Returns true when this card just completed its color
    pub fn add(&mut self, card: &Card) -> Result<bool> {
        match self.towers.get_mut(&card.color) {
            Some(tower) => tower.add(card),
            None => Err(ErrorKind::IllegalPlacement(*card).into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.towers.values().all(|t| t.is_completed())
    }

    pub fn score(&self) -> u32 {
        self.towers.values().map(|t| t.placed_rank as u32).sum()
    }

    // Current height per color, in the canonical color order
    pub fn ranks(&self) -> Vec<(Color, u8)> {
        COLORS.iter().map(|&c| (c, self.towers[&c].placed_rank)).collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in COLORS {
            writeln!(f, "{}", self.tower(color))?;
        }
        Ok(())
    }
}

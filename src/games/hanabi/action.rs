use std::fmt;

use super::cards::{Color, Rank};

// Everything a player can do on their turn. Hints name the target seat.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub enum Action {
    PlayCard { card_index: usize },
    GetHintToken { discard_card_index: usize },
    GiveColorHint { target_player: usize, color: Color },
    GiveRankHint { target_player: usize, rank: Rank },
}

impl Action {
    pub fn is_hint(&self) -> bool {
        matches!(self, Self::GiveColorHint { .. } | Self::GiveRankHint { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayCard { card_index } => write!(f, "Play card #{}", card_index),
            Self::GetHintToken { discard_card_index } => write!(f, "Discard card #{} for a hint token", discard_card_index),
            Self::GiveColorHint { target_player, color } => write!(f, "Tell P{} about {} cards", target_player, color),
            Self::GiveRankHint { target_player, rank } => write!(f, "Tell P{} about {}s", target_player, rank),
        }
    }
}

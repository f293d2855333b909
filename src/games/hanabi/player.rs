use anyhow::Result;

use super::action::Action;
use super::cards::{Card, Color, Deck, Rank};
use super::error::ErrorKind;
use super::strategy::Strategy;

// What the owner of a hand slot has been told about it
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct HintState {
    pub color: Option<Color>,
    pub rank: Option<Rank>,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    card: Card,
    hint: HintState,
}

// Partial view of the table handed to a strategy. Built fresh for every
// decision and never holds the identities of the deciding player's cards.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Observation {
    pub current_player: usize,
    pub own_hints: Vec<HintState>,
    // Other seats in turn order, starting right after the current player
    pub other_hands: Vec<(usize, Vec<Card>)>,
    pub tower_ranks: Vec<(Color, u8)>,
    pub hint_tokens: usize,
    pub failure_tokens: usize,
    pub deck_size: usize,
}

pub struct Player {
    pub index: usize,
    hand: Vec<Slot>,
    strategy: Box<dyn Strategy>,
}

impl Player {
    pub fn new(index: usize, strategy: Box<dyn Strategy>) -> Self {
        Player { index, hand: Vec::new(), strategy }
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    pub fn cards(&self) -> Vec<Card> {
        self.hand.iter().map(|s| s.card).collect()
    }

    pub fn hints(&self) -> Vec<HintState> {
        self.hand.iter().map(|s| s.hint).collect()
    }

    // Take the top card of the deck into the hand. Drawing from an empty deck
    // is the normal end-of-game situation and simply does nothing.
    pub fn draw_card(&mut self, deck: &mut Deck) -> Result<()> {
        if deck.is_empty() {
            return Ok(());
        }
        let card = deck.draw()?;
        self.hand.push(Slot { card, hint: HintState::default() });
        Ok(())
    }

    pub fn use_card(&mut self, index: usize) -> Result<Card> {
        if index >= self.hand.len() {
            return Err(ErrorKind::InvalidIndex { index, len: self.hand.len() }.into());
        }
        Ok(self.hand.remove(index).card)
    }

    pub fn has_color(&self, color: Color) -> bool {
        self.hand.iter().any(|s| s.card.color == color)
    }

    pub fn has_rank(&self, rank: Rank) -> bool {
        self.hand.iter().any(|s| s.card.rank == rank)
    }

    pub fn receive_color_hint(&mut self, color: Color) {
        for slot in self.hand.iter_mut().filter(|s| s.card.color == color) {
            slot.hint.color = Some(color);
        }
    }

    pub fn receive_rank_hint(&mut self, rank: Rank) {
        for slot in self.hand.iter_mut().filter(|s| s.card.rank == rank) {
            slot.hint.rank = Some(rank);
        }
    }

    pub fn choose_action(&mut self, valid_actions: &[Action], observation: &Observation) -> Result<Action> {
        self.strategy.choose_action(valid_actions, observation)
    }
}

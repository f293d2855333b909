use std::io::{BufRead, Write};

use anyhow::{anyhow, Result};
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

use super::action::Action;
use super::cards::{Card, Rank};
use super::error::ErrorKind;
use super::player::Observation;

// Decision making of one seat. The engine hands over the legal actions and a
// partial view of the table; the answer must be one of the legal actions.
pub trait Strategy {
    fn name(&self) -> &str;

    fn choose_action(&mut self, valid_actions: &[Action], observation: &Observation) -> Result<Action>;
}

fn pick_random(rng: &mut StdRng, valid_actions: &[Action]) -> Result<Action> {
    valid_actions
        .choose(rng)
        .copied()
        .ok_or_else(|| ErrorKind::InvariantViolated("no legal action to choose from".to_string()).into())
}

pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn from_seed(seed: u64) -> Self {
        RandomStrategy { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&mut self, valid_actions: &[Action], _observation: &Observation) -> Result<Action> {
        pick_random(&mut self.rng, valid_actions)
    }
}

// Cards that would be accepted by the towers right now
fn playable_cards(observation: &Observation) -> Vec<Card> {
    observation.tower_ranks
        .iter()
        .filter_map(|&(color, placed)| Rank::from_value(placed + 1).map(|rank| Card::new(color, rank)))
        .collect()
}

// First seat after the current one holding a playable card, with that card
fn find_playable_card_for_other(observation: &Observation) -> Option<(usize, Card)> {
    let playable = playable_cards(observation);

    for (seat, hand) in &observation.other_hands {
        for card in &playable {
            if hand.contains(card) {
                return Some((*seat, *card));
            }
        }
    }

    None
}

// Plays color hinted cards, points others to playable cards, discards when it
// can and acts randomly otherwise.
pub struct RuleBasedStrategy {
    rng: StdRng,
}

impl RuleBasedStrategy {
    pub fn new() -> Self {
        Self::from_seed(rand::rng().random())
    }

    pub fn from_seed(seed: u64) -> Self {
        RuleBasedStrategy { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Strategy for RuleBasedStrategy {
    fn name(&self) -> &str {
        "rule"
    }

    fn choose_action(&mut self, valid_actions: &[Action], observation: &Observation) -> Result<Action> {
        for (card_index, hint) in observation.own_hints.iter().enumerate() {
            let action = Action::PlayCard { card_index };
            if hint.color.is_some() && valid_actions.contains(&action) {
                return Ok(action);
            }
        }

        if let Some((target_player, card)) = find_playable_card_for_other(observation) {
            let action = Action::GiveColorHint { target_player, color: card.color };
            if valid_actions.contains(&action) {
                return Ok(action);
            }
        }

        if let Some(action) = valid_actions.iter().find(|a| matches!(a, Action::GetHintToken { .. })) {
            return Ok(*action);
        }

        pick_random(&mut self.rng, valid_actions)
    }
}

pub fn describe_observation(observation: &Observation) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Player {} to move. Deck: {}, hint tokens: {}, failure tokens: {}",
        observation.current_player, observation.deck_size, observation.hint_tokens, observation.failure_tokens
    ));

    let towers: Vec<String> = observation.tower_ranks.iter().map(|(c, r)| format!("{} {}", c, r)).collect();
    lines.push(format!("Towers: {}", towers.join(", ")));

    let own: Vec<String> = observation.own_hints
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let color = h.color.map_or("?".to_string(), |c| c.to_string());
            let rank = h.rank.map_or("?".to_string(), |r| r.to_string());
            format!("#{} {} {}", i, color, rank)
        })
        .collect();
    lines.push(format!("Your hand: {}", own.join(", ")));

    for (seat, hand) in &observation.other_hands {
        let cards: Vec<String> = hand.iter().map(|c| c.to_string()).collect();
        lines.push(format!("P{}: {}", seat, cards.join(", ")));
    }

    lines.join("\n")
}

// Asks a person for every decision. Reading is blocking and has no timeout.
pub struct HumanStrategy<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanStrategy<R, W> {
    pub fn new(input: R, output: W) -> Self {
        HumanStrategy { input, output }
    }
}

impl<R: BufRead, W: Write> Strategy for HumanStrategy<R, W> {
    fn name(&self) -> &str {
        "human"
    }

    fn choose_action(&mut self, valid_actions: &[Action], observation: &Observation) -> Result<Action> {
        writeln!(self.output, "{}", describe_observation(observation))?;
        for (idx, action) in valid_actions.iter().enumerate() {
            writeln!(self.output, " {:>3}. {}", idx, action)?;
        }

        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(anyhow!("input closed before an action was chosen"));
            }

            match line.trim().parse::<usize>() {
                Ok(idx) if idx < valid_actions.len() => return Ok(valid_actions[idx]),
                _ => writeln!(self.output, "Pick a number between 0 and {}", valid_actions.len().saturating_sub(1))?,
            }
        }
    }
}

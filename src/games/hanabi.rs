use std::fmt;

use super::{GameState, Validate};
use anyhow::{anyhow, Result};
use rand::Rng;

pub mod action;
pub mod cards;
pub mod error;
pub mod field;
pub mod player;
pub mod strategy;
pub mod tokens;

pub use action::Action;
pub use cards::{Card, Color, Deck, Rank, COLORS, RANKS};
pub use error::ErrorKind;
pub use field::Field;
pub use player::{HintState, Observation, Player};
pub use strategy::{HumanStrategy, RandomStrategy, RuleBasedStrategy, Strategy};
use tokens::{FailureTokens, HintTokens};

pub const MAX_HINT_TOKENS: usize = 8;
pub const INITIAL_HINT_TOKENS: usize = 8;
pub const FAILURE_THRESHOLD: usize = 3;
// Flat for every table size, tables of 4 and 5 also start with 5 cards
pub const INITIAL_HAND_SIZE: usize = 5;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 5;

// Which terminal condition ended the game
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub enum Outcome {
    Failed,
    Completed,
    DeckExhausted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum Status {
    InProgress,
    // The score is the tower total whatever the outcome, a failed game is
    // not zeroed.
    Terminal { score: u32, outcome: Outcome },
}

// Serializable picture of the whole table, for logs and front-ends
#[derive(Clone, Debug, serde::Serialize)]
pub struct Snapshot {
    pub turn: usize,
    pub current_player: usize,
    pub deck_size: usize,
    pub hint_tokens: usize,
    pub max_hint_tokens: usize,
    pub failure_tokens: usize,
    pub failure_threshold: usize,
    pub towers: Vec<(Color, u8)>,
    pub discard_pile: Vec<Card>,
    pub hands: Vec<Vec<Card>>,
    pub hints: Vec<Vec<HintState>>,
    pub score: u32,
    pub status: Status,
}

pub struct Game {
    deck: Deck,
    players: Vec<Player>,
    hint_tokens: HintTokens,
    failure_tokens: FailureTokens,
    field: Field,
    discard_pile: Vec<Card>,
    // Cards in play over the whole game, fixed at construction
    total_cards: usize,
    dealt: bool,
    current_player: usize,
    turn: usize,
    turns_since_deck_empty: usize,
    status: Status,
}

impl GameState for Game {
    // Table of rule based players on a freshly shuffled deck
    fn new(n_players: usize) -> Self {
        let strategies = (0..n_players)
            .map(|_| Box::new(RuleBasedStrategy::new()) as Box<dyn Strategy>)
            .collect();
        Game::with_strategies(strategies, &mut rand::rng())
    }

    fn n_players(&self) -> usize {
        self.players.len()
    }

    fn current_player(&self) -> usize {
        self.current_player
    }

    fn is_game_over(&self) -> bool {
        matches!(self.status, Status::Terminal { .. })
    }
}

impl Validate for Game {
    fn validate(&self) -> Result<()> {
        let n_players = self.players.len();
        if n_players < MIN_PLAYERS || n_players > MAX_PLAYERS {
            return Err(anyhow!("Number of players ({}) outside the bound [{}, {}]", n_players, MIN_PLAYERS, MAX_PLAYERS));
        }

        let in_hands: usize = self.players.iter().map(|p| p.hand_size()).sum();
        let accounted = self.deck.size() + in_hands + self.discard_pile.len() + self.field.score() as usize;
        if accounted != self.total_cards {
            return Err(anyhow!("Card count drifted: {} accounted for, {} expected", accounted, self.total_cards));
        }

        Ok(())
    }
}

impl Game {
    // One seat per strategy, seat order follows the vector
    pub fn with_strategies<R: Rng + ?Sized>(strategies: Vec<Box<dyn Strategy>>, rng: &mut R) -> Self {
        Game::with_deck(Deck::new(rng), strategies)
    }

    pub fn with_deck(deck: Deck, strategies: Vec<Box<dyn Strategy>>) -> Self {
        let players = strategies
            .into_iter()
            .enumerate()
            .map(|(index, strategy)| Player::new(index, strategy))
            .collect();

        Game {
            total_cards: deck.size(),
            deck,
            players,
            hint_tokens: HintTokens::new(INITIAL_HINT_TOKENS, MAX_HINT_TOKENS),
            failure_tokens: FailureTokens::new(FAILURE_THRESHOLD),
            field: Field::new(),
            discard_pile: Vec::new(),
            dealt: false,
            current_player: 0,
            turn: 0,
            turns_since_deck_empty: 0,
            status: Status::InProgress,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn deck_size(&self) -> usize {
        self.deck.size()
    }

    pub fn hint_tokens(&self) -> usize {
        self.hint_tokens.count()
    }

    pub fn failure_tokens(&self) -> usize {
        self.failure_tokens.count()
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.field.score()
    }

    // Deal the starting hands round-robin, one card at a time
    pub fn distribute_cards(&mut self) -> Result<()> {
        if self.dealt {
            return Err(ErrorKind::InvariantViolated("cards were already dealt".to_string()).into());
        }

        for _ in 0..INITIAL_HAND_SIZE {
            for player in &mut self.players {
                player.draw_card(&mut self.deck)?;
            }
        }
        self.dealt = true;

        log::debug!("Dealt {} cards to {} players, {} left in deck", INITIAL_HAND_SIZE, self.players.len(), self.deck.size());
        Ok(())
    }

    // Upper bound on rounds for any strategy. Before the deck runs out every
    // non-hint turn draws a card and every hint spends a token that was either
    // there from the start or earned by a discard or a completed tower. After
    // that each player gets exactly one more turn.
    pub fn round_cap(&self) -> usize {
        let n_players = self.players.len().max(1);
        let draw_pile = self.total_cards.saturating_sub(n_players * INITIAL_HAND_SIZE);
        let max_turns = 2 * draw_pile + INITIAL_HINT_TOKENS + COLORS.len();

        max_turns.div_ceil(n_players) + 2
    }

    // All actions the current player may take this turn
    pub fn legal_actions(&self) -> Vec<Action> {
        let player = &self.players[self.current_player];
        let hand_size = player.hand_size();

        let mut actions: Vec<Action> = (0..hand_size).map(|card_index| Action::PlayCard { card_index }).collect();

        if self.hint_tokens.can_add() && hand_size > 0 {
            actions.extend((0..hand_size).map(|discard_card_index| Action::GetHintToken { discard_card_index }));
        }

        // Hints must reveal something, so only attributes the target holds
        if self.hint_tokens.can_use() {
            for other in self.players.iter().filter(|p| p.index != player.index) {
                for color in COLORS {
                    if other.has_color(color) {
                        actions.push(Action::GiveColorHint { target_player: other.index, color });
                    }
                }
                for rank in RANKS {
                    if other.has_rank(rank) {
                        actions.push(Action::GiveRankHint { target_player: other.index, rank });
                    }
                }
            }
        }

        actions
    }

    // What `seat` is allowed to know: hints on its own cards, everybody
    // else's cards, the towers and the public counters.
    pub fn observation(&self, seat: usize) -> Observation {
        let n_players = self.players.len();
        let other_hands = (1..n_players)
            .map(|offset| (seat + offset) % n_players)
            .map(|other| (other, self.players[other].cards()))
            .collect();

        Observation {
            current_player: seat,
            own_hints: self.players[seat].hints(),
            other_hands,
            tower_ranks: self.field.ranks(),
            hint_tokens: self.hint_tokens.count(),
            failure_tokens: self.failure_tokens.count(),
            deck_size: self.deck.size(),
        }
    }

    fn terminal_outcome(&self) -> Option<Outcome> {
        if self.failure_tokens.is_failed() {
            Some(Outcome::Failed)
        } else if self.field.is_completed() {
            Some(Outcome::Completed)
        } else if self.turns_since_deck_empty >= self.players.len() {
            Some(Outcome::DeckExhausted)
        } else {
            None
        }
    }

    fn play_card(&mut self, seat: usize, card_index: usize) -> Result<()> {
        let card = self.players[seat].use_card(card_index)?;

        if self.field.can_add(&card) {
            let completed = self.field.add(&card)?;
            log::debug!("P{} placed {}", seat, card);
            // Completing a color gives a token back, unless the pool is full
            if completed && self.hint_tokens.can_add() {
                self.hint_tokens.add()?;
            }
        } else {
            log::debug!("P{} misplayed {}", seat, card);
            self.failure_tokens.add();
            self.discard_pile.push(card);
        }

        self.players[seat].draw_card(&mut self.deck)
    }

    fn discard_for_hint(&mut self, seat: usize, card_index: usize) -> Result<()> {
        if !self.hint_tokens.can_add() {
            return Err(ErrorKind::InvariantViolated("discard offered with a full hint pool".to_string()).into());
        }

        let card = self.players[seat].use_card(card_index)?;
        self.discard_pile.push(card);
        self.hint_tokens.add()?;
        self.players[seat].draw_card(&mut self.deck)
    }

    fn spend_hint_token(&mut self, seat: usize, target_player: usize) -> Result<()> {
        if target_player == seat || target_player >= self.players.len() {
            return Err(ErrorKind::InvariantViolated(format!("P{} cannot hint P{}", seat, target_player)).into());
        }
        if !self.hint_tokens.can_use() {
            return Err(ErrorKind::InvariantViolated("hint offered with an empty hint pool".to_string()).into());
        }
        self.hint_tokens.use_token()
    }

    // Apply one action for the current player and advance the turn. The action
    // has to come from `legal_actions`, anything else is an engine bug.
    pub fn take_action(&mut self, action: Action) -> Result<Status> {
        if let Status::Terminal { .. } = self.status {
            return Err(ErrorKind::InvariantViolated("the game is already over".to_string()).into());
        }

        let seat = self.current_player;
        if !self.legal_actions().contains(&action) {
            return Err(ErrorKind::InvariantViolated(format!("'{}' is not a legal action for P{}", action, seat)).into());
        }

        log::debug!("Turn {}: P{} ({}) chose: {}", self.turn, seat, self.players[seat].strategy_name(), action);

        let deck_was_empty = self.deck.is_empty();

        match action {
            Action::PlayCard { card_index } => self.play_card(seat, card_index)?,
            Action::GetHintToken { discard_card_index } => self.discard_for_hint(seat, discard_card_index)?,
            Action::GiveColorHint { target_player, color } => {
                self.spend_hint_token(seat, target_player)?;
                self.players[target_player].receive_color_hint(color);
            },
            Action::GiveRankHint { target_player, rank } => {
                self.spend_hint_token(seat, target_player)?;
                self.players[target_player].receive_rank_hint(rank);
            },
        }

        self.turn += 1;
        // The turn that draws the last card does not count, everybody gets one
        // full turn with the deck gone.
        if deck_was_empty {
            self.turns_since_deck_empty += 1;
        }
        self.current_player = (seat + 1) % self.players.len();

        if let Some(outcome) = self.terminal_outcome() {
            self.status = Status::Terminal { score: self.field.score(), outcome };
        }

        Ok(self.status)
    }

    // Let the current player's strategy pick from the legal actions
    pub fn step(&mut self) -> Result<(Action, Status)> {
        let seat = self.current_player;
        let valid_actions = self.legal_actions();
        let observation = self.observation(seat);

        let action = self.players[seat].choose_action(&valid_actions, &observation)?;
        let status = self.take_action(action)?;

        Ok((action, status))
    }

    pub fn run(&mut self) -> Result<u32> {
        self.run_with(|_, _, _| {})
    }

    // Play the game to the end. The observer sees the table after each turn
    // together with who moved and what they did.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<u32>
    where
        F: FnMut(&Game, usize, Action),
    {
        self.validate()?;
        if !self.dealt {
            self.distribute_cards()?;
        }

        let max_turns = self.round_cap() * self.players.len();

        loop {
            if let Status::Terminal { score, outcome } = self.status {
                log::info!("Game over after {} turns: {:?}, score {}", self.turn, outcome, score);
                return Ok(score);
            }

            if self.turn >= max_turns {
                return Err(ErrorKind::InvariantViolated(format!("no terminal state after {} turns", self.turn)).into());
            }

            let seat = self.current_player;
            let (action, _) = self.step()?;
            observer(self, seat, action);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            turn: self.turn,
            current_player: self.current_player,
            deck_size: self.deck.size(),
            hint_tokens: self.hint_tokens.count(),
            max_hint_tokens: self.hint_tokens.max(),
            failure_tokens: self.failure_tokens.count(),
            failure_threshold: self.failure_tokens.threshold(),
            towers: self.field.ranks(),
            discard_pile: self.discard_pile.clone(),
            hands: self.players.iter().map(|p| p.cards()).collect(),
            hints: self.players.iter().map(|p| p.hints()).collect(),
            score: self.field.score(),
            status: self.status,
        }
    }
}

fn glyphs(filled: usize, total: usize, on: &str, off: &str) -> String {
    format!("{}{}", on.repeat(filled), off.repeat(total.saturating_sub(filled)))
}

// Full table as text. Shows every hand, so only for observers.
impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==============================")?;
        writeln!(f, "Turn: {}, next: P{}", self.turn, self.current_player)?;
        writeln!(f, "Deck: {}", self.deck.size())?;
        writeln!(f, "Hint Tokens: [{}]", glyphs(self.hint_tokens.count(), self.hint_tokens.max(), "○", " "))?;
        writeln!(f, "Failure Tokens: [{}]", glyphs(self.failure_tokens.count(), self.failure_tokens.threshold(), "●", " "))?;
        writeln!(f)?;

        writeln!(f, "Hanabi Field:")?;
        write!(f, "{}", self.field)?;
        writeln!(f)?;

        let discarded: Vec<String> = self.discard_pile.iter().map(|c| c.to_string()).collect();
        writeln!(f, "Discard: [{}]", discarded.join(", "))?;

        writeln!(f, "Hands:")?;
        for player in &self.players {
            let cards: Vec<String> = player.cards().iter().map(|c| c.to_string()).collect();
            writeln!(f, "P{} ({}): [{}]", player.index, player.strategy_name(), cards.join(", "))?;
        }
        writeln!(f, "==============================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::hanabi::cards::standard_cards;
    use rand::{rngs::StdRng, SeedableRng};

    fn rule_players(n: usize, seed: u64) -> Vec<Box<dyn Strategy>> {
        (0..n).map(|i| Box::new(RuleBasedStrategy::from_seed(seed + i as u64)) as Box<dyn Strategy>).collect()
    }

    fn random_players(n: usize, seed: u64) -> Vec<Box<dyn Strategy>> {
        (0..n).map(|i| Box::new(RandomStrategy::from_seed(seed + i as u64)) as Box<dyn Strategy>).collect()
    }

    // Standard deck with the given cards on top, in that order
    fn stacked_deck(front: &[Card]) -> Deck {
        let mut rest = standard_cards();
        for card in front {
            let pos = rest.iter().position(|c| c == card).unwrap();
            rest.remove(pos);
        }
        let mut cards = front.to_vec();
        cards.extend(rest);
        Deck::from_cards(cards)
    }

    // Top of the deck that deals `p0` and `p1` as the two starting hands
    fn two_hands(p0: [Card; 5], p1: [Card; 5]) -> Vec<Card> {
        p0.iter().zip(p1.iter()).flat_map(|(&a, &b)| [a, b]).collect()
    }

    fn card(color: Color, value: u8) -> Card {
        Card::new(color, Rank::from_value(value).unwrap())
    }

    fn run_of(color: Color) -> [Card; 5] {
        [card(color, 1), card(color, 2), card(color, 3), card(color, 4), card(color, 5)]
    }

    fn dealt_game(front: Vec<Card>, n: usize) -> Game {
        let mut game = Game::with_deck(stacked_deck(&front), rule_players(n, 0));
        game.distribute_cards().unwrap();
        game
    }

    fn invariant_violated(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ErrorKind>(), Some(ErrorKind::InvariantViolated(_)))
    }

    #[test]
    fn test_distribute_cards_two_players() {
        let mut game = Game::with_strategies(rule_players(2, 0), &mut StdRng::seed_from_u64(1));
        game.distribute_cards().unwrap();

        assert_eq!(game.deck_size(), cards::DECK_SIZE - 10);
        assert!(game.players().iter().all(|p| p.hand_size() == INITIAL_HAND_SIZE));
        game.validate().unwrap();

        let err = game.distribute_cards().unwrap_err();
        assert!(invariant_violated(&err));
    }

    #[test]
    fn test_player_count_bounds() {
        for n in [0, 1, 6] {
            let game = Game::with_strategies(rule_players(n, 0), &mut StdRng::seed_from_u64(1));
            assert!(game.validate().is_err());
        }
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            let game = Game::with_strategies(rule_players(n, 0), &mut StdRng::seed_from_u64(1));
            assert!(game.validate().is_ok());
        }
    }

    #[test]
    fn test_play_on_empty_tower() {
        let mut game = dealt_game(two_hands(
            [card(Color::Red, 1), card(Color::Red, 3), card(Color::Red, 4), card(Color::Blue, 2), card(Color::Blue, 3)],
            run_of(Color::Yellow),
        ), 2);

        let status = game.take_action(Action::PlayCard { card_index: 0 }).unwrap();

        assert_eq!(status, Status::InProgress);
        assert_eq!(game.field().tower(Color::Red).placed_rank(), 1);
        assert_eq!(game.failure_tokens(), 0);
        assert!(game.discard_pile().is_empty());
        assert_eq!(game.players()[0].hand_size(), INITIAL_HAND_SIZE);
        assert_eq!(game.turn(), 1);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn test_play_out_of_order_fails() {
        let blue_one = card(Color::Blue, 1);
        let mut game = dealt_game(two_hands(
            [blue_one, blue_one, card(Color::Red, 2), card(Color::Red, 3), card(Color::Red, 4)],
            run_of(Color::Yellow),
        ), 2);

        game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        game.take_action(Action::GiveRankHint { target_player: 0, rank: Rank::One }).unwrap();
        assert_eq!(game.players()[0].hints()[0], HintState { color: None, rank: Some(Rank::One) });

        game.take_action(Action::PlayCard { card_index: 0 }).unwrap();

        assert_eq!(game.field().tower(Color::Blue).placed_rank(), 1);
        assert_eq!(game.failure_tokens(), 1);
        assert_eq!(game.discard_pile(), &[blue_one]);
        game.validate().unwrap();
    }

    #[test]
    fn test_no_discard_with_full_hint_pool() {
        let game = dealt_game(Vec::new(), 3);
        assert_eq!(game.hint_tokens(), MAX_HINT_TOKENS);

        let actions = game.legal_actions();
        assert!(!actions.iter().any(|a| matches!(a, Action::GetHintToken { .. })));

        let mut game = game;
        let err = game.take_action(Action::GetHintToken { discard_card_index: 0 }).unwrap_err();
        assert!(invariant_violated(&err));
        assert_eq!(game.turn(), 0);
    }

    #[test]
    fn test_discard_after_spending_a_hint() {
        let mut game = dealt_game(two_hands(run_of(Color::Red), run_of(Color::Yellow)), 2);
        game.take_action(Action::GiveColorHint { target_player: 1, color: Color::Yellow }).unwrap();

        let actions = game.legal_actions();
        assert_eq!(actions.iter().filter(|a| matches!(a, Action::GetHintToken { .. })).count(), 5);

        game.take_action(Action::GetHintToken { discard_card_index: 4 }).unwrap();
        assert_eq!(game.hint_tokens(), MAX_HINT_TOKENS);
        assert_eq!(game.discard_pile(), &[card(Color::Yellow, 5)]);
        assert_eq!(game.players()[1].hand_size(), INITIAL_HAND_SIZE);
        game.validate().unwrap();
    }

    #[test]
    fn test_completing_tower_returns_a_token() {
        let mut game = dealt_game(two_hands(run_of(Color::Red), run_of(Color::Yellow)), 2);

        for _ in 0..4 {
            game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
            game.take_action(Action::GiveColorHint { target_player: 0, color: Color::Red }).unwrap();
        }
        assert_eq!(game.hint_tokens(), 4);

        game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        assert!(game.field().tower(Color::Red).is_completed());
        assert_eq!(game.hint_tokens(), 5);
    }

    #[test]
    fn test_completing_tower_with_full_pool() {
        let mut p1 = run_of(Color::Yellow);
        p1[4] = card(Color::Green, 1);
        let mut game = dealt_game(two_hands(run_of(Color::Red), p1), 2);

        for _ in 0..4 {
            game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
            game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        }
        assert_eq!(game.hint_tokens(), MAX_HINT_TOKENS);

        let status = game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        assert_eq!(status, Status::InProgress);
        assert!(game.field().tower(Color::Red).is_completed());
        assert_eq!(game.hint_tokens(), MAX_HINT_TOKENS);
        assert_eq!(game.score(), 9);
    }

    #[test]
    fn test_deck_runs_out() {
        let mut game = Game::with_deck(
            Deck::from_cards(vec![
                card(Color::Red, 1), card(Color::Yellow, 1),
                card(Color::Red, 2), card(Color::Yellow, 2),
                card(Color::Red, 3), card(Color::Yellow, 3),
                card(Color::Red, 4), card(Color::Yellow, 4),
                card(Color::Red, 5), card(Color::Yellow, 5),
                card(Color::Green, 1), card(Color::Green, 2), card(Color::Green, 3),
            ]),
            rule_players(2, 0),
        );
        game.distribute_cards().unwrap();
        assert_eq!(game.deck_size(), 3);

        for _ in 0..3 {
            assert_eq!(game.take_action(Action::PlayCard { card_index: 0 }).unwrap(), Status::InProgress);
        }
        assert_eq!(game.deck_size(), 0);

        // One more turn for each player
        assert_eq!(game.take_action(Action::PlayCard { card_index: 0 }).unwrap(), Status::InProgress);
        let status = game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        assert_eq!(status, Status::Terminal { score: 5, outcome: Outcome::DeckExhausted });
        assert_eq!(game.players()[0].hand_size(), 4);
        assert_eq!(game.players()[1].hand_size(), 4);
        game.validate().unwrap();

        let err = game.take_action(Action::PlayCard { card_index: 0 }).unwrap_err();
        assert!(invariant_violated(&err));
    }

    #[test]
    fn test_failed_game_keeps_its_score() {
        let mut game = dealt_game(two_hands(
            [card(Color::Red, 1), card(Color::Red, 3), card(Color::Red, 4), card(Color::Red, 5), card(Color::Blue, 1)],
            [card(Color::Yellow, 2), card(Color::Yellow, 3), card(Color::Yellow, 4), card(Color::Yellow, 5), card(Color::Green, 1)],
        ), 2);

        game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        game.take_action(Action::PlayCard { card_index: 0 }).unwrap();
        let status = game.take_action(Action::PlayCard { card_index: 0 }).unwrap();

        assert_eq!(status, Status::Terminal { score: 1, outcome: Outcome::Failed });
        assert_eq!(game.failure_tokens(), FAILURE_THRESHOLD);
        assert!(game.is_game_over());
    }

    #[test]
    fn test_hints_only_for_held_attributes() {
        let game = dealt_game(two_hands(run_of(Color::Red), run_of(Color::Yellow)), 2);
        let actions = game.legal_actions();

        assert_eq!(actions.len(), 5 + 1 + 5);
        assert!(actions.contains(&Action::GiveColorHint { target_player: 1, color: Color::Yellow }));
        assert!(!actions.contains(&Action::GiveColorHint { target_player: 1, color: Color::Red }));
        assert!(actions.contains(&Action::GiveRankHint { target_player: 1, rank: Rank::Five }));
    }

    #[test]
    fn test_no_hints_with_empty_pool() {
        let mut game = dealt_game(two_hands(run_of(Color::Red), run_of(Color::Yellow)), 2);

        for _ in 0..4 {
            game.take_action(Action::GiveColorHint { target_player: 1, color: Color::Yellow }).unwrap();
            game.take_action(Action::GiveColorHint { target_player: 0, color: Color::Red }).unwrap();
        }
        assert_eq!(game.hint_tokens(), 0);
        assert!(!game.legal_actions().iter().any(|a| a.is_hint()));

        let err = game.take_action(Action::GiveRankHint { target_player: 1, rank: Rank::One }).unwrap_err();
        assert!(invariant_violated(&err));
    }

    #[test]
    fn test_cannot_hint_yourself() {
        let mut game = dealt_game(two_hands(run_of(Color::Red), run_of(Color::Yellow)), 2);
        let err = game.take_action(Action::GiveColorHint { target_player: 0, color: Color::Red }).unwrap_err();
        assert!(invariant_violated(&err));
        assert_eq!(game.hint_tokens(), MAX_HINT_TOKENS);
    }

    #[test]
    fn test_observation_hides_own_cards() {
        let mut game = dealt_game(Vec::new(), 3);
        let color = game.players()[1].cards()[0].color;
        game.take_action(Action::GiveColorHint { target_player: 1, color }).unwrap();

        let obs = game.observation(1);
        assert_eq!(obs.current_player, 1);
        assert_eq!(obs.other_hands.iter().map(|(seat, _)| *seat).collect::<Vec<_>>(), vec![2, 0]);
        assert_eq!(obs.other_hands[0].1, game.players()[2].cards());
        assert_eq!(obs.own_hints, game.players()[1].hints());
        assert!(obs.own_hints[0].color.is_some());
        assert_eq!(obs.hint_tokens, MAX_HINT_TOKENS - 1);
        assert_eq!(obs.tower_ranks.len(), COLORS.len());
    }

    #[test]
    fn test_render_lists_table() {
        let game = dealt_game(two_hands(run_of(Color::Red), run_of(Color::Yellow)), 2);
        let text = game.to_string();

        assert!(text.contains("Deck: 40"));
        assert!(text.contains("Hint Tokens: [○○○○○○○○]"));
        assert!(text.contains("P1 (rule): [Yellow 1, Yellow 2, Yellow 3, Yellow 4, Yellow 5]"));
    }

    // Plays whole games and checks the table after every single turn
    fn check_invariants_over_game(mut game: Game) {
        game.distribute_cards().unwrap();
        let n_players = game.players().len();
        let max_turns = game.round_cap() * n_players;
        let mut failures = 0;
        let mut placed: Vec<(Color, u8)> = game.field().ranks();
        let mut emptied_at: Option<usize> = None;

        while !game.is_game_over() {
            assert!(game.turn() < max_turns, "game ran past the round cap");

            let seat = game.current_player();
            for action in game.legal_actions() {
                match action {
                    Action::GiveColorHint { target_player, .. } | Action::GiveRankHint { target_player, .. } => {
                        assert_ne!(target_player, seat);
                    },
                    _ => {},
                }
            }

            game.step().unwrap();
            game.validate().unwrap();

            assert!(game.hint_tokens() <= MAX_HINT_TOKENS);
            assert!(game.failure_tokens() >= failures);
            failures = game.failure_tokens();

            // Towers only ever grow by one step
            let ranks = game.field().ranks();
            for ((_, before), (_, after)) in placed.iter().zip(ranks.iter()) {
                assert!(after == before || *after == before + 1);
            }
            placed = ranks;

            if emptied_at.is_none() && game.deck_size() == 0 {
                emptied_at = Some(game.turn());
            }
        }

        match game.status() {
            Status::Terminal { score, outcome } => {
                assert!(score <= 25);
                assert_eq!(score, game.score());
                match outcome {
                    Outcome::Failed => assert_eq!(game.failure_tokens(), FAILURE_THRESHOLD),
                    Outcome::Completed => assert_eq!(score, 25),
                    Outcome::DeckExhausted => assert_eq!(game.turn() - emptied_at.unwrap(), n_players),
                }
            },
            Status::InProgress => unreachable!(),
        }
    }

    #[test]
    fn test_random_games_hold_invariants() {
        for seed in 0..40 {
            let n = MIN_PLAYERS + (seed as usize % (MAX_PLAYERS - MIN_PLAYERS + 1));
            let mut rng = StdRng::seed_from_u64(seed);
            check_invariants_over_game(Game::with_strategies(random_players(n, seed * 10), &mut rng));
        }
    }

    #[test]
    fn test_rule_based_games_hold_invariants() {
        for seed in 0..40 {
            let n = MIN_PLAYERS + (seed as usize % (MAX_PLAYERS - MIN_PLAYERS + 1));
            let mut rng = StdRng::seed_from_u64(1000 + seed);
            check_invariants_over_game(Game::with_strategies(rule_players(n, seed * 10), &mut rng));
        }
    }

    #[test]
    fn test_seeded_games_are_reproducible() {
        let play = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut game = Game::with_strategies(rule_players(3, seed), &mut rng);
            let mut actions = Vec::new();
            let score = game.run_with(|_, seat, action| actions.push((seat, action))).unwrap();
            (score, actions)
        };

        assert_eq!(play(5), play(5));
    }

    #[test]
    fn test_run_reports_field_score() {
        let mut game = <Game as GameState>::new(4);
        let mut turns = 0;
        let score = game.run_with(|_, _, _| turns += 1).unwrap();

        assert!(game.is_game_over());
        assert_eq!(score, game.score());
        assert_eq!(turns, game.turn());
        assert!(turns <= game.round_cap() * 4);
    }

    // Keeps hinting and discarding as long as possible, the longest games any
    // strategy can produce
    struct Stalling;

    impl Strategy for Stalling {
        fn name(&self) -> &str {
            "stalling"
        }

        fn choose_action(&mut self, valid_actions: &[Action], _observation: &Observation) -> Result<Action> {
            let pick = valid_actions
                .iter()
                .find(|a| a.is_hint())
                .or_else(|| valid_actions.iter().find(|a| matches!(a, Action::GetHintToken { .. })))
                .unwrap_or(&valid_actions[0]);
            Ok(*pick)
        }
    }

    #[test]
    fn test_stalling_game_stays_within_round_cap() {
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            let strategies = (0..n).map(|_| Box::new(Stalling) as Box<dyn Strategy>).collect();
            let mut game = Game::with_strategies(strategies, &mut StdRng::seed_from_u64(n as u64));
            game.run().unwrap();
            assert!(game.turn() <= game.round_cap() * n);
        }
    }

    struct Cheater;

    impl Strategy for Cheater {
        fn name(&self) -> &str {
            "cheater"
        }

        fn choose_action(&mut self, _valid_actions: &[Action], observation: &Observation) -> Result<Action> {
            Ok(Action::GiveColorHint { target_player: observation.current_player, color: Color::Red })
        }
    }

    #[test]
    fn test_illegal_choice_is_an_invariant_violation() {
        let strategies: Vec<Box<dyn Strategy>> = vec![Box::new(Cheater), Box::new(Cheater)];
        let mut game = Game::with_strategies(strategies, &mut StdRng::seed_from_u64(3));

        let err = game.run().unwrap_err();
        assert!(invariant_violated(&err));
        assert_eq!(game.turn(), 0);
    }
}

use anyhow::Result;

pub mod hanabi;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// A turn based game state for n players, who take turns in seat order until
// the game reaches a terminal state.
pub trait GameState {
    fn new(n_players: usize) -> Self;

    fn n_players(&self) -> usize;

    // Seat whose turn it is
    fn current_player(&self) -> usize;

    fn is_game_over(&self) -> bool;
}

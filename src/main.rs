use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use games::hanabi::{Action, Game, HumanStrategy, Outcome, RandomStrategy, RuleBasedStrategy, Snapshot, Status, Strategy};
use games::{GameState, Validate};
use clap::{Parser, Subcommand, ValueEnum};
use tui::InteractiveApp;

mod games;
mod tui;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyKind {
    Random,
    Rule,
}

#[derive(Subcommand)]
enum Commands {
    // Run many bot-only games in parallel and report the scores
    Simulate {
        #[arg(short)]
        log_file: PathBuf,
        #[arg(short, long, default_value_t = 2)]
        players: usize,
        #[arg(short, long, default_value_t = 100)]
        games: usize,
        #[arg(short, long, value_enum, default_value_t = StrategyKind::Rule)]
        strategy: StrategyKind,
        // Game i is seeded with seed + i
        #[arg(long)]
        seed: Option<u64>,
    },
    // Play one seat over stdin against rule based players
    Play {
        #[arg(short, long, default_value_t = 2)]
        players: usize,
        #[arg(long, default_value_t = 0)]
        seat: usize,
    },
    Interactive {
        #[arg(short, long, default_value_t = 2)]
        players: usize,
    },
}

// One turn in the game log
#[derive(Debug, Clone, serde::Serialize)]
struct PlayLogTurn {
    game_id: usize,
    turn: usize,
    player_id: usize,
    action: Option<Action>,
    score: u32,
    state: Snapshot,
}

type PlayLog = Vec<PlayLogTurn>;

struct GameSummary {
    score: u32,
    outcome: Outcome,
    turns: usize,
    play_log: PlayLog,
}

fn build_strategies(kind: StrategyKind, n_players: usize, rng: &mut StdRng) -> Vec<Box<dyn Strategy>> {
    (0..n_players)
        .map(|_| match kind {
            StrategyKind::Random => Box::new(RandomStrategy::from_seed(rng.random())) as Box<dyn Strategy>,
            StrategyKind::Rule => Box::new(RuleBasedStrategy::from_seed(rng.random())) as Box<dyn Strategy>,
        })
        .collect()
}

fn write_play_log(play_log: &[PlayLogTurn], file: &PathBuf) -> Result<()> {
    let file = File::create(file)?;
    let mut writer = BufWriter::new(file);
    for item in play_log {
        jsonl::write(&mut writer, item)?;
    }
    writer.flush()?;
    Ok(())
}

fn report(summaries: &[GameSummary]) {
    let total_games = summaries.len();
    if total_games == 0 {
        println!("No games played");
        return;
    }

    let scores: Vec<u32> = summaries.iter().map(|s| s.score).collect();
    let mean = scores.iter().sum::<u32>() as f64 / total_games as f64;
    let mean_turns = summaries.iter().map(|s| s.turns).sum::<usize>() as f64 / total_games as f64;

    println!("Games: {}", total_games);
    println!("Score mean: {:.2}, min: {}, max: {}", mean, scores.iter().min().unwrap_or(&0), scores.iter().max().unwrap_or(&0));
    println!("Turns mean: {:.1}", mean_turns);

    let mut outcome_counts: HashMap<Outcome, usize> = HashMap::new();
    for summary in summaries {
        *outcome_counts.entry(summary.outcome).or_insert(0) += 1;
    }

    for outcome in [Outcome::Failed, Outcome::Completed, Outcome::DeckExhausted] {
        let count = outcome_counts.get(&outcome).copied().unwrap_or(0);
        println!("{:?}: {}/{}, ratio: {}", outcome, count, total_games, count as f64 / total_games as f64);
    }
}

fn play_logged_game(game_id: usize, n_players: usize, kind: StrategyKind, seed: Option<u64>) -> Result<GameSummary> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed + game_id as u64),
        None => StdRng::seed_from_u64(rand::rng().random()),
    };

    let strategies = build_strategies(kind, n_players, &mut rng);
    let mut game = Game::with_strategies(strategies, &mut rng);
    game.validate()?;
    game.distribute_cards()?;

    let mut play_log: PlayLog = vec![PlayLogTurn {
        game_id,
        turn: 0,
        player_id: 0,
        action: None,
        score: 0,
        state: game.snapshot(),
    }];

    let score = game.run_with(|g, seat, action| {
        log::debug!("\n{}", g);
        play_log.push(PlayLogTurn {
            game_id,
            turn: g.turn(),
            player_id: seat,
            action: Some(action),
            score: g.score(),
            state: g.snapshot(),
        });
    })?;

    let outcome = match game.status() {
        Status::Terminal { outcome, .. } => outcome,
        Status::InProgress => return Err(anyhow!("game {} stopped before reaching a terminal state", game_id)),
    };

    Ok(GameSummary { score, outcome, turns: game.turn(), play_log })
}

fn simulate(log_file: &PathBuf, n_players: usize, n_games: usize, kind: StrategyKind, seed: Option<u64>) -> Result<()> {
    log::info!("Running {} simulations for {} {:?} players", n_games, n_players, kind);

    let summaries: Vec<GameSummary> = (0..n_games)
        .into_par_iter()
        .map(|game_id| play_logged_game(game_id, n_players, kind, seed))
        .collect::<Result<Vec<_>>>()?;

    report(&summaries);

    let play_log: PlayLog = summaries.into_iter().flat_map(|s| s.play_log).collect();
    write_play_log(&play_log, log_file)
}

// Text mode, one human seat reading from stdin
fn play(n_players: usize, seat: usize) -> Result<()> {
    if seat >= n_players {
        return Err(anyhow!("Seat {} does not exist at a table of {}", seat, n_players));
    }

    let mut rng = StdRng::seed_from_u64(rand::rng().random());
    let strategies: Vec<Box<dyn Strategy>> = (0..n_players)
        .map(|i| {
            if i == seat {
                Box::new(HumanStrategy::new(std::io::stdin().lock(), std::io::stdout())) as Box<dyn Strategy>
            } else {
                Box::new(RuleBasedStrategy::from_seed(rng.random())) as Box<dyn Strategy>
            }
        })
        .collect();

    let mut game = Game::with_strategies(strategies, &mut rng);
    // Only moves are echoed, the full table would show the human their hand
    let score = game.run_with(|_, player, action| println!("P{}: {}", player, action))?;

    println!("{}", game);
    println!("Final score: {}", score);
    Ok(())
}

fn interactive_loop(terminal: &mut ratatui::DefaultTerminal, game: &mut Game, human: usize) -> Result<()> {
    let mut app = InteractiveApp::new(game.snapshot(), human);

    loop {
        app.snapshot = game.snapshot();
        app.actions = if game.current_player() == human && !game.is_game_over() {
            game.legal_actions()
        } else {
            Vec::new()
        };
        if app.actions_state.selected().is_none() && !app.actions.is_empty() {
            app.actions_state.select_first();
        }

        terminal.draw(|frame| {
            frame.render_widget(app.clone(), frame.area());
        })?;

        if game.is_game_over() {
            break;
        }

        if game.current_player() != human {
            let seat = game.current_player();
            let (action, _) = game.step()?;
            app.record_move(seat, action);
            continue;
        }

        if let Event::Key(key_event) = event::read()? {
            if key_event.kind != KeyEventKind::Press {
                continue;
            }

            match key_event.code {
                KeyCode::Char('q') => return Ok(()),
                // The human seat carries a rule based strategy as advisor
                KeyCode::Char(' ') => {
                    let (action, _) = game.step()?;
                    app.record_move(human, action);
                    app.actions_state.select_first();
                },
                KeyCode::Enter => {
                    if let Some(action_idx) = app.actions_state.selected() {
                        let action = app.actions[action_idx];
                        game.take_action(action)?;
                        app.record_move(human, action);
                        app.actions_state.select_first();
                    }
                },
                KeyCode::Down => {
                    if let Some(action_idx) = app.actions_state.selected() {
                        if action_idx + 1 < app.actions.len() {
                            app.actions_state.select_next();
                        }
                    }
                },
                KeyCode::Up => app.actions_state.select_previous(),
                _ => {},
            }
        }
    }

    // Keep the final table up until the user leaves
    loop {
        if let Event::Key(key_event) = event::read()? {
            if key_event.code == KeyCode::Char('q') {
                return Ok(());
            }
        }
    }
}

fn run_interactive(n_players: usize) -> Result<()> {
    color_eyre::install().map_err(|err| anyhow!("{}", err))?;

    let human = 0;
    let mut rng = StdRng::seed_from_u64(rand::rng().random());
    let strategies = build_strategies(StrategyKind::Rule, n_players, &mut rng);
    let mut game = Game::with_strategies(strategies, &mut rng);
    game.validate()?;
    game.distribute_cards()?;

    let mut terminal = ratatui::init();
    let result = interactive_loop(&mut terminal, &mut game, human);
    ratatui::restore();

    if let Status::Terminal { score, outcome } = game.status() {
        println!("{:?} with score {}", outcome, score);
    }
    result
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.commands {
        Commands::Simulate { log_file, players, games, strategy, seed } => simulate(&log_file, players, games, strategy, seed),
        Commands::Play { players, seat } => play(players, seat),
        Commands::Interactive { players } => run_interactive(players),
    }
}

use crate::games::hanabi::{self, Action, Card, HintState, Snapshot, Status};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{self, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{BorderType, Borders, HighlightSpacing, List, ListState, StatefulWidget};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Paragraph, Widget},
};

#[derive(Clone)]
pub struct Move {
    pub player: usize,
    pub action: Action,
}

#[derive(Clone)]
pub struct InteractiveApp {
    pub snapshot: Snapshot,
    // Seat played from the keyboard, its cards are never drawn
    pub human: usize,
    pub recent_moves: Vec<Move>,
    pub actions: Vec<Action>,
    pub actions_state: ListState,
}

impl InteractiveApp {
    pub fn new(snapshot: Snapshot, human: usize) -> Self {
        InteractiveApp {
            snapshot,
            human,
            recent_moves: Vec::new(),
            actions: Vec::new(),
            actions_state: ListState::default(),
        }
    }

    // Keep the moves made since the human last played
    pub fn record_move(&mut self, player: usize, action: Action) {
        let n_players = self.snapshot.hands.len();
        self.recent_moves.push(Move { player, action });
        if self.recent_moves.len() > n_players {
            self.recent_moves.remove(0);
        }
    }
}

fn card_color(color: hanabi::Color) -> style::Color {
    match color {
        hanabi::Color::Red => style::Color::Red,
        hanabi::Color::Yellow => style::Color::Yellow,
        hanabi::Color::Green => style::Color::Green,
        hanabi::Color::Blue => style::Color::Blue,
        hanabi::Color::White => style::Color::White,
    }
}

fn card_span(card: &Card) -> Span<'static> {
    Span::styled(format!(" ■{}", card.rank), Style::default().fg(card_color(card.color)))
}

// A card as its owner knows it, only through the hints received
fn hinted_span(hint: &HintState) -> Span<'static> {
    let rank = hint.rank.map_or("?".to_string(), |r| r.to_string());
    match hint.color {
        Some(color) => Span::styled(format!(" ■{}", rank), Style::default().fg(card_color(color))),
        None => Span::styled(format!(" □{}", rank), Style::default().fg(style::Color::Gray)),
    }
}

fn glyph_row(label: &str, filled: usize, total: usize, glyph: &str, color: style::Color) -> Line<'static> {
    let mut row = vec![Span::raw(format!(" {:<16}", label))];
    for i in 0..total {
        let fg = if i < filled { color } else { style::Color::DarkGray };
        row.push(Span::styled(format!("{} ", glyph), Style::default().fg(fg)));
    }
    Line::from(row)
}

fn hand_lines(snapshot: &Snapshot, seat: usize, hidden: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];

    let cards: Vec<Span> = if hidden {
        snapshot.hints[seat].iter().map(hinted_span).collect()
    } else {
        snapshot.hands[seat].iter().map(card_span).collect()
    };
    lines.push(Line::from(cards));

    // What the owner has been told, one marker per slot
    let told: Vec<Span> = snapshot.hints[seat]
        .iter()
        .map(|h| {
            let marker = match (h.color, h.rank) {
                (Some(_), Some(_)) => " ++",
                (Some(_), None) => " c ",
                (None, Some(_)) => " r ",
                (None, None) => "   ",
            };
            Span::styled(marker, Style::default().fg(style::Color::DarkGray))
        })
        .collect();
    lines.push(Line::from(told));

    lines
}

fn move_line(mov: &Move) -> Line<'static> {
    Line::from(vec![
        format!("  P{}: ", mov.player).italic(),
        Span::raw(mov.action.to_string()),
    ])
}

impl Widget for InteractiveApp {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let n_players = self.snapshot.hands.len();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(10),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(n_players as u16 + 2),
                Constraint::Min(8),
            ])
            .split(area);

        let status = match self.snapshot.status {
            Status::Terminal { outcome, .. } => {
                Span::styled(format!(" GAME OVER ({:?}) ", outcome), Style::default().fg(style::Color::Red)).bold().add_modifier(Modifier::REVERSED)
            },
            Status::InProgress => {
                Span::styled(" GAME RUNNING ", Style::default().fg(style::Color::Blue)).bold().add_modifier(Modifier::REVERSED)
            },
        };

        let header_text = Text::from(vec![Line::from(vec![
            " ".into(),
            status,
            format!(" Players: {}, ", n_players).into(),
            format!("Current Player: {}, ", self.snapshot.current_player).into(),
            format!("Turn: {}, ", self.snapshot.turn).into(),
            format!("Deck: {}, ", self.snapshot.deck_size).into(),
            format!("Score: {}", self.snapshot.score).bold(),
        ])]);

        Paragraph::new(header_text)
            .block(Block::bordered().border_set(border::THICK))
            .render(layout[0], buf);

        let mut table_lines = vec![Line::from("")];
        table_lines.push(glyph_row("Hint tokens", self.snapshot.hint_tokens, self.snapshot.max_hint_tokens, "○", style::Color::Cyan));
        table_lines.push(glyph_row("Failure tokens", self.snapshot.failure_tokens, self.snapshot.failure_threshold, "●", style::Color::Red));
        table_lines.push(Line::from(""));
        for &(color, placed) in &self.snapshot.towers {
            table_lines.push(glyph_row(&color.to_string(), placed as usize, 5, "■", card_color(color)));
        }
        Paragraph::new(table_lines)
            .block(Block::bordered().title(" Field "))
            .render(layout[1], buf);

        let players_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Min(20); n_players])
            .split(layout[2]);

        for seat in 0..n_players {
            let title = if seat == self.human { format!(" Player {} (you) ", seat) } else { format!(" Player {} ", seat) };
            let block = Block::default()
                .title(Line::from(title.bold()))
                .border_type(if self.snapshot.current_player == seat { BorderType::QuadrantOutside } else { BorderType::Plain })
                .border_style(Style::default().fg(style::Color::Blue))
                .borders(Borders::ALL);

            Paragraph::new(hand_lines(&self.snapshot, seat, seat == self.human))
                .block(block)
                .render(players_layout[seat], buf);
        }

        let mut discarded = vec![Span::raw(" ")];
        discarded.extend(self.snapshot.discard_pile.iter().map(card_span));
        Paragraph::new(Line::from(discarded))
            .block(Block::bordered().title(" Discard "))
            .render(layout[3], buf);

        let move_lines: Vec<Line> = if self.recent_moves.is_empty() {
            vec!["  No moves yet".italic().into()]
        } else {
            self.recent_moves.iter().map(move_line).collect()
        };
        Paragraph::new(move_lines)
            .block(Block::bordered().title(" Recent Moves "))
            .render(layout[4], buf);

        let items = List::new(self.actions.iter().enumerate().map(|(idx, action)| {
            let style = if action.is_hint() { Style::default().fg(style::Color::Cyan) } else { Style::default() };
            Line::styled(format!(" {:>3}. {}", idx, action), style)
        }))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol(" →")
            .highlight_spacing(HighlightSpacing::Always)
            .block(Block::bordered()
                .title(Line::from(" Actions ".bold()).centered())
                .title_bottom(Line::from(vec![
                    " Advisor Play ".into(),
                    "<SPC> ".blue().bold(),
                    " Proceed ".into(),
                    "<RET> ".blue().bold(),
                    " Quit ".into(),
                    "<q> ".blue().bold(),
                ]).right_aligned()));

        StatefulWidget::render(items, layout[5], buf, &mut self.actions_state);
    }
}

//! Terminal UI rendering with ratatui

use crate::board::{Board, Cell, ColorId};
use crate::difficulty::Difficulty;
use crate::game::{CascadeStep, Game, GameState};
use crate::menu::{Menu, MenuItem, MenuItemType, MenuScreen};
use crate::piece::{PieceShape, FRAME};
use crate::settings::Settings;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const EMPTY: &str = "  ";
const SIDE_WIDTH: u16 = 18;
const SIDE_HEIGHT: u16 = 20;

/// Terminal color for a palette entry
pub fn color_of(color: ColorId) -> Color {
    match color.get() {
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::White,
    }
}

/// Render the main menu
pub fn render_menu(frame: &mut Frame, menu: &Menu, settings: &Settings) {
    let area = frame.area();
    let height = (menu.items.len() as u16 * 2 + 6).max(14) + 6;
    let menu_area = center_rect(area, 56, height);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(8)])
        .split(menu_area);

    let heading = match menu.screen {
        MenuScreen::Main => "C H A I N F A L L",
        MenuScreen::DifficultySelect => "DIFFICULTY",
        MenuScreen::Settings => "SETTINGS",
        MenuScreen::HighScores(_) => "HIGH SCORES",
    };
    let mut title = vec![
        Line::raw(""),
        Line::styled(heading, Style::default().fg(Color::Cyan).bold()),
    ];
    if menu.screen == MenuScreen::Main {
        let difficulty = settings.gameplay.difficulty;
        if let Some(best) = settings.best_score(difficulty) {
            title.push(Line::raw(""));
            title.push(Line::styled(
                format!("Best ({}): {}", difficulty.name(), best),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), layout[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(layout[1]);
    frame.render_widget(block, layout[1]);

    let mut lines = vec![Line::raw("")];
    for (i, item) in menu.items.iter().enumerate() {
        lines.push(render_menu_item(item, i == menu.selected));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(controls_hint(menu), Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_menu_item(item: &MenuItem, is_selected: bool) -> Line<'static> {
    let prefix = if is_selected { "▶ " } else { "  " };
    let base_style = if is_selected {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    };
    let label = Span::styled(format!("{}{}: ", prefix, item.label), base_style);

    match &item.item_type {
        MenuItemType::Button(_) => Line::styled(format!("{}{}", prefix, item.label), base_style),
        MenuItemType::Toggle { value, .. } => {
            let (text, color) = if *value { ("ON", Color::Green) } else { ("OFF", Color::Red) };
            Line::from(vec![
                label,
                Span::styled(format!("< {} >", text), Style::default().fg(color).bold()),
            ])
        }
        MenuItemType::Cycle { options, current, .. } => {
            let value = options.get(*current).cloned().unwrap_or_default();
            Line::from(vec![label, Span::styled(format!("< {} >", value), Style::default().fg(Color::Cyan))])
        }
        MenuItemType::Number { value, .. } => {
            Line::from(vec![label, Span::styled(format!("< {} >", value), Style::default().fg(Color::Cyan))])
        }
        MenuItemType::Label { text } if text.is_empty() => {
            Line::styled(item.label.clone(), Style::default().fg(Color::Gray).bold())
        }
        MenuItemType::Label { text } => Line::from(vec![
            Span::styled(format!("{}  ", item.label), Style::default().fg(Color::Yellow)),
            Span::styled(text.clone(), Style::default().fg(Color::Gray)),
        ]),
    }
}

fn controls_hint(menu: &Menu) -> &'static str {
    match menu.items.get(menu.selected).map(|item| &item.item_type) {
        Some(MenuItemType::Toggle { .. } | MenuItemType::Cycle { .. } | MenuItemType::Number { .. }) => {
            "↑↓ Select  ←→ Adjust  Esc Back"
        }
        _ => "↑↓ Select  Enter Confirm  Esc Back",
    }
}

/// Render the entire game UI
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings, difficulty: Difficulty) {
    let area = frame.area();
    let (board_area, side_area) = game_layout(area, &game.board);

    let ghost = if settings.visual.show_ghost && game.state == GameState::Playing {
        game.ghost_cells()
    } else {
        Vec::new()
    };
    let current: Vec<_> = game.current.cells().collect();
    render_board(frame, board_area, &game.board, &current, &ghost, settings, difficulty.name());

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(FRAME as u16 + 2), Constraint::Min(6)])
        .split(side_area);
    render_next(frame, side[0], &game.next, settings);
    render_stats(frame, side[1], game, settings.best_score(difficulty));

    if settings.visual.show_chain_banner && game.banner.is_visible() {
        render_banner(frame, board_area, game.banner.chain);
    }

    match game.state {
        GameState::Paused => render_overlay(frame, area, "PAUSED", "Press P to resume"),
        GameState::GameOver => render_overlay(frame, area, "GAME OVER", "Enter: play again  Other keys: menu"),
        GameState::Playing => {}
    }
}

/// Draw one cascade sub-step: just the board, with the wave's chain called out
pub fn render_cascade_frame(frame: &mut Frame, board: &Board, step: &CascadeStep, settings: &Settings) {
    let (board_area, side_area) = game_layout(frame.area(), board);
    render_board(frame, board_area, board, &[], &[], settings, "");

    if let CascadeStep::WaveCleared { chain, cells, points, .. } = step {
        let lines = vec![
            Line::styled(format!("CHAIN {}", chain), Style::default().fg(Color::Magenta).bold()),
            Line::styled(format!("{} cells", cells), Style::default().fg(Color::Gray)),
            Line::styled(format!("+{}", points), Style::default().fg(Color::Yellow)),
        ];
        let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Gray));
        let inner = block.inner(side_area);
        frame.render_widget(block, side_area);
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Board on the left, next piece and stats on the right, centered
fn game_layout(area: Rect, board: &Board) -> (Rect, Rect) {
    let board_width = board.width() as u16 * 2 + 2;
    let board_height = board.height() as u16 + 2;
    let game_area = center_rect(area, board_width + SIDE_WIDTH, board_height.max(SIDE_HEIGHT));

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_width), Constraint::Length(SIDE_WIDTH)])
        .split(game_area);
    let board_area = Rect {
        height: board_height.min(columns[0].height),
        ..columns[0]
    };
    (board_area, columns[1])
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn render_board(
    frame: &mut Frame,
    area: Rect,
    board: &Board,
    piece: &[(i32, i32, ColorId)],
    ghost: &[(i32, i32, ColorId)],
    settings: &Settings,
    title: &str,
) {
    let (block_char, ghost_char) = settings.visual.block_chars();
    let block = Block::default()
        .title(if title.is_empty() { String::new() } else { format!(" {} ", title) })
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let find = |cells: &[(i32, i32, ColorId)], row: i32, col: i32| {
        cells.iter().find(|&&(r, c, _)| r == row && c == col).map(|&(_, _, color)| color)
    };

    let lines: Vec<Line> = board
        .rows()
        .enumerate()
        .map(|(row, cells)| {
            let spans: Vec<Span> = cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let (row, col) = (row as i32, col as i32);
                    if let Some(color) = find(piece, row, col) {
                        Span::styled(block_char, Style::default().fg(color_of(color)))
                    } else if let Cell::Filled(color) = cell {
                        Span::styled(block_char, Style::default().fg(color_of(*color)))
                    } else if let Some(color) = find(ghost, row, col) {
                        Span::styled(ghost_char, Style::default().fg(color_of(color)).dim())
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_next(frame: &mut Frame, area: Rect, next: &PieceShape, settings: &Settings) {
    let (block_char, _) = settings.visual.block_chars();
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = (0..FRAME)
        .map(|row| {
            let spans: Vec<Span> = (0..FRAME)
                .map(|col| match next.get(row, col) {
                    Cell::Filled(color) => Span::styled(block_char, Style::default().fg(color_of(color))),
                    Cell::Empty => Span::raw(EMPTY),
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_stats(frame: &mut Frame, area: Rect, game: &Game, best: Option<u64>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));
    let mut lines = vec![
        heading("SCORE"),
        Line::styled(game.score.points.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        heading("LEVEL"),
        Line::styled(game.score.level.to_string(), Style::default().fg(Color::Cyan)),
        Line::raw(""),
        heading("CLEARS"),
        Line::styled(game.score.clears.to_string(), Style::default().fg(Color::Green)),
        Line::raw(""),
        heading("LAST CHAIN"),
        Line::styled(game.banner.chain.to_string(), Style::default().fg(Color::Magenta)),
    ];
    if let Some(best) = best {
        lines.push(Line::raw(""));
        lines.push(heading("BEST"));
        lines.push(Line::styled(best.to_string(), Style::default().fg(Color::White)));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Chain call-out over the top of the board
fn render_banner(frame: &mut Frame, board_area: Rect, chain: u32) {
    let area = Rect {
        y: board_area.y + board_area.height / 4,
        height: 1,
        ..board_area
    };
    let text = Line::styled(format!("CHAIN x{}!", chain), Style::default().fg(Color::Magenta).bold());
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_area = center_rect(area, 24, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

//! CHAINFALL - falling pairs, color groups and chain reactions in the terminal

mod board;
mod dealer;
mod difficulty;
mod game;
mod groups;
mod input;
mod kicks;
mod menu;
mod piece;
mod score;
mod settings;
mod ui;

use board::Board;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use difficulty::Difficulty;
use game::{CascadeObserver, CascadeStep, Game, GameState};
use input::InputHandler;
use menu::{Menu, MenuAction, MenuScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::Settings;
use std::{
    io::{self, stdout, Stdout},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Input delay after game over to prevent accidental menu return
const GAME_OVER_INPUT_DELAY: Duration = Duration::from_secs(2);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// A game in progress plus the clock and input state that drive it
struct Session {
    game: Game,
    input: InputHandler,
    difficulty: Difficulty,
    last_fall: Instant,
    over_at: Option<Instant>,
}

enum AppState {
    Menu(Menu),
    Playing(Box<Session>),
}

/// Draws every cascade sub-step and holds it on screen for a moment
struct CascadeAnimator<'a> {
    terminal: &'a mut Term,
    settings: &'a Settings,
}

impl CascadeObserver for CascadeAnimator<'_> {
    fn on_step(&mut self, step: &CascadeStep, board: &Board) {
        let settings = self.settings;
        if let Err(err) = self
            .terminal
            .draw(|frame| ui::render_cascade_frame(frame, board, step, settings))
        {
            warn!(%err, "failed to draw cascade frame");
            return;
        }
        let delay = match step {
            CascadeStep::WaveCleared { .. } => settings.gameplay.wave_delay(),
            CascadeStep::Settled => settings.gameplay.settle_delay(),
        };
        thread::sleep(delay);
    }
}

/// Get the chainfall temp directory, creating it if needed
fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("chainfall");
    if let Err(err) = std::fs::create_dir_all(&dir) {
        // No subscriber yet; the log file goes in this directory
        eprintln!("Warning: could not create {}: {}", dir.display(), err);
    }
    dir
}

fn main() -> io::Result<()> {
    let session_id: u32 = rand::random();
    let log_dir = temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // The terminal is in raw mode while playing, so logs go to a file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chainfall=debug")),
        )
        .with_ansi(false)
        .init();

    info!(
        "chainfall starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();
    settings.sanitize();

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut settings);

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Err(err) = settings.save() {
        warn!(%err, "could not save settings on exit");
    }

    if let Ok(last) = &result {
        println!("\nThanks for playing CHAINFALL!");
        if let Some((game, difficulty)) = last {
            println!("Difficulty: {}", difficulty.name());
            println!("Final Score: {}", game.score.points);
            println!("Level: {} | Clears: {}", game.score.level, game.score.clears);
        }
    }

    result.map(|_| ())
}

fn run_app(terminal: &mut Term, settings: &mut Settings) -> io::Result<Option<(Game, Difficulty)>> {
    let mut state = AppState::Menu(Menu::new());
    let mut last_game: Option<(Game, Difficulty)> = None;

    loop {
        terminal.draw(|frame| match &state {
            AppState::Menu(menu) => ui::render_menu(frame, menu, settings),
            AppState::Playing(session) => {
                ui::render_game(frame, &session.game, settings, session.difficulty)
            }
        })?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    if let AppState::Playing(session) = &mut state {
                        session.input.key_up(key);
                    }
                    continue;
                }

                match &mut state {
                    AppState::Menu(menu) => {
                        let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                            && key.code == KeyCode::Char('c');
                        match key.code {
                            _ if ctrl_c => return Ok(last_game),
                            KeyCode::Up => menu.move_up(),
                            KeyCode::Down => menu.move_down(),
                            KeyCode::Left => menu.adjust_left(settings),
                            KeyCode::Right => menu.adjust_right(settings),
                            KeyCode::Enter => match menu.select() {
                                Some(MenuAction::StartGame(difficulty)) => {
                                    settings.gameplay.difficulty = difficulty;
                                    if let Some(session) = start_session(settings, difficulty) {
                                        state = AppState::Playing(Box::new(session));
                                    }
                                }
                                Some(MenuAction::GoToScreen(screen)) => menu.go_to(screen, settings),
                                Some(MenuAction::Back) => menu.go_back(settings),
                                Some(MenuAction::Quit) => return Ok(last_game),
                                Some(MenuAction::SaveSettings) => {
                                    settings.sanitize();
                                    match settings.save() {
                                        Ok(()) => info!("settings saved"),
                                        Err(err) => warn!(%err, "could not save settings"),
                                    }
                                }
                                None => {}
                            },
                            KeyCode::Char('q') | KeyCode::Esc => {
                                if menu.screen == MenuScreen::Main {
                                    return Ok(last_game);
                                }
                                menu.go_back(settings);
                            }
                            _ => {}
                        }
                    }
                    AppState::Playing(session) => {
                        if session.game.is_game_over() {
                            if session
                                .over_at
                                .is_some_and(|t| t.elapsed() >= GAME_OVER_INPUT_DELAY)
                            {
                                if key.code == KeyCode::Enter {
                                    if let Some(finished) = restart_session(session) {
                                        last_game = Some((finished, session.difficulty));
                                        continue;
                                    }
                                }
                                let session = std::mem::replace(&mut state, AppState::Menu(Menu::new()));
                                if let AppState::Playing(session) = session {
                                    let Session { game, difficulty, .. } = *session;
                                    last_game = Some((game, difficulty));
                                }
                            }
                            continue;
                        }

                        let actions = session.input.key_down(key);
                        for action in actions {
                            let was_paused = session.game.state == GameState::Paused;
                            apply_action(session, action, terminal, settings);
                            if was_paused != (session.game.state == GameState::Paused) {
                                session.input.clear();
                                session.last_fall = Instant::now();
                            }
                        }
                    }
                }
            }
        }

        if let AppState::Playing(session) = &mut state {
            tick(session, terminal, settings);
        }
    }
}

fn start_session(settings: &Settings, difficulty: Difficulty) -> Option<Session> {
    let config = settings.gameplay.engine_config();
    match Game::new(config) {
        Ok(game) => {
            info!(difficulty = difficulty.name(), "starting game");
            Some(Session {
                game,
                input: InputHandler::from_settings(settings),
                difficulty,
                last_fall: Instant::now(),
                over_at: None,
            })
        }
        Err(err) => {
            warn!(%err, "refusing to start game");
            None
        }
    }
}

/// Start over on the same difficulty and board settings, returning the
/// finished game
fn restart_session(session: &mut Session) -> Option<Game> {
    let finished = session.game.clone();
    let config = finished.config().clone();
    if let Err(err) = session.game.start_new_game(config) {
        warn!(%err, "could not restart game");
        return None;
    }
    info!(
        difficulty = session.difficulty.name(),
        last_score = finished.score.points,
        "restarting game"
    );
    session.input.clear();
    session.last_fall = Instant::now();
    session.over_at = None;
    Some(finished)
}

/// Run one action, animating any cascade it triggers
fn apply_action(session: &mut Session, action: game::Action, terminal: &mut Term, settings: &Settings) {
    if settings.gameplay.animate_cascade {
        let mut animator = CascadeAnimator { terminal, settings };
        session.game.process_action(action, &mut animator);
    } else {
        session.game.process_action(action, &mut ());
    }
    if action == game::Action::HardDrop {
        after_lock(session);
    }
}

/// Per-frame work: key repeats, gravity, banner fade and game-over bookkeeping
fn tick(session: &mut Session, terminal: &mut Term, settings: &mut Settings) {
    if session.game.state == GameState::Playing {
        for action in session.input.update() {
            apply_action(session, action, terminal, settings);
        }

        let interval = session.game.fall_interval(session.input.soft_drop_held());
        if session.last_fall.elapsed() >= interval {
            session.last_fall = Instant::now();
            let report = if settings.gameplay.animate_cascade {
                let mut animator = CascadeAnimator {
                    terminal: &mut *terminal,
                    settings: &*settings,
                };
                session.game.attempt_advance_or_lock(&mut animator)
            } else {
                session.game.attempt_advance_or_lock(&mut ())
            };
            if report.is_some() {
                after_lock(session);
            }
        }
        session.game.decay_banner();
    }

    if session.game.is_game_over() && session.over_at.is_none() {
        session.over_at = Some(Instant::now());
        record_high_score(session, settings);
    }
}

/// Keys held through an animated cascade should not fire afterwards
fn after_lock(session: &mut Session) {
    session.input.clear();
    session.last_fall = Instant::now();
    if let Some(report) = &session.game.last_lock {
        debug!(
            chain = report.chain,
            cells = report.cells_cleared,
            points = report.points,
            "lock-in finished"
        );
    }
}

fn record_high_score(session: &Session, settings: &mut Settings) {
    let score = &session.game.score;
    if let Some(rank) = settings.add_high_score(session.difficulty, score) {
        info!(rank = rank + 1, points = score.points, "new high score");
        if let Err(err) = settings.save() {
            warn!(%err, "could not save high score");
        }
    }
}

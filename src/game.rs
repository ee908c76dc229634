//! Core game state and the lock-in cascade

use crate::board::{Board, ColorId};
use crate::dealer::Dealer;
use crate::difficulty::{ConfigError, EngineConfig};
use crate::groups::Group;
use crate::piece::{Piece, PieceShape, RotationDirection};
use crate::score::Score;
use std::time::Duration;
use tracing::{debug, info};

/// Banner strength set when a wave fires
pub const BANNER_FADE_START: f64 = 5.0;
/// Banner decay per rendered frame
pub const BANNER_FADE_STEP: f64 = 0.03;

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Paused,
    /// Terminal: only a new game leaves this state
    GameOver,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCW,
    RotateCCW,
    Pause,
    Quit,
}

/// A sub-step of the cascade, reported after it has been applied to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    WaveCleared {
        chain: u32,
        groups: usize,
        cells: usize,
        points: u64,
    },
    /// One gravity pass moved at least one cell
    Settled,
}

/// Hook for watching a cascade as it runs, e.g. to animate it
pub trait CascadeObserver {
    fn on_step(&mut self, step: &CascadeStep, board: &Board);
}

impl CascadeObserver for () {
    fn on_step(&mut self, _step: &CascadeStep, _board: &Board) {}
}

/// What one lock-in did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockReport {
    pub chain: u32,
    pub groups_cleared: usize,
    pub cells_cleared: usize,
    pub points: u64,
    pub game_over: bool,
}

/// Chain banner for the renderer. The engine only arms and resets it;
/// fading is driven by the caller once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainBanner {
    /// Length of the most recent chain
    pub chain: u32,
    pub fade: f64,
}

impl ChainBanner {
    fn arm(&mut self, chain: u32) {
        self.chain = chain;
        self.fade = BANNER_FADE_START;
    }

    fn reset(&mut self) {
        self.chain = 0;
        self.fade = 0.0;
    }

    pub fn decay(&mut self) {
        self.fade = (self.fade - BANNER_FADE_STEP).max(0.0);
    }

    /// Single waves are not announced
    pub fn is_visible(&self) -> bool {
        self.fade > 0.0 && self.chain > 1
    }
}

/// The main game struct
#[derive(Debug, Clone)]
pub struct Game {
    /// The game board
    pub board: Board,
    /// Current falling piece
    pub current: Piece,
    /// Preview of the piece that spawns after the next lock-in
    pub next: PieceShape,
    dealer: Dealer,
    /// Score tracking
    pub score: Score,
    pub banner: ChainBanner,
    /// Current game state
    pub state: GameState,
    config: EngineConfig,
    /// Outcome of the most recent lock-in
    pub last_lock: Option<LockReport>,
}

impl Game {
    /// Create a new game with a random seed
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::random())
    }

    /// Create a new game whose pieces are determined by `seed`
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut dealer = Dealer::with_seed(seed, config.max_colors);
        let current = Piece::spawn(dealer.next_piece(), config.width);
        let next = dealer.next_piece();
        info!(
            width = config.width,
            height = config.height,
            colors = config.max_colors,
            "new game"
        );

        Ok(Self {
            board: Board::new(config.width, config.height),
            current,
            next,
            dealer,
            score: Score::new(),
            banner: ChainBanner::default(),
            state: GameState::Playing,
            config,
            last_lock: None,
        })
    }

    /// Throw the current session away and start over
    pub fn start_new_game(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        *self = Self::new(config)?;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn spawn_anchor(&self) -> (i32, i32) {
        Piece::spawn_anchor(self.config.width)
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    fn accepts_input(&self) -> bool {
        self.state == GameState::Playing
    }

    /// Process an action
    pub fn process_action(&mut self, action: Action, observer: &mut impl CascadeObserver) {
        match self.state {
            GameState::Paused => {
                if action == Action::Pause {
                    self.state = GameState::Playing;
                }
            }
            GameState::Playing => match action {
                Action::MoveLeft => {
                    self.move_left();
                }
                Action::MoveRight => {
                    self.move_right();
                }
                Action::SoftDrop => {
                    self.soft_drop_tick();
                }
                Action::HardDrop => {
                    self.hard_drop();
                    self.lock_in(observer);
                }
                Action::RotateCW => {
                    self.rotate_cw();
                }
                Action::RotateCCW => {
                    self.rotate_ccw();
                }
                Action::Pause => {
                    self.state = GameState::Paused;
                }
                Action::Quit => {
                    self.state = GameState::GameOver;
                }
            },
            GameState::GameOver => {}
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.accepts_input() && self.current.move_left(&self.board)
    }

    pub fn move_right(&mut self) -> bool {
        self.accepts_input() && self.current.move_right(&self.board)
    }

    pub fn rotate_cw(&mut self) -> bool {
        self.accepts_input() && self.current.rotate(RotationDirection::Clockwise, &self.board)
    }

    pub fn rotate_ccw(&mut self) -> bool {
        self.accepts_input()
            && self
                .current
                .rotate(RotationDirection::CounterClockwise, &self.board)
    }

    /// Advance one row if nothing is in the way
    pub fn soft_drop_tick(&mut self) -> bool {
        self.accepts_input() && self.current.move_down(&self.board)
    }

    /// Advance until blocked. Returns rows dropped; does not lock.
    pub fn hard_drop(&mut self) -> u32 {
        if !self.accepts_input() {
            return 0;
        }
        self.current.hard_drop(&self.board)
    }

    /// Per-tick gravity: fall one row, or lock in if the piece is resting.
    /// Returns the lock report when a lock-in happened.
    pub fn attempt_advance_or_lock(
        &mut self,
        observer: &mut impl CascadeObserver,
    ) -> Option<LockReport> {
        if !self.accepts_input() {
            return None;
        }
        if self.current.move_down(&self.board) {
            return None;
        }
        Some(self.lock_in(observer))
    }

    /// Fuse the current piece into the board and run the cascade to completion.
    ///
    /// The piece is placed, the next piece is promoted and a new preview dealt.
    /// Then waves of group removal and settling repeat until no group
    /// qualifies, and one last settle brings the board to rest. Finally the promoted piece is
    /// tested at the spawn anchor; if it does not fit the game is over.
    pub fn lock_in(&mut self, observer: &mut impl CascadeObserver) -> LockReport {
        let placed = self.current.clone();
        self.board.place(&placed.shape, placed.x, placed.y);

        let promoted = std::mem::replace(&mut self.next, self.dealer.next_piece());
        self.current = Piece::spawn(promoted, self.config.width);
        self.score.begin_lock();
        debug!(x = placed.x, y = placed.y, "piece locked");

        let mut report = LockReport::default();
        while self.clear_wave(&mut report, observer) {
            self.board
                .settle_with(|board| observer.on_step(&CascadeStep::Settled, board));
        }
        // Cells left hanging by the placement land here. Groups they form
        // wait for the next lock-in.
        self.board
            .settle_with(|board| observer.on_step(&CascadeStep::Settled, board));

        if self.score.chain == 0 {
            self.banner.reset();
        }

        let (x, y) = self.spawn_anchor();
        if self.board.is_blocked(&self.current.shape, x, y) {
            self.state = GameState::GameOver;
            report.game_over = true;
            info!(
                score = self.score.points,
                level = self.score.level,
                clears = self.score.clears,
                "game over"
            );
        }

        report.chain = self.score.chain;
        self.last_lock = Some(report.clone());
        report
    }

    /// One removal wave. Returns false if no group qualified.
    fn clear_wave(&mut self, report: &mut LockReport, observer: &mut impl CascadeObserver) -> bool {
        let groups = self.board.find_groups(self.config.min_group_size);
        if groups.is_empty() {
            return false;
        }

        let sizes: Vec<usize> = groups.iter().map(Group::len).collect();
        let cells = self.board.remove_groups(&groups);
        let wave = self.score.add_wave(&sizes);
        self.banner.arm(wave.chain);

        report.groups_cleared += groups.len();
        report.cells_cleared += cells;
        report.points += wave.points;

        debug!(
            chain = wave.chain,
            groups = groups.len(),
            cells,
            points = wave.points,
            "wave cleared"
        );
        if wave.leveled_up {
            info!(level = self.score.level, "level up");
        }

        observer.on_step(
            &CascadeStep::WaveCleared {
                chain: wave.chain,
                groups: groups.len(),
                cells,
                points: wave.points,
            },
            &self.board,
        );
        true
    }

    /// Time the caller should wait between automatic falls
    pub fn fall_interval(&self, soft: bool) -> Duration {
        self.score.fall_interval(self.config.base_fall_interval, soft)
    }

    /// Landing spot of each current-piece cell, for drawing a ghost
    pub fn ghost_cells(&self) -> Vec<(i32, i32, ColorId)> {
        self.current.ghost_cells(&self.board)
    }

    /// Fade the chain banner by one frame
    pub fn decay_banner(&mut self) {
        self.banner.decay();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::difficulty::Difficulty;

    fn new_game() -> Game {
        Game::with_seed(EngineConfig::default(), 17).unwrap()
    }

    fn fill(game: &mut Game, cells: &[(i32, i32)], color: ColorId) {
        for &(row, col) in cells {
            game.board.set(row, col, Cell::Filled(color));
        }
    }

    /// Drop the current piece in the far right column, away from test setups
    fn lock_out_of_the_way(game: &mut Game, observer: &mut impl CascadeObserver) -> LockReport {
        game.current.x = game.config().width as i32 - 2;
        game.hard_drop();
        game.lock_in(observer)
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<CascadeStep>,
    }

    impl CascadeObserver for Recorder {
        fn on_step(&mut self, step: &CascadeStep, _board: &Board) {
            self.steps.push(step.clone());
        }
    }

    #[test]
    fn test_initial_state() {
        let game = new_game();
        assert!(game.board.is_empty());
        assert_eq!(game.score, Score::new());
        assert_eq!(game.state, GameState::Playing);
        assert_eq!((game.current.x, game.current.y), (4, 0));
        assert_eq!(game.next.occupied().count(), 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            max_colors: 0,
            ..EngineConfig::default()
        };
        assert!(Game::new(config).is_err());
    }

    #[test]
    fn test_lock_promotes_next_piece() {
        let mut game = new_game();
        let expected_next = game.next;
        let report = lock_out_of_the_way(&mut game, &mut ());
        assert_eq!(game.current.shape, expected_next);
        assert_eq!((game.current.x, game.current.y), game.spawn_anchor());
        assert_eq!(game.board.occupied_count(), 2);
        assert!(!report.game_over);
        assert_eq!(report.chain, 0);
    }

    #[test]
    fn test_advance_or_lock() {
        let mut game = new_game();
        assert!(game.attempt_advance_or_lock(&mut ()).is_none());
        assert_eq!(game.current.y, 1);
        game.hard_drop();
        let report = game.attempt_advance_or_lock(&mut ());
        assert!(report.is_some());
        assert_eq!(game.board.occupied_count(), 2);
        assert_eq!(game.current.y, 0);
    }

    #[test]
    fn test_single_wave_clear() {
        let mut game = new_game();
        fill(&mut game, &[(16, 0), (17, 0), (18, 0), (19, 0)], ColorId::GREEN);
        let report = lock_out_of_the_way(&mut game, &mut ());

        assert_eq!(report.chain, 1);
        assert_eq!(report.cells_cleared, 4);
        assert_eq!(report.points, 400);
        assert_eq!(game.score.points, 400);
        assert_eq!(game.score.clears, 1);
        assert_eq!(game.board.get(19, 0), Some(Cell::Empty));
        // A one-wave chain arms the banner but does not show it
        assert_eq!(game.banner.chain, 1);
        assert!(!game.banner.is_visible());
    }

    #[test]
    fn test_two_wave_chain() {
        let mut game = new_game();
        // Green stack in column 0 with a red pair on top; a red pair waits
        // on the floor of column 1
        fill(&mut game, &[(16, 0), (17, 0), (18, 0), (19, 0)], ColorId::GREEN);
        fill(&mut game, &[(14, 0), (15, 0)], ColorId::RED);
        fill(&mut game, &[(18, 1), (19, 1)], ColorId::RED);

        let mut recorder = Recorder::default();
        let report = lock_out_of_the_way(&mut game, &mut recorder);

        assert_eq!(report.chain, 2);
        assert_eq!(report.groups_cleared, 2);
        assert_eq!(report.cells_cleared, 8);
        // 4 * 100 * 1.0 + 4 * 100 * 1.5
        assert_eq!(report.points, 1000);
        assert_eq!(game.score.points, 1000);
        assert_eq!(game.score.chain, 2);
        assert_eq!(game.score.clears, 2);
        assert!(game.banner.is_visible());
        assert_eq!(game.banner.fade, BANNER_FADE_START);

        let waves: Vec<_> = recorder
            .steps
            .iter()
            .filter_map(|step| match step {
                CascadeStep::WaveCleared { chain, points, .. } => Some((*chain, *points)),
                CascadeStep::Settled => None,
            })
            .collect();
        assert_eq!(waves, vec![(1, 400), (2, 600)]);
        assert!(recorder.steps.contains(&CascadeStep::Settled));

        // Only the locked piece is left
        assert_eq!(game.board.occupied_count(), 2);
    }

    #[test]
    fn test_placement_overhang_settles_without_clearing() {
        let mut game = new_game();
        // Three blue cells on the floor; the horizontal piece lands with one
        // cell over a gap next to them
        fill(&mut game, &[(19, 0), (19, 1), (19, 2)], ColorId::BLUE);
        fill(&mut game, &[(19, 4)], ColorId::YELLOW);
        game.current = Piece {
            shape: PieceShape::pair(ColorId::BLUE, ColorId::RED).rotated_ccw(),
            x: 3,
            y: 17,
        };
        game.banner.arm(2);
        // Blue at (18, 3) hanging over (19, 3), red resting on the yellow cell
        assert!(game.current.is_grounded(&game.board));
        let report = game.lock_in(&mut ());

        assert_eq!(report.chain, 0);
        assert_eq!(report.cells_cleared, 0);
        assert_eq!(game.score.points, 0);
        assert_eq!(game.banner, ChainBanner::default());
        // The settled blue cell completes a group that stays for the next lock-in
        let blue_row = game.board.rows().nth(19).map(|row| {
            row.iter()
                .filter(|cell| **cell == Cell::Filled(ColorId::BLUE))
                .count()
        });
        assert_eq!(blue_row, Some(4));
        assert_eq!(game.board.find_groups(4).len(), 1);
        assert!(!game.board.clone().settle_step());
    }

    #[test]
    fn test_no_clear_resets_banner() {
        let mut game = new_game();
        game.banner.arm(3);
        lock_out_of_the_way(&mut game, &mut ());
        assert_eq!(game.banner, ChainBanner::default());
        assert_eq!(game.score.chain, 0);
    }

    #[test]
    fn test_banner_decay() {
        let mut banner = ChainBanner::default();
        banner.arm(2);
        assert!(banner.is_visible());
        for _ in 0..1000 {
            banner.decay();
        }
        assert_eq!(banner.fade, 0.0);
        assert!(!banner.is_visible());
        assert_eq!(banner.chain, 2);
    }

    #[test]
    fn test_level_from_cumulative_clears() {
        let mut game = new_game();
        // Five separate vertical groups in one wave
        let colors = [
            ColorId::RED,
            ColorId::GREEN,
            ColorId::YELLOW,
            ColorId::BLUE,
            ColorId::RED,
        ];
        for (col, color) in colors.into_iter().enumerate() {
            let col = col as i32;
            fill(&mut game, &[(16, col), (17, col), (18, col), (19, col)], color);
        }
        let report = lock_out_of_the_way(&mut game, &mut ());
        assert_eq!(report.groups_cleared, 5);
        assert_eq!(game.score.clears, 5);
        assert_eq!(game.score.level, 2);
    }

    #[test]
    fn test_game_over_when_spawn_blocked() {
        let mut game = new_game();
        // Column 5 filled from row 2 down with alternating colors, so nothing
        // clears and the spawned pair has nowhere to go
        for row in 2..20 {
            let color = if row % 2 == 0 { ColorId::RED } else { ColorId::GREEN };
            fill(&mut game, &[(row, 5)], color);
        }
        let report = game.lock_in(&mut ());
        assert!(report.game_over);
        assert!(game.is_game_over());

        // Nothing moves after game over
        let before = game.clone();
        assert!(!game.move_left());
        assert!(!game.rotate_cw());
        assert_eq!(game.hard_drop(), 0);
        assert!(game.attempt_advance_or_lock(&mut ()).is_none());
        game.process_action(Action::Pause, &mut ());
        assert_eq!(game.state, GameState::GameOver);
        assert_eq!(game.board, before.board);
        assert_eq!(game.current, before.current);
    }

    #[test]
    fn test_start_new_game_leaves_game_over() {
        let mut game = new_game();
        game.state = GameState::GameOver;
        game.start_new_game(EngineConfig::for_difficulty(Difficulty::Hard))
            .unwrap();
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.config().max_colors, 6);
        assert!(game.board.is_empty());
    }

    #[test]
    fn test_pause_blocks_movement() {
        let mut game = new_game();
        game.process_action(Action::Pause, &mut ());
        assert_eq!(game.state, GameState::Paused);
        game.process_action(Action::MoveLeft, &mut ());
        assert_eq!(game.current.x, 4);
        game.process_action(Action::Pause, &mut ());
        assert_eq!(game.state, GameState::Playing);
        game.process_action(Action::MoveLeft, &mut ());
        assert_eq!(game.current.x, 3);
    }

    #[test]
    fn test_hard_drop_action_locks() {
        let mut game = new_game();
        game.process_action(Action::HardDrop, &mut ());
        assert_eq!(game.board.get(18, 5).map(|c| c.is_filled()), Some(true));
        assert_eq!(game.board.get(19, 5).map(|c| c.is_filled()), Some(true));
        assert!(game.last_lock.is_some());
    }

    #[test]
    fn test_fall_interval_tracks_difficulty() {
        let easy = Game::with_seed(EngineConfig::for_difficulty(Difficulty::Easy), 1).unwrap();
        let hard = Game::with_seed(EngineConfig::for_difficulty(Difficulty::VeryHard), 1).unwrap();
        assert!(hard.fall_interval(false) < easy.fall_interval(false));
        assert!(easy.fall_interval(true) < easy.fall_interval(false));
    }
}

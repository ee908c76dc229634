//! Piece geometry and the active falling piece
//!
//! A piece is a 3x3 frame of cells. The four corners of the frame are never
//! occupied, which keeps every shape a subset of the plus sign around the
//! center and lets rotation be a plain index remap.

use crate::board::{Board, Cell, ColorId};
use crate::kicks::try_rotate;

/// Side length of a piece frame
pub const FRAME: usize = 3;

/// Direction for rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// True for the four corner cells of the frame
pub fn is_corner(row: usize, col: usize) -> bool {
    (row == 0 || row == FRAME - 1) && (col == 0 || col == FRAME - 1)
}

/// Immutable occupancy and color layout of a piece inside its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceShape {
    cells: [[Cell; FRAME]; FRAME],
}

impl PieceShape {
    /// Build a shape from a full frame; anything in the corners is discarded
    #[cfg(test)]
    pub fn from_cells(mut cells: [[Cell; FRAME]; FRAME]) -> Self {
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                if is_corner(row, col) {
                    *cell = Cell::Empty;
                }
            }
        }
        Self { cells }
    }

    /// The spawn shape: a vertical pair in the middle column, `top` above `bottom`
    pub fn pair(top: ColorId, bottom: ColorId) -> Self {
        let mut cells = [[Cell::Empty; FRAME]; FRAME];
        cells[0][1] = Cell::Filled(top);
        cells[1][1] = Cell::Filled(bottom);
        Self { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Occupied cells as (row, col, color) in frame coordinates, row-major
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, ColorId)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.color().map(|color| (row, col, color)))
        })
    }

    fn remap(&self, source: impl Fn(usize, usize) -> (usize, usize)) -> Self {
        let mut cells = [[Cell::Empty; FRAME]; FRAME];
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                if !is_corner(row, col) {
                    let (src_row, src_col) = source(row, col);
                    *cell = self.cells[src_row][src_col];
                }
            }
        }
        Self { cells }
    }

    /// Cell (row, col) takes its content from (2 - col, row)
    pub fn rotated_cw(&self) -> Self {
        self.remap(|row, col| (FRAME - 1 - col, row))
    }

    /// Cell (row, col) takes its content from (col, 2 - row)
    pub fn rotated_ccw(&self) -> Self {
        self.remap(|row, col| (col, FRAME - 1 - row))
    }

    pub fn rotated(&self, direction: RotationDirection) -> Self {
        match direction {
            RotationDirection::Clockwise => self.rotated_cw(),
            RotationDirection::CounterClockwise => self.rotated_ccw(),
        }
    }
}

/// The falling piece: a shape plus the board position of its frame's top-left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub shape: PieceShape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Anchor every new piece starts from on a board of the given width
    pub fn spawn_anchor(board_width: usize) -> (i32, i32) {
        (board_width as i32 / 2 - 1, 0)
    }

    /// Create a new piece at spawn position
    pub fn spawn(shape: PieceShape, board_width: usize) -> Self {
        let (x, y) = Self::spawn_anchor(board_width);
        Self { shape, x, y }
    }

    /// Absolute (row, col, color) of every occupied cell
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, ColorId)> + '_ {
        self.shape
            .occupied()
            .map(|(row, col, color)| (self.y + row as i32, self.x + col as i32, color))
    }

    fn try_shift(&mut self, dx: i32, dy: i32, board: &Board) -> bool {
        if board.is_blocked(&self.shape, self.x + dx, self.y + dy) {
            return false;
        }
        self.x += dx;
        self.y += dy;
        true
    }

    /// Try to move left, returns true if successful
    pub fn move_left(&mut self, board: &Board) -> bool {
        self.try_shift(-1, 0, board)
    }

    /// Try to move right, returns true if successful
    pub fn move_right(&mut self, board: &Board) -> bool {
        self.try_shift(1, 0, board)
    }

    /// Try to move down, returns true if successful
    pub fn move_down(&mut self, board: &Board) -> bool {
        self.try_shift(0, 1, board)
    }

    /// True if the piece cannot move down any further
    #[cfg(test)]
    pub fn is_grounded(&self, board: &Board) -> bool {
        board.is_blocked(&self.shape, self.x, self.y + 1)
    }

    /// Rotate with kicks. On failure the piece is left untouched.
    pub fn rotate(&mut self, direction: RotationDirection, board: &Board) -> bool {
        let rotated = self.shape.rotated(direction);
        match try_rotate(board, &rotated, self.x, self.y) {
            Some((x, y)) => {
                self.shape = rotated;
                self.x = x;
                self.y = y;
                true
            }
            None => false,
        }
    }

    /// Hard drop - move down as far as possible and return distance dropped
    pub fn hard_drop(&mut self, board: &Board) -> u32 {
        let mut distance = 0;
        while self.move_down(board) {
            distance += 1;
        }
        distance
    }

    /// Where each cell would come to rest once locked and settled.
    ///
    /// Cells split apart once locked, so every cell falls down its own column
    /// rather than moving the piece as a whole. Lower cells land first and
    /// the ones above stack on them. Results are in [`Piece::cells`] order.
    pub fn ghost_cells(&self, board: &Board) -> Vec<(i32, i32, ColorId)> {
        let height = board.height() as i32;
        let cells: Vec<_> = self.cells().collect();
        let mut order: Vec<usize> = (0..cells.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(cells[i].0));

        let mut landed: Vec<Option<(i32, i32, ColorId)>> = vec![None; cells.len()];
        for i in order {
            let (mut row, col, color) = cells[i];
            let open = |r: i32, landed: &[Option<(i32, i32, ColorId)>]| {
                board.get(r, col).is_none_or(|cell| cell.is_empty())
                    && !landed.iter().flatten().any(|&(lr, lc, _)| lr == r && lc == col)
            };
            while row + 1 < height && open(row + 1, &landed) {
                row += 1;
            }
            landed[i] = Some((row, col, color));
        }

        landed
            .into_iter()
            .flatten()
            .filter(|&(row, _, _)| row >= 0 && row < height)
            .collect()
    }
}

//! Playfield grid, collision testing and gravity

use crate::piece::PieceShape;

/// Default playfield dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Largest color palette a game may use
pub const MAX_COLORS: u8 = 7;

/// Color of an occupied cell, always in `1..=MAX_COLORS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorId(u8);

impl ColorId {
    pub const RED: ColorId = ColorId(1);
    pub const GREEN: ColorId = ColorId(2);
    pub const YELLOW: ColorId = ColorId(3);
    pub const BLUE: ColorId = ColorId(4);
    pub const MAGENTA: ColorId = ColorId(5);
    pub const CYAN: ColorId = ColorId(6);
    pub const WHITE: ColorId = ColorId(7);

    /// Every color in palette order; a game with `n` colors draws from the first `n`
    pub const ALL: [ColorId; MAX_COLORS as usize] = [
        ColorId::RED,
        ColorId::GREEN,
        ColorId::YELLOW,
        ColorId::BLUE,
        ColorId::MAGENTA,
        ColorId::CYAN,
        ColorId::WHITE,
    ];

    /// Returns None for 0 or anything above `MAX_COLORS`
    #[cfg(test)]
    pub fn new(id: u8) -> Option<ColorId> {
        (1..=MAX_COLORS).contains(&id).then_some(ColorId(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// A cell on the board - either empty or filled with a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorId),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn color(&self) -> Option<ColorId> {
        match self {
            Cell::Filled(color) => Some(*color),
            Cell::Empty => None,
        }
    }
}

/// The game board
///
/// Stored row-major in a flat buffer with `width` stride. Row 0 is the top row
/// and rows grow downward, so "falling" means increasing the row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(row * self.width + col)
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        self.index(row, col).map(|i| self.cells[i])
    }

    /// Set a cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    fn is_filled_at(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.width + col].is_filled()
    }

    /// Rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }

    #[cfg(test)]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_filled()).count()
    }

    /// True if the shape cannot sit with its frame's top-left at (x, y).
    ///
    /// Cells left/right of the walls or at/below the floor block; cells above
    /// the top row never do, so pieces may hang partly off the grid.
    pub fn is_blocked(&self, shape: &PieceShape, x: i32, y: i32) -> bool {
        shape.occupied().any(|(dy, dx, _)| {
            let col = x + dx as i32;
            let row = y + dy as i32;
            if col < 0 || col >= self.width as i32 || row >= self.height as i32 {
                return true;
            }
            row >= 0 && self.is_filled_at(row as usize, col as usize)
        })
    }

    /// Write the shape's cells into the board, dropping any that fall outside.
    /// No collision check is made here.
    pub fn place(&mut self, shape: &PieceShape, x: i32, y: i32) {
        for (dy, dx, color) in shape.occupied() {
            self.set(y + dy as i32, x + dx as i32, Cell::Filled(color));
        }
    }

    /// One gravity pass. Returns true if any cell moved.
    ///
    /// Every filled cell drops to just above the next filled cell beneath it
    /// as the board stood before the pass. The result is built in a scratch
    /// buffer and swapped in whole, so a pass never sees its own moves.
    pub fn settle_step(&mut self) -> bool {
        let mut moved = false;
        let mut next = vec![Cell::Empty; self.cells.len()];

        for col in 0..self.width {
            for row in (0..self.height).rev() {
                let cell = self.cells[row * self.width + col];
                if cell.is_empty() {
                    continue;
                }
                let mut landing = row;
                while landing + 1 < self.height && !self.is_filled_at(landing + 1, col) {
                    landing += 1;
                }
                if landing != row {
                    moved = true;
                }
                next[landing * self.width + col] = cell;
            }
        }

        self.cells = next;
        moved
    }

    /// Run gravity passes until nothing moves. Returns true if anything moved.
    #[cfg(test)]
    pub fn settle_to_fixed_point(&mut self) -> bool {
        self.settle_with(|_| {})
    }

    /// Run gravity passes until nothing moves, calling `on_step` after every
    /// pass that moved something so a caller can redraw between passes.
    /// Returns true if anything moved.
    pub fn settle_with(&mut self, mut on_step: impl FnMut(&Board)) -> bool {
        let mut moved = false;
        while self.settle_step() {
            moved = true;
            on_step(self);
        }
        moved
    }
}

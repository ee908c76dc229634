//! Rotation kicks
//!
//! When a rotated shape does not fit where the piece is, a short list of
//! nearby anchors is tried in a fixed order. Sideways recovery is preferred
//! over lifting the piece, and left is preferred over right.

use crate::board::Board;
use crate::piece::PieceShape;

/// (dx, dy) anchor offsets in the order they are tried. Negative dy is up.
pub const KICKS: [(i32, i32); 6] = [(0, 0), (-1, 0), (1, 0), (0, -1), (-1, -1), (1, -1)];

/// Find the first kicked anchor where `rotated` fits.
/// Returns the new (x, y), or None if every candidate is blocked.
pub fn try_rotate(board: &Board, rotated: &PieceShape, x: i32, y: i32) -> Option<(i32, i32)> {
    KICKS
        .iter()
        .map(|&(dx, dy)| (x + dx, y + dy))
        .find(|&(kx, ky)| !board.is_blocked(rotated, kx, ky))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, ColorId};
    use crate::piece::{Piece, RotationDirection};

    fn pair() -> PieceShape {
        PieceShape::pair(ColorId::RED, ColorId::BLUE)
    }

    #[test]
    fn test_first_kick_is_identity() {
        assert_eq!(KICKS[0], (0, 0));
        let board = Board::default();
        assert_eq!(try_rotate(&board, &pair().rotated_cw(), 4, 5), Some((4, 5)));
    }

    #[test]
    fn test_left_wall_kicks_right() {
        let board = Board::default();
        // Pair pointing down, hugging the left wall in column 0
        let mut piece = Piece {
            shape: pair().rotated_cw().rotated_cw(),
            x: -1,
            y: 5,
        };
        // Clockwise swings the lower cell out to column -1; the left kick is
        // worse, the right kick fits
        assert!(piece.rotate(RotationDirection::Clockwise, &board));
        assert_eq!((piece.x, piece.y), (0, 5));
        let cols: Vec<_> = piece.cells().map(|(_, col, _)| col).collect();
        assert_eq!(cols, vec![0, 1]);
    }

    #[test]
    fn test_right_wall_kicks_left() {
        let board = Board::default();
        let mut piece = Piece {
            shape: pair(),
            x: 8,
            y: 5,
        };
        assert!(piece.rotate(RotationDirection::Clockwise, &board));
        assert_eq!((piece.x, piece.y), (7, 5));
    }

    #[test]
    fn test_left_preferred_over_right() {
        let mut board = Board::default();
        board.set(6, 6, Cell::Filled(ColorId::GREEN));
        // Clockwise would put the top cell at (6, 6); both sideways kicks fit
        let got = try_rotate(&board, &pair().rotated_cw(), 4, 5);
        assert_eq!(got, Some((3, 5)));
    }

    #[test]
    fn test_floor_kicks_up() {
        let mut board = Board::default();
        // Pinned between two short columns on the floor, only lifting helps
        for row in 18..20 {
            board.set(row, 4, Cell::Filled(ColorId::GREEN));
            board.set(row, 6, Cell::Filled(ColorId::YELLOW));
        }
        let mut piece = Piece {
            shape: pair().rotated_cw().rotated_cw(),
            x: 4,
            y: 17,
        };
        assert!(!board.is_blocked(&piece.shape, piece.x, piece.y));
        // Counter-clockwise puts the lower cell beside the center at row 18
        assert!(piece.rotate(RotationDirection::CounterClockwise, &board));
        assert_eq!((piece.x, piece.y), (4, 16));
    }

    #[test]
    fn test_all_blocked_leaves_piece_unchanged() {
        let mut board = Board::default();
        for row in 0..20 {
            board.set(row, 4, Cell::Filled(ColorId::GREEN));
            board.set(row, 6, Cell::Filled(ColorId::YELLOW));
        }
        let original = Piece {
            shape: pair(),
            x: 4,
            y: 10,
        };
        let mut piece = original.clone();
        assert!(!piece.rotate(RotationDirection::Clockwise, &board));
        assert_eq!(piece, original);
    }
}

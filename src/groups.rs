//! Same-color group detection and removal

use crate::board::{Board, Cell, ColorId};

/// Smallest group that is removed unless configured otherwise
pub const DEFAULT_MIN_GROUP: usize = 4;

const NEIGHBOURS_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A maximal 4-connected set of same-colored cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: ColorId,
    /// (row, col) of every member, in discovery order
    pub cells: Vec<(usize, usize)>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl Board {
    /// All groups with at least `min_size` cells, seeded in row-major order.
    ///
    /// Each cell is visited once; the flood uses an explicit stack so depth
    /// does not grow with group size.
    pub fn find_groups(&self, min_size: usize) -> Vec<Group> {
        let (width, height) = (self.width(), self.height());
        let mut visited = vec![false; width * height];
        let mut groups = Vec::new();
        let mut stack = Vec::new();

        for (start_row, line) in self.rows().enumerate() {
            for (start_col, cell) in line.iter().enumerate() {
                let Cell::Filled(color) = *cell else {
                    continue;
                };
                if visited[start_row * width + start_col] {
                    continue;
                }

                visited[start_row * width + start_col] = true;
                stack.push((start_row, start_col));
                let mut cells = Vec::new();

                while let Some((row, col)) = stack.pop() {
                    cells.push((row, col));
                    for (dr, dc) in NEIGHBOURS_4 {
                        let (nr, nc) = (row as i32 + dr, col as i32 + dc);
                        if self.get(nr, nc) != Some(Cell::Filled(color)) {
                            continue;
                        }
                        let (nr, nc) = (nr as usize, nc as usize);
                        if !visited[nr * width + nc] {
                            visited[nr * width + nc] = true;
                            stack.push((nr, nc));
                        }
                    }
                }

                if cells.len() >= min_size {
                    groups.push(Group { color, cells });
                }
            }
        }

        groups
    }

    /// Empty every cell of every group. Returns how many cells were cleared.
    pub fn remove_groups(&mut self, groups: &[Group]) -> usize {
        let mut removed = 0;
        for group in groups {
            for &(row, col) in &group.cells {
                if self.get(row as i32, col as i32).is_some_and(|cell| cell.is_filled()) {
                    self.set(row as i32, col as i32, Cell::Empty);
                    removed += 1;
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fill(board: &mut Board, cells: &[(i32, i32)], color: ColorId) {
        for &(row, col) in cells {
            board.set(row, col, Cell::Filled(color));
        }
    }

    #[test]
    fn test_basic_vertical_clear() {
        let mut board = Board::default();
        fill(&mut board, &[(16, 3), (17, 3), (18, 3), (19, 3)], ColorId::GREEN);

        let groups = board.find_groups(DEFAULT_MIN_GROUP);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 4);
        assert_eq!(groups[0].color, ColorId::GREEN);

        assert_eq!(board.remove_groups(&groups), 4);
        for row in 16..20 {
            assert_eq!(board.get(row, 3), Some(Cell::Empty));
        }
        assert!(board.is_empty());
    }

    #[test]
    fn test_below_threshold_is_not_returned() {
        let mut board = Board::default();
        fill(&mut board, &[(19, 0), (19, 1), (18, 1)], ColorId::RED);
        let before = board.clone();

        let groups = board.find_groups(DEFAULT_MIN_GROUP);
        assert!(groups.is_empty());
        assert_eq!(board.remove_groups(&groups), 0);
        assert_eq!(board, before);
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        let mut board = Board::default();
        fill(&mut board, &[(19, 0), (18, 1), (17, 2), (16, 3)], ColorId::BLUE);
        assert!(board.find_groups(2).is_empty());
    }

    #[test]
    fn test_colors_do_not_mix() {
        let mut board = Board::default();
        fill(&mut board, &[(19, 0), (19, 1)], ColorId::RED);
        fill(&mut board, &[(19, 2), (19, 3)], ColorId::BLUE);
        assert!(board.find_groups(3).is_empty());
        assert_eq!(board.find_groups(2).len(), 2);
    }

    #[test]
    fn test_groups_are_maximal_and_disjoint() {
        let mut board = Board::default();
        // An L of red, a separate red bar, a blue snake touching the red L
        fill(&mut board, &[(19, 0), (18, 0), (17, 0), (19, 1), (19, 2)], ColorId::RED);
        fill(&mut board, &[(15, 5), (15, 6), (15, 7), (15, 8)], ColorId::RED);
        fill(&mut board, &[(18, 1), (17, 1), (16, 1), (16, 2), (16, 3)], ColorId::BLUE);

        let groups = board.find_groups(DEFAULT_MIN_GROUP);
        assert_eq!(groups.len(), 3);

        let mut seen = HashSet::new();
        for group in &groups {
            for &(row, col) in &group.cells {
                assert!(seen.insert((row, col)), "cell in two groups");
                assert_eq!(
                    board.get(row as i32, col as i32),
                    Some(Cell::Filled(group.color))
                );
                // No same-color neighbour is left out
                for (dr, dc) in NEIGHBOURS_4 {
                    let (nr, nc) = (row as i32 + dr, col as i32 + dc);
                    if board.get(nr, nc) == Some(Cell::Filled(group.color)) {
                        assert!(group.cells.contains(&(nr as usize, nc as usize)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_discovery_is_row_major() {
        let mut board = Board::default();
        fill(&mut board, &[(19, 0), (19, 1), (19, 2), (19, 3)], ColorId::RED);
        fill(&mut board, &[(10, 7), (11, 7), (12, 7), (13, 7)], ColorId::CYAN);
        let groups = board.find_groups(DEFAULT_MIN_GROUP);
        assert_eq!(groups[0].color, ColorId::CYAN);
        assert_eq!(groups[1].color, ColorId::RED);
    }

    #[test]
    fn test_removal_conserves_cells() {
        let mut board = Board::default();
        fill(&mut board, &[(19, 0), (19, 1), (19, 2), (19, 3), (19, 4)], ColorId::YELLOW);
        fill(&mut board, &[(18, 0), (18, 1)], ColorId::MAGENTA);
        fill(&mut board, &[(18, 5), (17, 5), (16, 5), (15, 5)], ColorId::WHITE);
        let before = board.occupied_count();

        let groups = board.find_groups(DEFAULT_MIN_GROUP);
        let expected: usize = groups.iter().map(Group::len).sum();
        assert_eq!(expected, 9);

        let removed = board.remove_groups(&groups);
        assert_eq!(removed, expected);
        assert_eq!(board.occupied_count(), before - expected);
        assert_eq!(board.get(18, 0), Some(Cell::Filled(ColorId::MAGENTA)));
    }

    #[test]
    fn test_large_group_does_not_overflow() {
        let mut board = Board::new(64, 64);
        for row in 0..64 {
            for col in 0..64 {
                board.set(row, col, Cell::Filled(ColorId::RED));
            }
        }
        let groups = board.find_groups(DEFAULT_MIN_GROUP);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 64 * 64);
    }
}

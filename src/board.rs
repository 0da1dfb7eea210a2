// Board representation and five-in-a-row detection
//
// The board is a flat row-major grid of cells. `place` only fills empty cells;
// `clear` empties a cell whatever it holds, which is how trial moves are
// undone. The search uses `Trial` to scope that undo.

use serde::Serialize;
use std::ops::{Deref, DerefMut};

use crate::types::{Mark, Position};

/// Number of contiguous marks needed to win
pub const WIN_LENGTH: usize = 5;

/// The four line axes: horizontal, vertical, main diagonal, anti-diagonal
pub const AXES: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A single square. Its position is fixed at construction, only the mark changes.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    position: Position,
    mark: Mark,
}

impl Cell {
    fn new(row: i32, col: i32) -> Self {
        Cell {
            position: Position::new(row, col),
            mark: Mark::Empty,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn is_empty(&self) -> bool {
        self.mark.is_empty()
    }
}

/// Error returned by `Board::cell_at` for coordinates outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Position {_0} is outside the board")]
pub struct OutOfBounds(#[error(not(source))] pub Position);

/// N x N grid of cells
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board of `size` x `size` cells
    pub fn new(size: usize) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                cells.push(Cell::new(row as i32, col as i32));
            }
        }
        Board { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Center cell, (N/2, N/2)
    pub fn center(&self) -> Position {
        let mid = (self.size / 2) as i32;
        Position::new(mid, mid)
    }

    pub fn is_valid_position(&self, pos: Position) -> bool {
        let n = self.size as i32;
        pos.row >= 0 && pos.row < n && pos.col >= 0 && pos.col < n
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.is_valid_position(pos) {
            Some(pos.row as usize * self.size + pos.col as usize)
        } else {
            None
        }
    }

    /// Returns the cell at (row, col)
    pub fn cell_at(&self, row: i32, col: i32) -> Result<&Cell, OutOfBounds> {
        let pos = Position::new(row, col);
        self.index(pos)
            .map(|i| &self.cells[i])
            .ok_or(OutOfBounds(pos))
    }

    /// Mark at a position, `None` when off the board
    pub fn mark_at(&self, pos: Position) -> Option<Mark> {
        self.index(pos).map(|i| self.cells[i].mark)
    }

    /// Sets the mark of an empty, in-range cell. Returns false and leaves the
    /// board untouched otherwise.
    pub fn place(&mut self, row: i32, col: i32, mark: Mark) -> bool {
        match self.index(Position::new(row, col)) {
            Some(i) if self.cells[i].is_empty() => {
                self.cells[i].mark = mark;
                true
            }
            _ => false,
        }
    }

    /// Reverts a cell to empty. Returns false if the position is off the board.
    pub fn clear(&mut self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i].mark = Mark::Empty;
                true
            }
            None => false,
        }
    }

    /// Places `mark` for the lifetime of the returned guard. The cell is
    /// emptied again when the guard drops. `None` if the cell is not free.
    pub fn trial(&mut self, pos: Position, mark: Mark) -> Option<Trial<'_>> {
        if self.place(pos.row, pos.col, mark) {
            Some(Trial { board: self, pos })
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Positions of all empty cells in row-major order
    pub fn empty_positions(&self) -> Vec<Position> {
        self.cells
            .iter()
            .filter(|c| c.is_empty())
            .map(|c| c.position)
            .collect()
    }

    /// Rows of marks, used for rendering
    pub fn rows(&self) -> Vec<Vec<Mark>> {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| c.mark).collect())
            .collect()
    }

    /// Counts contiguous `mark` cells from `pos` (exclusive) along a direction
    fn run_length(&self, pos: Position, direction: (i32, i32), mark: Mark) -> i32 {
        let mut length = 0;
        while self.mark_at(pos.offset(direction, length + 1)) == Some(mark) {
            length += 1;
        }
        length
    }

    /// Checks whether the mark just placed at (row, col) completes a run of
    /// at least five along any axis, trying horizontal, vertical, main
    /// diagonal and anti-diagonal in that order.
    ///
    /// Returns five coordinates ordered along the axis. For runs longer than
    /// five, the reported cells are the first five of the run (walking in the
    /// axis direction) that still include (row, col).
    pub fn winning_sequence_from(&self, row: i32, col: i32, mark: Mark) -> Option<[Position; WIN_LENGTH]> {
        let anchor = Position::new(row, col);
        if mark.is_empty() || self.mark_at(anchor) != Some(mark) {
            return None;
        }

        for direction in AXES {
            let backward = self.run_length(anchor, (-direction.0, -direction.1), mark);
            let forward = self.run_length(anchor, direction, mark);
            if (backward + forward + 1) as usize >= WIN_LENGTH {
                // Earliest five-cell window of the run that covers the anchor
                let start = -backward.min(WIN_LENGTH as i32 - 1);
                let mut sequence = [anchor; WIN_LENGTH];
                for (i, slot) in sequence.iter_mut().enumerate() {
                    *slot = anchor.offset(direction, start + i as i32);
                }
                return Some(sequence);
            }
        }
        None
    }
}

/// Scoped trial placement. Derefs to the board so the search can keep
/// recursing; the placed cell is emptied again on drop.
pub struct Trial<'a> {
    board: &'a mut Board,
    pos: Position,
}

impl Trial<'_> {
    pub fn position(&self) -> Position {
        self.pos
    }
}

impl Deref for Trial<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for Trial<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        self.board.clear(self.pos);
    }
}

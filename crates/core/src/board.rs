//! Board module - manages the 40×10 playfield grid
//!
//! Uses a flat array for cache locality and zero allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right) and y ranges 0..39
//! (top to bottom). Rows 0..19 are the hidden buffer above the visible area.
//! Every read goes through [`Board::cell`], which turns out-of-range coordinates
//! into [`CellValue::OutOfBounds`] instead of indexing.

use arrayvec::ArrayVec;

use crate::types::{CellValue, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Most rows a single lock can complete (a piece spans at most four rows).
pub const MAX_CLEAR_ROWS: usize = 4;

/// Rows completed by a lock, sorted top to bottom.
pub type ClearedRows = ArrayVec<usize, MAX_CLEAR_ROWS>;

/// The game board - 10 columns × 40 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Row-major (y * WIDTH + x)
    cells: [CellValue; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [CellValue::Empty; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Boundary-safe read. Never panics.
    pub fn cell(&self, x: i8, y: i8) -> CellValue {
        match Self::index(x, y) {
            Some(idx) => self.cells[idx],
            None => CellValue::OutOfBounds,
        }
    }

    /// Store a cell value.
    /// Returns false if out of bounds or if asked to store the out-of-bounds sentinel.
    pub fn set(&mut self, x: i8, y: i8, value: CellValue) -> bool {
        if value == CellValue::OutOfBounds {
            return false;
        }
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// In bounds and empty
    pub fn is_free(&self, x: i8, y: i8) -> bool {
        self.cell(x, y).is_empty()
    }

    /// Out of bounds or filled. Walls and floor count as occupied.
    pub fn is_blocked(&self, x: i8, y: i8) -> bool {
        !self.is_free(x, y)
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|cell| !cell.is_empty())
    }

    pub fn is_row_empty(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return true;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|cell| cell.is_empty())
    }

    /// Scan all 40 rows for full rows (top to bottom).
    ///
    /// At most [`MAX_CLEAR_ROWS`] are reported; a single lock cannot complete more.
    pub fn full_rows(&self) -> ClearedRows {
        let mut rows = ClearedRows::new();
        for y in 0..BOARD_HEIGHT as usize {
            if self.is_row_full(y) && rows.try_push(y).is_err() {
                break;
            }
        }
        rows
    }

    /// Remove exactly the given rows and shift everything above them down.
    ///
    /// Two-pointer compaction from the bottom; no allocation.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        if rows.is_empty() {
            return;
        }
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT as usize;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if rows.contains(&read_y) {
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                let src_start = read_y * width;
                let dst_start = write_y * width;
                self.cells
                    .copy_within(src_start..src_start + width, dst_start);
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = CellValue::Empty;
        }
    }

    /// Whether the board would be empty once `rows` are removed.
    pub fn is_empty_except(&self, rows: &[usize]) -> bool {
        (0..BOARD_HEIGHT as usize)
            .filter(|y| !rows.contains(y))
            .all(|y| self.is_row_empty(y))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    /// Push garbage rows in from the bottom, one hole per row.
    ///
    /// `holes` lists rows top to bottom (the last entry becomes the floor row).
    /// Returns false if occupied cells were pushed off the top of the board.
    pub fn insert_garbage_rows(&mut self, holes: &[u8]) -> bool {
        let height = BOARD_HEIGHT as usize;
        let width = BOARD_WIDTH as usize;
        let n = holes.len().min(height);
        if n == 0 {
            return true;
        }

        let overflow = (0..n).any(|y| !self.is_row_empty(y));

        self.cells.copy_within(n * width.., 0);

        for (i, &hole) in holes[holes.len() - n..].iter().enumerate() {
            let y = height - n + i;
            let start = y * width;
            for x in 0..width {
                self.cells[start + x] = if x == hole as usize {
                    CellValue::Empty
                } else {
                    CellValue::Garbage
                };
            }
        }

        !overflow
    }

    /// Row-major cell slice
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Write cell codes (see [`CellValue::code`]) into a fixed grid.
    pub fn write_code_grid(&self, out: &mut [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize]) {
        let width = BOARD_WIDTH as usize;
        for (y, row) in out.iter_mut().enumerate() {
            for (x, code) in row.iter_mut().enumerate() {
                *code = self.cells[y * width + x].code();
            }
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = CellValue::Empty;
        }
    }

    /// Fill a whole row with `value`, leaving the listed columns empty.
    pub fn fill_row_except(&mut self, y: i8, value: CellValue, holes: &[i8]) {
        for x in 0..BOARD_WIDTH as i8 {
            let v = if holes.contains(&x) {
                CellValue::Empty
            } else {
                value
            };
            self.set(x, y, v);
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceKind;

    #[test]
    fn test_board_index_calculation() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(9, 0), Some(9));
        assert_eq!(Board::index(0, 1), Some(10));
        assert_eq!(Board::index(9, 39), Some(399));
        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(10, 0), None);
        assert_eq!(Board::index(0, 40), None);
    }

    #[test]
    fn test_out_of_bounds_sentinel_is_never_stored() {
        let mut board = Board::new();
        assert!(!board.set(4, 4, CellValue::OutOfBounds));
        assert_eq!(board.cell(4, 4), CellValue::Empty);
    }

    #[test]
    fn test_remove_rows_shifts_above_down() {
        let mut board = Board::new();
        board.fill_row_except(39, CellValue::Garbage, &[]);
        board.fill_row_except(37, CellValue::Garbage, &[]);
        board.set(0, 38, CellValue::Piece(PieceKind::T));
        board.set(5, 36, CellValue::Piece(PieceKind::I));

        let rows = board.full_rows();
        assert_eq!(rows.as_slice(), &[37, 39]);
        board.remove_rows(&rows);

        assert_eq!(board.cell(0, 39), CellValue::Piece(PieceKind::T));
        assert_eq!(board.cell(5, 38), CellValue::Piece(PieceKind::I));
        assert!(board.is_row_empty(37));
        assert!(board.is_row_empty(0));
    }

    #[test]
    fn test_garbage_insert_detects_overflow() {
        let mut board = Board::new();
        board.set(2, 1, CellValue::Piece(PieceKind::O));
        assert!(board.insert_garbage_rows(&[0]));
        assert_eq!(board.cell(2, 0), CellValue::Piece(PieceKind::O));
        assert!(!board.insert_garbage_rows(&[0]));
    }

    #[test]
    fn test_code_grid() {
        let mut board = Board::new();
        board.set(1, 2, CellValue::Piece(PieceKind::L));
        let mut grid = [[0u8; 10]; 40];
        board.write_code_grid(&mut grid);
        assert_eq!(grid[2][1], 7);
        assert_eq!(grid[0][0], 0);
    }
}

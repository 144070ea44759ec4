use std::fmt;

use thiserror::Error;

/// Contiguous same-symbol cells needed to win.
pub const WIN_LENGTH: usize = 5;
/// Cells inspected on each side of a placed stone. A line of five through
/// the new stone can extend at most four cells in any half-direction, so the
/// win scan is constant work per move regardless of board size.
const SCAN_RADIUS: isize = (WIN_LENGTH - 1) as isize;

/// Closed cell state; there is no third player and no "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    PlayerA,
    PlayerB,
}

impl Cell {
    fn glyph(self) -> char {
        match self {
            Cell::Empty => '·',
            Cell::PlayerA => '●',
            Cell::PlayerB => '○',
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaceError {
    #[error("position is off the board")]
    OutOfBounds,
    #[error("cell is already occupied")]
    Occupied,
}

/// Square gomoku board.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    occupied: usize,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
            occupied: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Display glyph for a cell; out-of-bounds positions render as empty.
    pub fn glyph_at(&self, row: usize, col: usize) -> char {
        self.get(row, col).unwrap_or(Cell::Empty).glyph()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.size && col < self.size {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Place a stone. Fails without mutation when out of bounds or occupied.
    pub fn place(&mut self, row: usize, col: usize, stone: Cell) -> Result<(), PlaceError> {
        match self.get(row, col) {
            None => Err(PlaceError::OutOfBounds),
            Some(Cell::Empty) => {
                self.cells[row * self.size + col] = stone;
                self.occupied += 1;
                Ok(())
            }
            Some(_) => Err(PlaceError::Occupied),
        }
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.cells.len()
    }

    /// Localized win scan through `(row, col)`: for each of the four line
    /// orientations, count contiguous same-symbol stones in both
    /// half-directions out to [`SCAN_RADIUS`].
    pub fn wins_at(&self, row: usize, col: usize) -> bool {
        let stone = match self.get(row, col) {
            Some(c) if c != Cell::Empty => c,
            _ => return false,
        };

        const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = 1
                + self.count_dir(row, col, dr, dc, stone)
                + self.count_dir(row, col, -dr, -dc, stone);
            run >= WIN_LENGTH
        })
    }

    fn count_dir(&self, row: usize, col: usize, dr: isize, dc: isize, stone: Cell) -> usize {
        let mut run = 0;
        for step in 1..=SCAN_RADIUS {
            let r = row as isize + dr * step;
            let c = col as isize + dc * step;
            if r < 0 || c < 0 {
                break;
            }
            if self.get(r as usize, c as usize) != Some(stone) {
                break;
            }
            run += 1;
        }
        run
    }

    #[cfg(test)]
    pub(crate) fn set_raw(&mut self, row: usize, col: usize, cell: Cell) {
        let idx = row * self.size + col;
        if self.cells[idx] == Cell::Empty && cell != Cell::Empty {
            self.occupied += 1;
        }
        self.cells[idx] = cell;
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                let cell = self.cells[row * self.size + col];
                f.write_fmt(format_args!("{}", cell.glyph()))?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

//! Dense occupancy bitmap of the roll.
//!
//! Row 0 is the top of the roll. Each row is `width` bits packed into `u64`
//! words. Rows are only ever appended; rows past the current horizon of a
//! branch stay allocated but are left clear by the matching `release` calls.

const WORD_BITS: u32 = u64::BITS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    words_per_row: usize,
    rows: u32,
    cells: Vec<u64>,
}

impl OccupancyGrid {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            words_per_row: width.div_ceil(WORD_BITS) as usize,
            rows: 0,
            cells: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of allocated rows.
    pub fn height(&self) -> u32 {
        self.rows
    }

    /// Appends clear rows until at least `h` rows exist. Never shrinks.
    pub fn ensure_height(&mut self, h: u32) {
        if h > self.rows {
            self.cells.resize(h as usize * self.words_per_row, 0);
            self.rows = h;
        }
    }

    /// Cells in rows that were never allocated read as free.
    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.rows {
            return false;
        }
        let word = self.row(y)[(x / WORD_BITS) as usize];
        word & (1u64 << (x % WORD_BITS)) != 0
    }

    /// True iff `[x, x+w) × [y, y+h)` lies inside the roll width and covers no
    /// occupied cell. The roll is unbounded downwards.
    pub fn can_place(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        if x as u64 + w as u64 > self.width as u64 {
            return false;
        }
        let last_row = (y as u64 + h as u64).min(self.rows as u64) as u32;
        (y..last_row).all(|row_y| {
            let row = self.row(row_y);
            span_masks(x, w).all(|(word, mask)| row[word] & mask == 0)
        })
    }

    /// Like [`can_place`](Self::can_place) but also requires the rectangle to
    /// end inside the allocated rows.
    pub fn fits_within(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        y as u64 + h as u64 <= self.rows as u64 && self.can_place(x, y, w, h)
    }

    /// Marks every covered cell occupied, growing the grid if needed.
    pub fn occupy(&mut self, x: u32, y: u32, w: u32, h: u32) {
        debug_assert!(x + w <= self.width, "occupy past roll width");
        debug_assert!(self.can_place(x, y, w, h), "occupy over occupied cells");
        self.ensure_height(y + h);
        for row_y in y..y + h {
            let row = self.row_mut(row_y);
            for (word, mask) in span_masks(x, w) {
                row[word] |= mask;
            }
        }
    }

    /// Exact inverse of [`occupy`](Self::occupy) with the same arguments.
    pub fn release(&mut self, x: u32, y: u32, w: u32, h: u32) {
        debug_assert!(y + h <= self.rows, "release of unallocated rows");
        for row_y in y..y + h {
            let row = self.row_mut(row_y);
            for (word, mask) in span_masks(x, w) {
                debug_assert_eq!(row[word] & mask, mask, "release of free cells");
                row[word] &= !mask;
            }
        }
    }

    /// First feasible top-left cell in row-major order over the allocated rows.
    pub fn first_fit(&self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > self.width {
            return None;
        }
        (0..self.rows).find_map(|y| {
            (0..=self.width - w)
                .find(|&x| self.can_place(x, y, w, h))
                .map(|x| (x, y))
        })
    }

    pub fn occupied_cells(&self) -> u64 {
        self.cells.iter().map(|w| w.count_ones() as u64).sum()
    }

    fn row(&self, y: u32) -> &[u64] {
        let start = y as usize * self.words_per_row;
        &self.cells[start..start + self.words_per_row]
    }

    fn row_mut(&mut self, y: u32) -> &mut [u64] {
        let start = y as usize * self.words_per_row;
        &mut self.cells[start..start + self.words_per_row]
    }
}

/// `(word index, bit mask)` pairs covering columns `[x, x+w)` of one row.
fn span_masks(x: u32, w: u32) -> impl Iterator<Item = (usize, u64)> {
    let end = x + w;
    let words = if w == 0 {
        0..0
    } else {
        x / WORD_BITS..(end - 1) / WORD_BITS + 1
    };
    words.map(move |word| {
        let base = word * WORD_BITS;
        let lo = x.max(base) - base;
        let hi = end.min(base + WORD_BITS) - base;
        let bits = hi - lo;
        let mask = if bits == WORD_BITS {
            u64::MAX
        } else {
            ((1u64 << bits) - 1) << lo
        };
        (word as usize, mask)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = OccupancyGrid::new(10);
        assert_eq!(grid.height(), 0);
        assert_eq!(grid.occupied_cells(), 0);
        assert!(grid.can_place(0, 0, 10, 5));
    }

    #[test]
    fn test_ensure_height_never_shrinks() {
        let mut grid = OccupancyGrid::new(4);
        grid.ensure_height(5);
        assert_eq!(grid.height(), 5);
        grid.ensure_height(2);
        assert_eq!(grid.height(), 5);
    }

    #[test]
    fn test_can_place_respects_width() {
        let grid = OccupancyGrid::new(4);
        assert!(grid.can_place(2, 0, 2, 1));
        assert!(!grid.can_place(3, 0, 2, 1));
        assert!(!grid.can_place(0, 0, 5, 1));
        assert!(!grid.can_place(u32::MAX, 0, 2, 1));
    }

    #[test]
    fn test_occupy_blocks_overlaps() {
        let mut grid = OccupancyGrid::new(4);
        grid.occupy(1, 1, 2, 2);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.occupied_cells(), 4);
        assert!(grid.is_occupied(1, 1));
        assert!(grid.is_occupied(2, 2));
        assert!(!grid.is_occupied(3, 2));
        assert!(!grid.can_place(0, 0, 2, 2));
        assert!(grid.can_place(3, 0, 1, 4));
        assert!(grid.can_place(0, 3, 4, 1));
    }

    #[test]
    fn test_occupy_release_restores_grid() {
        let mut grid = OccupancyGrid::new(7);
        grid.occupy(0, 0, 3, 2);
        grid.ensure_height(6);
        let before = grid.clone();
        grid.occupy(3, 1, 4, 3);
        assert_ne!(grid, before);
        grid.release(3, 1, 4, 3);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_rows_beyond_height_are_free() {
        let mut grid = OccupancyGrid::new(3);
        grid.occupy(0, 0, 3, 1);
        assert!(!grid.fits_within(0, 1, 3, 1));
        assert!(grid.can_place(0, 1, 3, 10));
        assert!(!grid.can_place(0, 0, 1, 10));
    }

    #[test]
    fn test_first_fit_scans_row_major() {
        let mut grid = OccupancyGrid::new(4);
        grid.ensure_height(4);
        grid.occupy(0, 0, 3, 1);
        assert_eq!(grid.first_fit(1, 1), Some((3, 0)));
        assert_eq!(grid.first_fit(2, 1), Some((0, 1)));
        assert_eq!(grid.first_fit(5, 1), None);
    }

    #[test]
    fn test_spans_across_word_boundaries() {
        let mut grid = OccupancyGrid::new(150);
        grid.occupy(60, 0, 80, 2);
        assert_eq!(grid.occupied_cells(), 160);
        assert!(grid.is_occupied(63, 0));
        assert!(grid.is_occupied(64, 1));
        assert!(grid.is_occupied(139, 0));
        assert!(!grid.is_occupied(140, 0));
        assert!(grid.can_place(0, 0, 60, 2));
        assert!(!grid.can_place(0, 0, 61, 1));
        assert!(grid.can_place(140, 0, 10, 2));
        grid.release(60, 0, 80, 2);
        assert_eq!(grid.occupied_cells(), 0);
    }

    #[test]
    fn test_full_word_row() {
        let mut grid = OccupancyGrid::new(128);
        grid.occupy(0, 0, 128, 1);
        assert_eq!(grid.occupied_cells(), 128);
        assert!(!grid.can_place(127, 0, 1, 1));
        assert_eq!(grid.first_fit(128, 1), None);
        grid.ensure_height(2);
        assert_eq!(grid.first_fit(128, 1), Some((0, 1)));
    }
}

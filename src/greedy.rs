//! One-pass constructive packing.
//!
//! Pieces are placed in a fixed order into the first cell of the existing rows
//! that holds them (current orientation first, then turned). Only columns
//! where the piece as given still fits the width are scanned. A piece that
//! fits nowhere opens new rows at the bottom of the roll. Nothing is ever
//! moved again.

use tracing::debug;

use crate::grid::OccupancyGrid;
use crate::types::{Demand, Placement, Rect};

/// A single copy of a demand item, in its current orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub item: usize,
    pub rect: Rect,
    /// `rect` is the demand shape turned by 90 degrees.
    pub rotated: bool,
}

pub fn expand(demands: &[Demand]) -> Vec<Piece> {
    demands
        .iter()
        .enumerate()
        .flat_map(|(item, d)| {
            (0..d.qty).map(move |_| Piece {
                item,
                rect: d.rect,
                rotated: false,
            })
        })
        .collect()
}

/// Longer side descending, ties broken by shorter side descending.
pub fn sort_largest_first(pieces: &mut [Piece]) {
    pieces.sort_by(|a, b| {
        b.rect
            .long_side()
            .cmp(&a.rect.long_side())
            .then(b.rect.short_side().cmp(&a.rect.short_side()))
    });
}

/// Greedy packing of the whole demand, largest pieces first.
pub fn greedy(width: u32, demands: &[Demand]) -> (u32, Vec<Placement>) {
    let mut pieces = expand(demands);
    sort_largest_first(&mut pieces);
    let (length, placements) = pack_in_order(width, &pieces);
    debug!(length, pieces = pieces.len(), "greedy packing done");
    (length, placements)
}

/// Packs `pieces` in the given order. Every piece must fit the roll width in
/// at least one orientation.
pub fn pack_in_order(width: u32, pieces: &[Piece]) -> (u32, Vec<Placement>) {
    let mut grid = OccupancyGrid::new(width);
    let mut placements = Vec::with_capacity(pieces.len());

    for piece in pieces {
        let (x, y, rect) = find_in_rows(&grid, piece.rect)
            .unwrap_or_else(|| open_rows(&mut grid, piece.rect));
        grid.occupy(x, y, rect.w, rect.h);
        placements.push(Placement {
            item: piece.item,
            x,
            y,
            rect,
            rotated: piece.rotated != (rect != piece.rect),
        });
    }

    (grid.height(), placements)
}

fn find_in_rows(grid: &OccupancyGrid, shape: Rect) -> Option<(u32, u32, Rect)> {
    let last_x = grid.width().checked_sub(shape.w)?;
    let rotated = shape.rotated();
    for y in 0..grid.height() {
        for x in 0..=last_x {
            if grid.fits_within(x, y, shape.w, shape.h) {
                return Some((x, y, shape));
            }
            if grid.fits_within(x, y, rotated.w, rotated.h) {
                return Some((x, y, rotated));
            }
        }
    }
    None
}

/// Appends rows for `shape` and returns its spot at the left of the first new row.
fn open_rows(grid: &mut OccupancyGrid, shape: Rect) -> (u32, u32, Rect) {
    let width = grid.width();
    let rect = if shape.w == 1 && shape.h <= width {
        // lay thin strips flat
        shape.rotated()
    } else if shape.w <= width {
        shape
    } else {
        shape.rotated()
    };
    let y = grid.height();
    grid.ensure_height(y + rect.h);
    (0, y, rect)
}

//! Branch-and-bound strip packing.
//!
//! Every node tries each remaining item type, each distinct orientation, and
//! for each of those only the first feasible cell in row-major order. The
//! area bound in [`crate::bound`] cuts nodes that cannot beat the incumbent.

use std::ops::{Deref, DerefMut};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bound::is_promising;
use crate::config::SearchLimits;
use crate::error::PackError;
use crate::grid::OccupancyGrid;
use crate::recorder::Recorder;
use crate::types::{Demand, Placement, Rect};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub pruned: u64,
    pub improvements: u64,
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub length: u32,
    pub placements: Vec<Placement>,
    pub stats: SearchStats,
    /// Incumbent lengths in the order they were recorded.
    pub history: Vec<u32>,
}

/// Fails fast on instances the search could never finish.
///
/// No packing built here is longer than every piece stacked on its longer
/// side, so once that fits a `u32` no coordinate can overflow.
pub fn precheck(width: u32, demands: &[Demand]) -> Result<(), PackError> {
    if width == 0 {
        return Err(PackError::InvalidWidth(width));
    }
    let stacked = Recorder::sentinel_for(demands) - 1;
    if stacked > u32::MAX as u64 {
        return Err(PackError::LengthOverflow { stacked });
    }
    for (item, d) in demands.iter().enumerate() {
        if d.qty > 0 && !d.rect.fits_roll(width) {
            return Err(PackError::Infeasible {
                item,
                width: d.rect.w,
                height: d.rect.h,
                roll_width: width,
            });
        }
    }
    Ok(())
}

/// Grid, remaining demand and placement stack of the branch being explored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    grid: OccupancyGrid,
    demands: Vec<Demand>,
    placements: Vec<Placement>,
    placed_area: u64,
}

impl Frame {
    pub fn new(width: u32, demands: Vec<Demand>) -> Self {
        Self {
            grid: OccupancyGrid::new(width),
            demands,
            placements: Vec::new(),
            placed_area: 0,
        }
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placed_area(&self) -> u64 {
        self.placed_area
    }

    /// Commits one copy of `item` as `rect` at `(x, y)`. The placement is
    /// undone when the returned guard is dropped.
    pub fn place(
        &mut self,
        item: usize,
        x: u32,
        y: u32,
        rect: Rect,
        rotated: bool,
    ) -> Tentative<'_> {
        debug_assert!(self.demands[item].qty > 0, "placing an exhausted item");
        self.grid.occupy(x, y, rect.w, rect.h);
        self.demands[item].qty -= 1;
        self.placed_area += rect.area();
        self.placements.push(Placement {
            item,
            x,
            y,
            rect,
            rotated,
        });
        Tentative { frame: self }
    }
}

/// A placement that holds until dropped. Derefs to the frame so the branch
/// below it can keep placing.
pub struct Tentative<'a> {
    frame: &'a mut Frame,
}

impl Deref for Tentative<'_> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        self.frame
    }
}

impl DerefMut for Tentative<'_> {
    fn deref_mut(&mut self) -> &mut Frame {
        self.frame
    }
}

impl Drop for Tentative<'_> {
    fn drop(&mut self) {
        // Guards nest through the &mut borrow, so the top of the stack is ours.
        if let Some(p) = self.frame.placements.pop() {
            self.frame.grid.release(p.x, p.y, p.rect.w, p.rect.h);
            self.frame.demands[p.item].qty += 1;
            self.frame.placed_area -= p.rect.area();
        }
    }
}

pub struct Search {
    width: u32,
    total: usize,
    prune: bool,
    node_limit: Option<u64>,
    deadline: Option<Instant>,
    recorder: Recorder,
    stats: SearchStats,
}

impl Search {
    pub fn new(width: u32, demands: &[Demand], limits: SearchLimits, prune: bool) -> Self {
        Self {
            width,
            total: demands.iter().map(|d| d.qty as usize).sum(),
            prune,
            node_limit: limits.node_limit,
            deadline: limits.time_limit().map(|limit| Instant::now() + limit),
            recorder: Recorder::new(Recorder::sentinel_for(demands)),
            stats: SearchStats::default(),
        }
    }

    pub fn run(mut self, demands: Vec<Demand>) -> Result<SearchOutcome, PackError> {
        precheck(self.width, &demands)?;
        info!(
            width = self.width,
            items = self.total,
            types = demands.len(),
            prune = self.prune,
            "starting exhaustive search"
        );

        let mut frame = Frame::new(self.width, demands);
        self.descend(&mut frame, 0);
        debug_assert!(frame.placements.is_empty(), "placements leaked out of the search");

        let stats = self.stats;
        if stats.truncated {
            warn!(nodes = stats.nodes, "search budget reached, result may not be optimal");
        }
        let history = self.recorder.history().to_vec();
        let (length, placements) = self
            .recorder
            .into_best()
            .ok_or(PackError::BudgetExhausted { nodes: stats.nodes })?;

        info!(
            length,
            nodes = stats.nodes,
            pruned = stats.pruned,
            improvements = stats.improvements,
            "exhaustive search finished"
        );
        Ok(SearchOutcome {
            length,
            placements,
            stats,
            history,
        })
    }

    fn descend(&mut self, frame: &mut Frame, current_length: u32) {
        if self.budget_exceeded() {
            return;
        }
        self.stats.nodes += 1;

        if frame.placements.len() == self.total {
            if self.recorder.improves(current_length) {
                debug!(length = current_length, nodes = self.stats.nodes, "new best packing");
                self.recorder.record(current_length, &frame.placements);
                self.stats.improvements += 1;
            }
            return;
        }

        if self.prune
            && !is_promising(
                current_length,
                frame.placed_area,
                &frame.demands,
                self.width,
                self.recorder.best_length(),
            )
        {
            self.stats.pruned += 1;
            return;
        }

        for item in 0..frame.demands.len() {
            let demand = &frame.demands[item];
            if demand.qty == 0 {
                continue;
            }
            let shape = demand.rect;

            // Rows at and below current_length are empty, so this many rows
            // always hold a first-fit position for a shape that fits the width.
            frame.grid.ensure_height(current_length + shape.long_side());

            let orientations: &[bool] = if shape.is_square() {
                &[false]
            } else {
                &[false, true]
            };
            for &rotated in orientations {
                let rect = if rotated { shape.rotated() } else { shape };
                let Some((x, y)) = frame.grid.first_fit(rect.w, rect.h) else {
                    continue;
                };
                let mut branch = frame.place(item, x, y, rect, rotated);
                self.descend(&mut branch, current_length.max(y + rect.h));
                drop(branch);

                if self.stats.truncated {
                    return;
                }
            }
        }
    }

    fn budget_exceeded(&mut self) -> bool {
        if self.stats.truncated {
            return true;
        }
        let over_nodes = self.node_limit.is_some_and(|limit| self.stats.nodes >= limit);
        let over_time = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if over_nodes || over_time {
            self.stats.truncated = true;
        }
        self.stats.truncated
    }
}

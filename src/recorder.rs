use crate::types::{Demand, Placement};

/// Best complete packing seen during one search.
#[derive(Debug, Clone)]
pub struct Recorder {
    best_length: u64,
    placements: Vec<Placement>,
    history: Vec<u32>,
}

impl Recorder {
    /// Starts from a length no feasible packing can reach.
    pub fn new(sentinel: u64) -> Self {
        Self {
            best_length: sentinel,
            placements: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Stacking every copy at its longer side bounds any packing the search
    /// can build, so one more than that sum is unreachable.
    pub fn sentinel_for(demands: &[Demand]) -> u64 {
        demands
            .iter()
            .map(|d| d.qty as u64 * d.rect.long_side() as u64)
            .sum::<u64>()
            + 1
    }

    pub fn best_length(&self) -> u64 {
        self.best_length
    }

    pub fn has_solution(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn improves(&self, length: u32) -> bool {
        (length as u64) < self.best_length
    }

    /// Overwrites the incumbent. Callers check [`improves`](Self::improves) first.
    pub fn record(&mut self, length: u32, placements: &[Placement]) {
        debug_assert!(self.improves(length), "recorded a non-improving packing");
        self.best_length = length as u64;
        self.placements.clear();
        self.placements.extend_from_slice(placements);
        self.history.push(length);
    }

    /// Lengths of every recorded incumbent, oldest first.
    pub fn history(&self) -> &[u32] {
        &self.history
    }

    pub fn into_best(self) -> Option<(u32, Vec<Placement>)> {
        if !self.has_solution() {
            return None;
        }
        // has_solution implies the length came from a u32.
        Some((self.best_length as u32, self.placements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;

    fn placement(y: u32) -> Placement {
        Placement {
            item: 0,
            x: 0,
            y,
            rect: Rect::new(1, 1),
            rotated: false,
        }
    }

    #[test]
    fn test_sentinel_exceeds_stacked_height() {
        let demands = vec![Demand::new(2, 5, 3), Demand::new(4, 1, 2)];
        assert_eq!(Recorder::sentinel_for(&demands), 3 * 5 + 2 * 4 + 1);
        assert_eq!(Recorder::sentinel_for(&[]), 1);
    }

    #[test]
    fn test_empty_recorder_has_no_best() {
        let rec = Recorder::new(10);
        assert!(!rec.has_solution());
        assert!(rec.improves(9));
        assert!(!rec.improves(10));
        assert!(rec.into_best().is_none());
    }

    #[test]
    fn test_record_overwrites_and_tracks_history() {
        let mut rec = Recorder::new(100);
        rec.record(7, &[placement(0), placement(6)]);
        rec.record(5, &[placement(4)]);
        assert_eq!(rec.best_length(), 5);
        assert_eq!(rec.history(), &[7, 5]);
        assert!(!rec.improves(5));
        let (length, placements) = rec.into_best().unwrap();
        assert_eq!(length, 5);
        assert_eq!(placements, vec![placement(4)]);
    }
}

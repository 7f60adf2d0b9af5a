use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use rkyv::{Archive, Deserialize, Serialize};

use crate::grid::{Point, Rect};
use crate::protocol::{ViewCell, ViewPort};
use crate::snapshot::{FieldSnapshot, FIELD_SNAPSHOT_VERSION};

pub const DEFAULT_DENSITY: u32 = 5;

/// Maximum Euclidean distance a flood fill may travel from the uncovered cell.
pub const FLOOD_FILL_RADIUS: f64 = 30.0;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mark {
    Flag,
    Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncoverOutcome {
    Miss,
    Boom,
}

/// The shared minefield: a procedural mine oracle plus the monotonically
/// growing record of what players have done to it.
///
/// Mine placement is never stored; it is recomputed from the seed and the
/// density on every query. Only `uncovered`, `triggered` and `marks` are
/// state, and their key sets stay pairwise disjoint.
#[derive(Debug, Clone)]
pub struct MineField {
    seed: [u8; 16],
    density: u32,
    uncovered: HashMap<Point, u8>,
    triggered: HashSet<Point>,
    marks: HashMap<Point, Mark>,
}

impl MineField {
    pub fn new(seed: [u8; 16], density: u32) -> Self {
        Self {
            seed,
            // a density below 2 would turn every cell into a mine
            density: density.max(2),
            uncovered: HashMap::new(),
            triggered: HashSet::new(),
            marks: HashMap::new(),
        }
    }

    pub fn seed(&self) -> [u8; 16] {
        self.seed
    }

    pub fn density(&self) -> u32 {
        self.density
    }

    pub fn uncovered(&self) -> &HashMap<Point, u8> {
        &self.uncovered
    }

    pub fn triggered(&self) -> &HashSet<Point> {
        &self.triggered
    }

    pub fn marks(&self) -> &HashMap<Point, Mark> {
        &self.marks
    }

    /// FNV-1a of `seed || le8(x + 2^63) || le8(y + 2^63)`. The bias keeps the
    /// byte encoding of negative coordinates identical across hosts.
    pub fn location_hash(&self, p: Point) -> u32 {
        let mut hash = FNV_OFFSET_BASIS;
        for &byte in self
            .seed
            .iter()
            .chain(&coord_bytes(p.x))
            .chain(&coord_bytes(p.y))
        {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    pub fn is_mine(&self, p: Point) -> bool {
        self.location_hash(p) % self.density == 0
    }

    pub fn neighboring_mines(&self, p: Point) -> u8 {
        p.neighbors().iter().filter(|&&n| self.is_mine(n)).count() as u8
    }

    /// Cycles the mark at `p` through none -> flag -> question -> none.
    ///
    /// Revealed cells cannot carry a mark, so marking an uncovered or
    /// triggered cell does nothing.
    pub fn mark(&mut self, p: Point) {
        if self.uncovered.contains_key(&p) || self.triggered.contains(&p) {
            return;
        }
        match self.marks.get(&p) {
            None => {
                self.marks.insert(p, Mark::Flag);
            }
            Some(Mark::Flag) => {
                self.marks.insert(p, Mark::Question);
            }
            Some(Mark::Question) => {
                self.marks.remove(&p);
            }
        }
    }

    /// Reveals the cell at `p` and returns the outcome together with the
    /// number of cells that changed state.
    ///
    /// A cell that is already uncovered or triggered is left alone and
    /// reported as `(Miss, 0)`. Stepping on a mine triggers it. A cell with
    /// no neighboring mines starts a radius-bounded flood fill; the returned
    /// count then covers every newly revealed cell, `p` included.
    pub fn uncover(&mut self, p: Point) -> (UncoverOutcome, u64) {
        if self.uncovered.contains_key(&p) || self.triggered.contains(&p) {
            return (UncoverOutcome::Miss, 0);
        }

        self.marks.remove(&p);

        if self.is_mine(p) {
            self.triggered.insert(p);
            return (UncoverOutcome::Boom, 1);
        }

        let mines = self.neighboring_mines(p);
        if mines > 0 {
            self.uncovered.insert(p, mines);
            return (UncoverOutcome::Miss, 1);
        }

        (UncoverOutcome::Miss, self.flood_fill(p))
    }

    /// Breadth-first reveal around `seed`, expanding only through cells with
    /// zero neighboring mines and never beyond `FLOOD_FILL_RADIUS`.
    fn flood_fill(&mut self, seed: Point) -> u64 {
        let mut frontier = HashSet::from([seed]);
        let mut closed: HashSet<Point> = HashSet::new();
        let mut reveal: HashMap<Point, u8> = HashMap::new();

        while !frontier.is_empty() {
            let mut next = HashSet::new();
            for &p in &frontier {
                let mines = self.neighboring_mines(p);
                reveal.insert(p, mines);
                closed.insert(p);
                if mines != 0 {
                    continue;
                }
                for q in p.neighbors() {
                    if !closed.contains(&q) && seed.distance(q) <= FLOOD_FILL_RADIUS {
                        next.insert(q);
                    }
                }
            }
            // a cell enqueued early in the round may have been processed later
            // in the same round
            next.retain(|q| !closed.contains(q));
            frontier = next;
        }

        let mut added = 0;
        for (p, mines) in reveal {
            if let Entry::Vacant(slot) = self.uncovered.entry(p) {
                slot.insert(mines);
                self.marks.remove(&p);
                added += 1;
            }
        }
        added
    }

    /// Projects `rect` into a row-major grid of symbolic cells. Cell
    /// `data[ay][ax]` corresponds to world coordinate
    /// `(rect.min.x + ax, rect.min.y + ay)`.
    ///
    /// Covered cells render blank no matter what the oracle says; the mine
    /// layout is never leaked to clients.
    pub fn extract_view(&self, rect: Rect) -> ViewPort {
        let width = rect.width().max(0) as usize;
        let height = rect.height().max(0) as usize;

        let mut data = Vec::with_capacity(height);
        for ay in 0..height {
            let mut row = Vec::with_capacity(width);
            for ax in 0..width {
                let p = Point::new(rect.min.x + ax as i64, rect.min.y + ay as i64);
                row.push(self.cell_symbol(p));
            }
            data.push(row);
        }

        ViewPort {
            position: rect,
            data,
        }
    }

    fn cell_symbol(&self, p: Point) -> ViewCell {
        if let Some(&mines) = self.uncovered.get(&p) {
            return ViewCell::Count(mines);
        }
        if self.triggered.contains(&p) {
            return ViewCell::Mine;
        }
        match self.marks.get(&p) {
            Some(Mark::Flag) => ViewCell::Flag,
            Some(Mark::Question) => ViewCell::Question,
            None => ViewCell::Blank,
        }
    }

    pub fn to_snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            version: FIELD_SNAPSHOT_VERSION,
            seed: self.seed,
            density: self.density,
            uncovered: self.uncovered.iter().map(|(&p, &n)| (p, n)).collect(),
            triggered: self.triggered.iter().copied().collect(),
            marks: self.marks.iter().map(|(&p, &m)| (p, m)).collect(),
        }
    }

    pub fn from_snapshot(snapshot: FieldSnapshot) -> Self {
        Self {
            seed: snapshot.seed,
            density: snapshot.density.max(2),
            uncovered: snapshot.uncovered.into_iter().collect(),
            triggered: snapshot.triggered.into_iter().collect(),
            marks: snapshot.marks.into_iter().collect(),
        }
    }
}

fn coord_bytes(value: i64) -> [u8; 8] {
    (value as u64).wrapping_add(1u64 << 63).to_le_bytes()
}

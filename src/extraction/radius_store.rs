use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{Read, Write};

use crate::error::Result;
use crate::util::binary::{read_count, read_f64, write_count, write_f64, BinaryRecord};

/// One reported edge radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusRecord<N> {
    pub from: N,
    pub to: N,
    pub radius: f64,
}

/// Append-only log of per-edge radius estimates with a lazily rebuilt
/// lookup map. On duplicate keys the last record wins.
#[derive(Debug, Clone)]
pub struct EdgeRadiusStore<N> {
    records: Vec<RadiusRecord<N>>,
    bidirectional: bool,
    lookup: OnceCell<HashMap<(N, N), f64>>,
}

impl<N: Copy + Eq + Hash + Debug> EdgeRadiusStore<N> {
    /// With `bidirectional`, a lookup of `(from, to)` falls back to
    /// `(to, from)`.
    pub fn new(bidirectional: bool) -> Self {
        EdgeRadiusStore {
            records: Vec::new(),
            bidirectional,
            lookup: OnceCell::new(),
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    pub fn put_radius(&mut self, from: N, to: N, radius: f64) {
        debug_assert!(radius > 0.0, "edge radius must be positive, got {radius}");
        self.records.push(RadiusRecord { from, to, radius });
        self.lookup.take();
    }

    fn lookup(&self) -> &HashMap<(N, N), f64> {
        self.lookup.get_or_init(|| {
            self.records
                .iter()
                .map(|r| ((r.from, r.to), r.radius))
                .collect()
        })
    }

    /// Radius of `(from, to)`, or of `(to, from)` when the store is
    /// bidirectional.
    pub fn get(&self, from: N, to: N) -> Option<f64> {
        let lookup = self.lookup();
        lookup.get(&(from, to)).copied().or_else(|| {
            if self.bidirectional {
                lookup.get(&(to, from)).copied()
            } else {
                None
            }
        })
    }

    /// Like `get`, but a missing edge is an internal consistency failure.
    pub fn radius(&self, from: N, to: N) -> f64 {
        match self.get(from, to) {
            Some(r) => r,
            None => panic!("no radius recorded for edge {from:?} -> {to:?}"),
        }
    }

    /// Drop every record whose `(from, to)` matches `predicate`.
    pub fn remove_radiuses(&mut self, mut predicate: impl FnMut(N, N) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !predicate(r.from, r.to));
        self.lookup.take();
        before - self.records.len()
    }

    pub fn records(&self) -> &[RadiusRecord<N>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.lookup.take();
    }
}

impl<N: Copy + Eq + Hash + Debug + BinaryRecord> EdgeRadiusStore<N> {
    /// Records are written with full node values, in append order.
    pub fn save_to(&self, w: &mut dyn Write) -> Result<()> {
        write_count(w, self.records.len())?;
        for r in &self.records {
            r.from.write_to(w)?;
            r.to.write_to(w)?;
            write_f64(w, r.radius)?;
        }
        Ok(())
    }

    pub fn load_from(r: &mut dyn Read, bidirectional: bool) -> Result<Self> {
        let count = read_count(r)?;
        let mut store = EdgeRadiusStore::new(bidirectional);
        store.records.reserve(count.min(1 << 20));
        for _ in 0..count {
            let from = N::read_from(r)?;
            let to = N::read_from(r)?;
            let radius = read_f64(r)?;
            store.records.push(RadiusRecord { from, to, radius });
        }
        Ok(store)
    }
}

//! Bit-packed boolean matrices over a dense node index.
//!
//! Rows are fixed-width bit vectors of `u64` words. Multiplication is over the
//! boolean semiring (AND as product, OR as sum), computed row-wise: row `r` of
//! `A × B` is the OR of every row `j` of `B` with `A[r][j]` set.

use std::collections::HashMap;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::graph::Adjacency;
use crate::hull::DistanceBound;
use crate::ids::NodeId;

const WORD_BITS: usize = u64::BITS as usize;

/// Bijection between the node ids touched by one evaluation and `0..len`.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    ids: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
}

impl NodeIndex {
    /// Index the distinct ids of `nodes`, in first-appearance order.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut index = Self::default();
        for node in nodes {
            index.insert(node);
        }
        index
    }

    /// Position of `node`, adding it if new.
    pub fn insert(&mut self, node: NodeId) -> usize {
        let next = self.ids.len();
        let pos = *self.positions.entry(node).or_insert(next);
        if pos == next {
            self.ids.push(node);
        }
        pos
    }

    pub fn position(&self, node: NodeId) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    pub fn node(&self, position: usize) -> NodeId {
        self.ids[position]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        self.ids.len() * (2 * size_of::<NodeId>() + size_of::<usize>() + 8)
    }
}

/// A `rows × cols` boolean matrix stored as packed bit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl BitMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let words_per_row = cols.div_ceil(WORD_BITS);
        Self {
            rows,
            cols,
            words_per_row,
            bits: vec![0; rows * words_per_row],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i);
        }
        m
    }

    /// One row per entry of `columns`, with exactly that column set.
    /// With `columns == 0..n` this is the identity.
    pub fn selector(columns: &[usize], cols: usize) -> Self {
        let mut m = Self::zeros(columns.len(), cols);
        for (row, &col) in columns.iter().enumerate() {
            m.set(row, col);
        }
        m
    }

    /// Square adjacency matrix of `adjacency` over `index`: `M[i][j]` is set
    /// iff there is an edge from `index.node(i)` to `index.node(j)`. Every
    /// endpoint of the relation must already be in `index`.
    pub fn from_adjacency<A: Adjacency + ?Sized>(adjacency: &A, index: &NodeIndex) -> Self {
        let n = index.len();
        let mut m = Self::zeros(n, n);
        for &source in adjacency.source_nodes() {
            let Some(i) = index.position(source) else {
                continue;
            };
            for &target in adjacency.successors(source) {
                if let Some(j) = index.position(target) {
                    m.set(i, j);
                }
            }
        }
        m
    }

    /// Bytes needed for a `rows × cols` matrix.
    pub fn bytes_for(rows: usize, cols: usize) -> usize {
        rows * cols.div_ceil(WORD_BITS) * std::mem::size_of::<u64>()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn memory_usage(&self) -> usize {
        self.bits.len() * std::mem::size_of::<u64>()
    }

    fn row_words(&self, row: usize) -> &[u64] {
        &self.bits[row * self.words_per_row..(row + 1) * self.words_per_row]
    }

    fn row_words_mut(&mut self, row: usize) -> &mut [u64] {
        &mut self.bits[row * self.words_per_row..(row + 1) * self.words_per_row]
    }

    pub fn set(&mut self, row: usize, col: usize) {
        debug_assert!(row < self.rows && col < self.cols);
        self.bits[row * self.words_per_row + col / WORD_BITS] |= 1 << (col % WORD_BITS);
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows
            && col < self.cols
            && self.bits[row * self.words_per_row + col / WORD_BITS] & (1 << (col % WORD_BITS)) != 0
    }

    /// Number of set entries.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Set columns of `row`, ascending.
    pub fn row_ones(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.row_words(row)
            .iter()
            .enumerate()
            .flat_map(|(w, &word)| BitIter { word, base: w * WORD_BITS })
    }

    /// Boolean product `self × rhs`. `rhs` must have `self.cols()` rows.
    pub fn multiply(&self, rhs: &BitMatrix) -> BitMatrix {
        debug_assert_eq!(self.cols, rhs.rows);
        let mut out = BitMatrix::zeros(self.rows, rhs.cols);
        for r in 0..self.rows {
            let dst = r * out.words_per_row;
            for j in self.row_ones(r) {
                for (d, &s) in out.bits[dst..dst + out.words_per_row]
                    .iter_mut()
                    .zip(rhs.row_words(j))
                {
                    *d |= s;
                }
            }
        }
        out
    }

    /// `self |= other`, element-wise. Both must have the same shape.
    pub fn or_assign(&mut self, other: &BitMatrix) {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (d, &s) in self.bits.iter_mut().zip(&other.bits) {
            *d |= s;
        }
    }

    /// Keep only column `col`. Equivalent to multiplying by the selector with
    /// the single entry `(col, col)`.
    pub fn retain_column(&mut self, col: usize) {
        let word = col / WORD_BITS;
        let mask = 1u64 << (col % WORD_BITS);
        for r in 0..self.rows {
            for (w, bits) in self.row_words_mut(r).iter_mut().enumerate() {
                *bits = if w == word { *bits & mask } else { 0 };
            }
        }
    }
}

struct BitIter {
    word: u64,
    base: usize,
}

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(self.base + bit)
    }
}

/// Bounded closure of `start` under `adjacency`.
///
/// Row `r` of the result has column `j` set iff node `j` is reachable from the
/// node of start row `r` by a walk whose length lies in `bound`. The first
/// `bound.min` multiplications are plain products (walks of exactly `min`
/// edges); after that each step accumulates `closure |= closure × M` until
/// `bound.max` is reached or the number of set entries stops growing.
///
/// Cancellation is polled before every multiplication. The working matrices
/// are charged to the context's memory budget.
pub fn transitive_hull(
    adjacency: &BitMatrix,
    start: &BitMatrix,
    bound: DistanceBound,
    ctx: &ExecutionContext,
) -> Result<BitMatrix> {
    let _reservation = ctx.budget().reserve(2 * start.memory_usage())?;

    let mut closure = start.clone();
    let mut length = 0usize;

    while length < bound.min {
        ctx.check_cancellation(|| format!("matrix hull, exact phase step {}", length + 1))?;
        closure = closure.multiply(adjacency);
        length += 1;
        if closure.is_zero() {
            return Ok(closure);
        }
    }

    let mut count = closure.count_ones();
    while bound.max.map_or(true, |max| length < max) {
        ctx.check_cancellation(|| format!("matrix hull, accumulation step {}", length + 1))?;
        let next = closure.multiply(adjacency);
        closure.or_assign(&next);
        length += 1;
        let new_count = closure.count_ones();
        if new_count == count {
            break;
        }
        count = new_count;
    }

    tracing::trace!(length, entries = count, "matrix hull converged");
    Ok(closure)
}

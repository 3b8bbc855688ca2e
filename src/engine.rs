use nohash::BuildNoHashHasher;
use std::collections::HashSet;
use tracing::debug;
use tracing::trace;

use crate::error::RelatednessError;
use crate::error::Result;
use crate::flags::SweepOptions;
use crate::matrix::Matrix;
use crate::tables::ForestTables;
use crate::windows::Windows;
use crate::Node;

/// Sweep engine for products of the branch relatedness matrix
/// with a matrix of sample weights.
///
/// The forest is rebuilt edge by edge from left to right.
/// For each node `u` we keep:
///
/// * `w[u]`, the summed weights of all samples currently below `u`,
/// * `x[u]`, the position at which the branch above `u` was last touched,
/// * `v[u]`, value realised on the branch above `u` (and, after an
///   edge event, corrections for value realised above it).
///
/// The contribution of the branch above `u` since `x[u]` is
/// `(time[parent] - time[u]) * (position - x[u]) * w[u]`. It is only
/// realised into `v[u]` when the branch, or a branch below it, changes,
/// or when a window ends. Each edge event therefore costs one walk up
/// from the parent of the edge.
///
/// The output for sample `s` is the sum of `v` over the path from `s`
/// to its root.
#[derive(Debug)]
pub struct RelatednessVector<'f> {
    tables: &'f ForestTables,
    samples: Vec<Node>,
    windows: Windows,
    options: SweepOptions,
    num_weights: usize,
    pub(crate) parent: Vec<Node>,
    pub(crate) x: Vec<f64>,
    pub(crate) w: Vec<f64>,
    pub(crate) v: Vec<f64>,
    pub(crate) position: f64,
    insertion_cursor: usize,
    removal_cursor: usize,
    window_cursor: usize,
    failed: bool,
}

type SampleHash = HashSet<usize, BuildNoHashHasher<usize>>;

fn validate_samples(samples: &[Node], num_nodes: usize) -> Result<()> {
    let mut seen = SampleHash::default();
    for s in samples {
        if s.as_index() >= num_nodes {
            return Err(RelatednessError::invalid_input(format!(
                "sample {s:?} is not one of the {num_nodes} nodes"
            )));
        }
        if !seen.insert(s.as_index()) {
            return Err(RelatednessError::invalid_input(format!(
                "sample {s:?} appears more than once"
            )));
        }
    }
    Ok(())
}

// Constructors
impl<'f> RelatednessVector<'f> {
    pub fn new(
        mut weights: Matrix,
        windows: Windows,
        tables: &'f ForestTables,
        samples: &[Node],
        options: SweepOptions,
    ) -> Result<Self> {
        if weights.nrows() != samples.len() {
            return Err(RelatednessError::invalid_input(format!(
                "weights must have one row per sample: the number of samples is {} but there are {} rows",
                samples.len(),
                weights.nrows()
            )));
        }
        if weights.ncols() == 0 {
            return Err(RelatednessError::invalid_input(
                "weights must have at least one column",
            ));
        }
        validate_samples(samples, tables.num_nodes())?;
        if windows.right(windows.num_windows() - 1) != tables.sequence_length() {
            return Err(RelatednessError::invalid_input(format!(
                "Windows array must end at the sequence length {}",
                tables.sequence_length()
            )));
        }

        if options.centre() {
            weights.centre_columns();
        }

        let num_nodes = tables.num_nodes();
        let num_weights = weights.ncols();
        let mut w = vec![0.0; num_nodes * num_weights];
        for (row, sample) in samples.iter().enumerate() {
            let start = sample.as_index() * num_weights;
            w[start..start + num_weights].copy_from_slice(weights.row(row));
        }

        debug!(
            num_nodes,
            num_edges = tables.num_edges(),
            num_samples = samples.len(),
            num_weights,
            num_windows = windows.num_windows(),
            centre = options.centre(),
            "initialised relatedness sweep"
        );

        Ok(Self {
            tables,
            samples: samples.to_vec(),
            windows,
            options,
            num_weights,
            parent: vec![Node::sentinel(); num_nodes],
            x: vec![0.0; num_nodes],
            w,
            v: vec![0.0; num_nodes * num_weights],
            position: 0.0,
            insertion_cursor: 0,
            removal_cursor: 0,
            window_cursor: 0,
            failed: false,
        })
    }
}

// Lazy accumulation
impl RelatednessVector<'_> {
    pub fn num_weights(&self) -> usize {
        self.num_weights
    }

    pub fn samples(&self) -> &[Node] {
        &self.samples
    }

    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    #[inline(always)]
    pub(crate) fn row(&self, u: Node) -> std::ops::Range<usize> {
        let start = u.as_index() * self.num_weights;
        start..start + self.num_weights
    }

    /// Scalar factor of the pending contribution of the branch above `u`:
    /// branch length times the span since the branch was last touched.
    #[inline]
    pub(crate) fn pending_scale(&self, u: Node) -> f64 {
        match self.parent[u.as_index()].into_option() {
            Some(p) => {
                let time = self.tables.nodes_time();
                (time[p.as_index()] - time[u.as_index()]) * (self.position - self.x[u.as_index()])
            }
            None => 0.0,
        }
    }

    /// Move the pending contribution of the branch above `u` into `v[u]`.
    fn realise(&mut self, u: Node) {
        let scale = self.pending_scale(u);
        if scale != 0.0 {
            let row = self.row(u);
            for (v, &w) in self.v[row.clone()].iter_mut().zip(&self.w[row]) {
                *v += scale * w;
            }
        }
        self.x[u.as_index()] = self.position;
    }

    // sign is -1 for removing edges and +1 for adding them
    fn adjust_path_up(&mut self, parent: Node, child: Node, sign: f64) -> Result<()> {
        let crow = self.row(child);
        let mut cursor = parent;
        while let Some(a) = cursor.into_option() {
            if a == child {
                return Err(RelatednessError::invariant_violation(
                    self.position,
                    format!("edge {parent:?} -> {child:?} would create a cycle"),
                ));
            }
            self.realise(a);
            let arow = self.row(a);
            for k in 0..self.num_weights {
                self.v[crow.start + k] -= sign * self.v[arow.start + k];
                self.w[arow.start + k] += sign * self.w[crow.start + k];
            }
            cursor = self.parent[a.as_index()];
        }
        Ok(())
    }

    pub(crate) fn remove_edge(&mut self, parent: Node, child: Node) -> Result<()> {
        trace!(?parent, ?child, position = self.position, "remove edge");
        if self.parent[child.as_index()] != parent {
            return Err(RelatednessError::invariant_violation(
                self.position,
                format!(
                    "cannot remove edge {parent:?} -> {child:?}: current parent is {:?}",
                    self.parent[child.as_index()].into_option()
                ),
            ));
        }
        self.realise(child);
        self.parent[child.as_index()] = Node::sentinel();
        self.adjust_path_up(parent, child, -1.0)
    }

    pub(crate) fn insert_edge(&mut self, parent: Node, child: Node) -> Result<()> {
        trace!(?parent, ?child, position = self.position, "insert edge");
        if let Some(existing) = self.parent[child.as_index()].into_option() {
            return Err(RelatednessError::invariant_violation(
                self.position,
                format!(
                    "contradictory edges: cannot insert {parent:?} -> {child:?} over {existing:?} -> {child:?}"
                ),
            ));
        }
        self.adjust_path_up(parent, child, 1.0)?;
        self.x[child.as_index()] = self.position;
        self.parent[child.as_index()] = parent;
        Ok(())
    }

    fn check_parent_is_current(&self, parent: Node) -> Result<()> {
        let p = parent.as_index();
        let consistent = self.parent[p].is_sentinel() || self.x[p] == self.position;
        debug_assert!(consistent);
        if !consistent && self.options.internal_checks() {
            return Err(RelatednessError::invariant_violation(
                self.position,
                format!("{parent:?} was last updated at {}", self.x[p]),
            ));
        }
        Ok(())
    }

    fn check_positions(&self) -> Result<()> {
        match self.x.iter().position(|&x| x > self.position) {
            Some(u) => Err(RelatednessError::invariant_violation(
                self.position,
                format!("Node({u}) was updated at {}, ahead of the sweep", self.x[u]),
            )),
            None => Ok(()),
        }
    }

    /// Realise everything on the paths from the samples to their roots,
    /// sum it per sample, and reset `v` for the next window.
    fn flush_window(&mut self) -> Matrix {
        let mut out = Matrix::zeros(self.samples.len(), self.num_weights);
        for j in 0..self.samples.len() {
            let mut cursor = self.samples[j];
            while let Some(u) = cursor.into_option() {
                if self.x[u.as_index()] != self.position {
                    self.realise(u);
                }
                let row = self.row(u);
                for (o, &v) in out.row_mut(j).iter_mut().zip(&self.v[row]) {
                    *o += v;
                }
                cursor = self.parent[u.as_index()];
            }
        }
        self.v.iter_mut().for_each(|v| *v = 0.0);
        if self.options.centre() {
            out.centre_columns();
        }
        out
    }
}

// The sweep
impl RelatednessVector<'_> {
    fn fail(&mut self, e: RelatednessError) -> Option<Result<Matrix>> {
        self.failed = true;
        Some(Err(e))
    }

    /// Sweep forward until the next window is complete.
    ///
    /// Returns `None` once every window has been produced,
    /// or after an error.
    pub fn next_window(&mut self) -> Option<Result<Matrix>> {
        if self.failed {
            return None;
        }
        let tables = self.tables;
        let edges = tables.edges();
        let insertion = tables.insertion_order();
        let removal = tables.removal_order();
        let num_edges = edges.len();
        let num_windows = self.windows.num_windows();

        while self.window_cursor < num_windows
            && self.removal_cursor < num_edges
            && self.position <= tables.sequence_length()
        {
            while self.removal_cursor < num_edges
                && edges.right(removal[self.removal_cursor]) == self.position
            {
                let e = removal[self.removal_cursor];
                if let Err(err) = self.remove_edge(edges.parent(e), edges.child(e)) {
                    return self.fail(err);
                }
                self.removal_cursor += 1;
            }
            while self.insertion_cursor < num_edges
                && edges.left(insertion[self.insertion_cursor]) == self.position
            {
                let e = insertion[self.insertion_cursor];
                let parent = edges.parent(e);
                if let Err(err) = self
                    .insert_edge(parent, edges.child(e))
                    .and_then(|_| self.check_parent_is_current(parent))
                {
                    return self.fail(err);
                }
                self.insertion_cursor += 1;
            }
            let window_right = self.windows.right(self.window_cursor);
            let mut right = window_right;
            if self.insertion_cursor < num_edges {
                right = right.min(edges.left(insertion[self.insertion_cursor]));
            }
            if self.removal_cursor < num_edges {
                right = right.min(edges.right(removal[self.removal_cursor]));
            }
            self.position = right;
            if self.position == window_right {
                if self.options.internal_checks() {
                    if let Err(err) = self.check_positions() {
                        return self.fail(err);
                    }
                }
                let out = self.flush_window();
                debug!(
                    window = self.window_cursor,
                    position = self.position,
                    "flushed window"
                );
                self.window_cursor += 1;
                return Some(Ok(out));
            }
        }

        // No edges remain, so nothing is left to accumulate.
        if self.window_cursor < num_windows {
            self.window_cursor += 1;
            return Some(Ok(Matrix::zeros(self.samples.len(), self.num_weights)));
        }
        None
    }

    /// Run the sweep to completion: one matrix per window,
    /// each with one row per sample and one column per weight vector.
    pub fn run(self) -> Result<Vec<Matrix>> {
        self.collect()
    }
}

impl Iterator for RelatednessVector<'_> {
    type Item = Result<Matrix>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_window()
    }
}

impl std::iter::FusedIterator for RelatednessVector<'_> {}

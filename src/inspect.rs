//! Read-only views of a sweep in progress.
//!
//! Nothing here is used by the sweep itself.

use std::fmt;

use crate::engine::RelatednessVector;
use crate::matrix::Matrix;
use crate::Node;

impl RelatednessVector<'_> {
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current parent of `u`, if any.
    pub fn parent(&self, u: Node) -> Option<Node> {
        self.parent[u.as_index()].into_option()
    }

    /// Contribution of the branch above `u` accrued since the
    /// branch was last touched and not yet realised.
    pub fn pending_contribution(&self, u: Node) -> Vec<f64> {
        let scale = self.pending_scale(u);
        self.w[self.row(u)].iter().map(|&w| scale * w).collect()
    }

    /// Most recent common ancestor of `a` and `b` in the current forest.
    pub fn mrca(&self, a: Node, b: Node) -> Option<Node> {
        let mut path = vec![];
        let mut cursor = a;
        while let Some(u) = cursor.into_option() {
            path.push(u);
            cursor = self.parent[u.as_index()];
        }
        let mut cursor = b;
        while let Some(u) = cursor.into_option() {
            if path.contains(&u) {
                return Some(u);
            }
            cursor = self.parent[u.as_index()];
        }
        None
    }

    /// What the current window would output if it ended here,
    /// before any centring.
    pub fn current_state(&self) -> Matrix {
        let mut out = Matrix::zeros(self.samples().len(), self.num_weights());
        for (j, &sample) in self.samples().iter().enumerate() {
            let mut cursor = sample;
            while let Some(u) = cursor.into_option() {
                let scale = self.pending_scale(u);
                let row = self.row(u);
                for ((o, &v), &w) in out
                    .row_mut(j)
                    .iter_mut()
                    .zip(&self.v[row.clone()])
                    .zip(&self.w[row])
                {
                    *o += v + scale * w;
                }
                cursor = self.parent[u.as_index()];
            }
        }
        out
    }

    pub fn state_table(&self) -> StateTable<'_, '_> {
        StateTable { engine: self }
    }
}

/// Per-node dump of the sweep state.
pub struct StateTable<'e, 'f> {
    engine: &'e RelatednessVector<'f>,
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for StateTable<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.engine;
        writeln!(f, "position = {}", e.position)?;
        writeln!(
            f,
            "{:<6}{:>8}\t{:>8}\t{}\t{}\t{}",
            "node", "parent", "x", "value", "weight", "pending"
        )?;
        for u in 0..e.parent.len() {
            let node = Node(u);
            let parent = match e.parent(node) {
                Some(p) => p.as_index().to_string(),
                None => "-".to_string(),
            };
            let row = e.row(node);
            writeln!(
                f,
                "{:<6}{:>8}\t{:>8.2}\t{}\t{}\t{}",
                u,
                parent,
                e.x[u],
                join(&e.v[row.clone()]),
                join(&e.w[row]),
                join(&e.pending_contribution(node)),
            )?;
        }
        Ok(())
    }
}

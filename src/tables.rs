use std::cmp::Ordering;

use crate::error::RelatednessError;
use crate::error::Result;
use crate::flags::NodeFlags;
use crate::Node;

/// Edge table stored by column.
///
/// Edge `e` says that `parent[e]` is the parent of `child[e]`
/// over the half-open interval `[left[e], right[e])`.
#[derive(Default, Debug, Clone)]
pub struct EdgeTable {
    left: Vec<f64>,
    right: Vec<f64>,
    parent: Vec<Node>,
    child: Vec<Node>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub left: f64,
    pub right: f64,
    pub parent: Node,
    pub child: Node,
}

impl EdgeTable {
    pub fn new(left: Vec<f64>, right: Vec<f64>, parent: Vec<Node>, child: Vec<Node>) -> Result<Self> {
        let n = left.len();
        if right.len() != n || parent.len() != n || child.len() != n {
            return Err(RelatednessError::invalid_input(format!(
                "edge columns differ in length: left {}, right {}, parent {}, child {}",
                n,
                right.len(),
                parent.len(),
                child.len()
            )));
        }
        Ok(Self {
            left,
            right,
            parent,
            child,
        })
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.left.len(), self.right.len());
        debug_assert_eq!(self.left.len(), self.parent.len());
        debug_assert_eq!(self.left.len(), self.child.len());
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, edge: Edge) {
        self.left.push(edge.left);
        self.right.push(edge.right);
        self.parent.push(edge.parent);
        self.child.push(edge.child);
    }

    #[inline]
    pub fn left(&self, e: usize) -> f64 {
        self.left[e]
    }

    #[inline]
    pub fn right(&self, e: usize) -> f64 {
        self.right[e]
    }

    #[inline]
    pub fn parent(&self, e: usize) -> Node {
        self.parent[e]
    }

    #[inline]
    pub fn child(&self, e: usize) -> Node {
        self.child[e]
    }

    pub fn edge(&self, e: usize) -> Edge {
        Edge {
            left: self.left[e],
            right: self.right[e],
            parent: self.parent[e],
            child: self.child[e],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.len()).map(|e| self.edge(e))
    }
}

/// The two sort orders that drive a sweep.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EdgeIndexes {
    insertion: Vec<usize>,
    removal: Vec<usize>,
}

impl EdgeIndexes {
    /// Take precomputed orders as given.
    /// They are trusted to be consistent with the edge table.
    pub fn new(insertion: Vec<usize>, removal: Vec<usize>) -> Result<Self> {
        if insertion.len() != removal.len() {
            return Err(RelatednessError::invalid_input(format!(
                "insertion order has {} entries but removal order has {}",
                insertion.len(),
                removal.len()
            )));
        }
        Ok(Self { insertion, removal })
    }

    /// Insertion order sorts by (left, parent time, parent, child).
    /// Removal order sorts by (right, -parent time, -parent, -child).
    /// These are the orders tskit builds for its tree sequences.
    pub fn build(edges: &EdgeTable, nodes_time: &[f64]) -> Self {
        let time = |e: usize| nodes_time[edges.parent(e).as_index()];
        let mut insertion = (0..edges.len()).collect::<Vec<_>>();
        insertion.sort_by(|&a, &b| {
            edges
                .left(a)
                .total_cmp(&edges.left(b))
                .then_with(|| time(a).total_cmp(&time(b)))
                .then_with(|| edges.parent(a).cmp(&edges.parent(b)))
                .then_with(|| edges.child(a).cmp(&edges.child(b)))
        });
        let mut removal = (0..edges.len()).collect::<Vec<_>>();
        removal.sort_by(|&a, &b| {
            edges
                .right(a)
                .total_cmp(&edges.right(b))
                .then_with(|| time(b).total_cmp(&time(a)))
                .then_with(|| edges.parent(b).cmp(&edges.parent(a)))
                .then_with(|| edges.child(b).cmp(&edges.child(a)))
        });
        Self { insertion, removal }
    }

    pub fn insertion(&self) -> &[usize] {
        &self.insertion
    }

    pub fn removal(&self) -> &[usize] {
        &self.removal
    }
}

/// Everything a sweep reads about the forest.
#[derive(Debug, Clone)]
pub struct ForestTables {
    nodes_time: Vec<f64>,
    nodes_flags: Vec<NodeFlags>,
    edges: EdgeTable,
    indexes: EdgeIndexes,
    sequence_length: f64,
}

impl ForestTables {
    /// Assemble tables from precomputed parts.
    ///
    /// Only structural checks are made: lengths, and that every
    /// index refers to an existing edge or node. The edge orders
    /// are trusted to be sorted and consistent with the edges.
    pub fn from_parts(
        nodes_time: Vec<f64>,
        edges: EdgeTable,
        indexes: EdgeIndexes,
        sequence_length: f64,
    ) -> Result<Self> {
        // NaN fails this comparison too
        if !(sequence_length > 0.0) {
            return Err(RelatednessError::invalid_input(format!(
                "sequence length must be positive, got {sequence_length}"
            )));
        }
        let num_edges = edges.len();
        if indexes.insertion.len() != num_edges {
            return Err(RelatednessError::invalid_input(format!(
                "edge indexes cover {} edges but the table has {num_edges}",
                indexes.insertion.len()
            )));
        }
        if let Some(&e) = indexes
            .insertion
            .iter()
            .chain(indexes.removal.iter())
            .find(|&&e| e >= num_edges)
        {
            return Err(RelatednessError::invalid_input(format!(
                "edge index {e} out of range for {num_edges} edges"
            )));
        }
        let num_nodes = nodes_time.len();
        if let Some(node) = edges
            .parent
            .iter()
            .chain(edges.child.iter())
            .find(|n| n.as_index() >= num_nodes)
        {
            return Err(RelatednessError::invalid_input(format!(
                "edge refers to {node:?} but there are {num_nodes} nodes"
            )));
        }
        let nodes_flags = vec![NodeFlags::default(); num_nodes];
        Ok(Self {
            nodes_time,
            nodes_flags,
            edges,
            indexes,
            sequence_length,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes_time.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes_time(&self) -> &[f64] {
        &self.nodes_time
    }

    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    pub fn insertion_order(&self) -> &[usize] {
        &self.indexes.insertion
    }

    pub fn removal_order(&self) -> &[usize] {
        &self.indexes.removal
    }

    pub fn sequence_length(&self) -> f64 {
        self.sequence_length
    }

    /// Nodes flagged as samples, in node order.
    pub fn samples(&self) -> Vec<Node> {
        self.nodes_flags
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_sample())
            .map(|(i, _)| Node(i))
            .collect()
    }
}

/// Collects nodes and edges, then checks and indexes them.
#[derive(Debug)]
pub struct TablesBuilder {
    sequence_length: f64,
    nodes_time: Vec<f64>,
    nodes_flags: Vec<NodeFlags>,
    edges: EdgeTable,
}

impl TablesBuilder {
    pub fn new(sequence_length: f64) -> Self {
        Self {
            sequence_length,
            nodes_time: vec![],
            nodes_flags: vec![],
            edges: EdgeTable::default(),
        }
    }

    pub fn add_node(&mut self, time: f64, flags: NodeFlags) -> Node {
        self.nodes_time.push(time);
        self.nodes_flags.push(flags);
        Node(self.nodes_time.len() - 1)
    }

    pub fn add_edge(&mut self, left: f64, right: f64, parent: Node, child: Node) {
        self.edges.push(Edge {
            left,
            right,
            parent,
            child,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes_time.len()
    }

    fn check_integrity(&self) -> Result<()> {
        if let Some(t) = self.nodes_time.iter().find(|t| !t.is_finite()) {
            return Err(RelatednessError::invalid_input(format!(
                "node times must be finite, got {t}"
            )));
        }
        let num_nodes = self.nodes_time.len();
        for (e, edge) in self.edges.iter().enumerate() {
            if !(edge.left >= 0.0 && edge.left < edge.right && edge.right <= self.sequence_length) {
                return Err(RelatednessError::invalid_input(format!(
                    "edge {e} has bad interval [{}, {}) for sequence length {}",
                    edge.left, edge.right, self.sequence_length
                )));
            }
            for node in [edge.parent, edge.child] {
                if node.as_index() >= num_nodes {
                    return Err(RelatednessError::invalid_input(format!(
                        "edge {e} refers to {node:?} but there are {num_nodes} nodes"
                    )));
                }
            }
            let tp = self.nodes_time[edge.parent.as_index()];
            let tc = self.nodes_time[edge.child.as_index()];
            if tp.partial_cmp(&tc) != Some(Ordering::Greater) {
                return Err(RelatednessError::invalid_input(format!(
                    "edge {e}: parent time {tp} must be greater than child time {tc}"
                )));
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<ForestTables> {
        self.check_integrity()?;
        let indexes = EdgeIndexes::build(&self.edges, &self.nodes_time);
        let mut tables =
            ForestTables::from_parts(self.nodes_time, self.edges, indexes, self.sequence_length)?;
        tables.nodes_flags = self.nodes_flags;
        Ok(tables)
    }
}

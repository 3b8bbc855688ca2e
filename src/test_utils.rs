// Fixtures and a brute-force relatedness matrix for checking the sweep.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::flags::NodeFlags;
use crate::matrix::Matrix;
use crate::tables::ForestTables;
use crate::tables::TablesBuilder;
use crate::Node;

/// Binary tree over `num_leaves` samples with unit branch lengths
/// between levels. Leaves are nodes `0..num_leaves`, internal nodes
/// are numbered level by level.
pub fn balanced_tree(num_leaves: usize, sequence_length: f64) -> ForestTables {
    let mut b = TablesBuilder::new(sequence_length);
    let mut times = vec![];
    let mut level = (0..num_leaves)
        .map(|_| {
            times.push(0.0);
            b.add_node(0.0, NodeFlags::sample())
        })
        .collect::<Vec<_>>();
    while level.len() > 1 {
        let mut next = vec![];
        for pair in level.chunks(2) {
            if pair.len() == 1 {
                next.push(pair[0]);
                continue;
            }
            let time = pair
                .iter()
                .map(|n| times[n.as_index()])
                .fold(f64::MIN, f64::max)
                + 1.0;
            let parent = b.add_node(time, NodeFlags::default());
            times.push(time);
            for &child in pair {
                b.add_edge(0.0, sequence_length, parent, child);
            }
            next.push(parent);
        }
        level = next;
    }
    b.build().unwrap()
}

/// Haploid Wright-Fisher pedigree with one crossover per birth
/// and no simplification. The last generation are the samples.
pub fn wright_fisher(
    seed: u64,
    popsize: usize,
    num_generations: usize,
    genome_length: i64,
) -> ForestTables {
    assert!(genome_length > 1);
    let mut rng = StdRng::seed_from_u64(seed);
    let length = genome_length as f64;
    let mut b = TablesBuilder::new(length);
    let mut parents = (0..popsize)
        .map(|_| b.add_node(num_generations as f64, NodeFlags::default()))
        .collect::<Vec<_>>();
    for generation in 1..=num_generations {
        let time = (num_generations - generation) as f64;
        let flags = if generation == num_generations {
            NodeFlags::sample()
        } else {
            NodeFlags::default()
        };
        let mut children = vec![];
        for _ in 0..popsize {
            let child = b.add_node(time, flags);
            let left_parent = parents[rng.gen_range(0..popsize)];
            let right_parent = parents[rng.gen_range(0..popsize)];
            let breakpoint = rng.gen_range(1..genome_length) as f64;
            b.add_edge(0.0, breakpoint, left_parent, child);
            b.add_edge(breakpoint, length, right_parent, child);
            children.push(child);
        }
        parents = children;
    }
    b.build().unwrap()
}

/// Copy of `tables` as a builder, so that more topology can be added.
pub fn builder_from(tables: &ForestTables) -> TablesBuilder {
    let samples = tables.samples();
    let mut b = TablesBuilder::new(tables.sequence_length());
    for (u, &time) in tables.nodes_time().iter().enumerate() {
        let flags = if samples.contains(&Node(u)) {
            NodeFlags::sample()
        } else {
            NodeFlags::default()
        };
        b.add_node(time, flags);
    }
    for e in tables.edges().iter() {
        b.add_edge(e.left, e.right, e.parent, e.child);
    }
    b
}

/// Give each node in `attach_to` a non-sample child spanning the
/// whole sequence.
pub fn with_dangling_children(tables: &ForestTables, attach_to: &[Node]) -> ForestTables {
    let mut b = builder_from(tables);
    let min_time = tables
        .nodes_time()
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    for &parent in attach_to {
        let child = b.add_node(min_time - 1.0, NodeFlags::default());
        b.add_edge(0.0, tables.sequence_length(), parent, child);
    }
    b.build().unwrap()
}

pub fn random_weights(rng: &mut StdRng, num_samples: usize, num_columns: usize) -> Matrix {
    if num_samples == 0 {
        return Matrix::zeros(0, num_columns);
    }
    let rows = (0..num_samples)
        .map(|_| {
            (0..num_columns)
                .map(|_| rng.gen_range(-10..=10) as f64)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    Matrix::from_rows(&rows).unwrap()
}

/// The relatedness matrix of each window, built tree by tree.
///
/// Entry `(i, j)` is the area of the branches ancestral to both
/// `samples[i]` and `samples[j]`.
pub fn explicit_relatedness(
    tables: &ForestTables,
    samples: &[Node],
    windows: &[f64],
) -> Vec<Matrix> {
    let n = samples.len();
    let num_nodes = tables.num_nodes();
    let time = tables.nodes_time();
    let mut rv = vec![Matrix::zeros(n, n); windows.len() - 1];

    let mut breaks = windows.to_vec();
    for e in tables.edges().iter() {
        breaks.push(e.left);
        breaks.push(e.right);
    }
    breaks.sort_by(|a, b| a.total_cmp(b));
    breaks.dedup();

    for interval in breaks.windows(2) {
        let (left, right) = (interval[0], interval[1]);
        let mut parent = vec![None; num_nodes];
        for e in tables.edges().iter() {
            if e.left <= left && e.right >= right {
                parent[e.child.as_index()] = Some(e.parent);
            }
        }
        let branch_length = |u: usize| match parent[u] {
            Some(p) => time[p.as_index()] - time[u],
            None => 0.0,
        };
        let on_path = samples
            .iter()
            .map(|&s| {
                let mut marks = vec![false; num_nodes];
                let mut cursor = Some(s);
                while let Some(u) = cursor {
                    marks[u.as_index()] = true;
                    cursor = parent[u.as_index()];
                }
                marks
            })
            .collect::<Vec<_>>();
        let window = windows.iter().rposition(|&w| w <= left).unwrap();
        let sigma = &mut rv[window];
        for i in 0..n {
            for j in 0..n {
                let shared = (0..num_nodes)
                    .filter(|&u| on_path[i][u] && on_path[j][u])
                    .map(branch_length)
                    .sum::<f64>();
                sigma.row_mut(i)[j] += (right - left) * shared;
            }
        }
    }
    rv
}

/// `C * sigma * C` where `C` is the centring matrix.
pub fn centre_relatedness(sigma: &Matrix) -> Matrix {
    let mut rv = sigma.clone();
    rv.centre_columns();
    let mut t = transpose(&rv);
    t.centre_columns();
    transpose(&t)
}

pub fn transpose(a: &Matrix) -> Matrix {
    let rows = (0..a.ncols()).map(|j| a.column(j)).collect::<Vec<_>>();
    if rows.is_empty() {
        return Matrix::zeros(0, a.nrows());
    }
    Matrix::from_rows(&rows).unwrap()
}

pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.ncols(), b.nrows());
    let mut rv = Matrix::zeros(a.nrows(), b.ncols());
    for i in 0..a.nrows() {
        for k in 0..a.ncols() {
            let aik = a.get(i, k);
            for j in 0..b.ncols() {
                rv.row_mut(i)[j] += aik * b.get(k, j);
            }
        }
    }
    rv
}

/// Explicit relatedness matrix times weights, per window.
pub fn expected_products(
    tables: &ForestTables,
    samples: &[Node],
    weights: &Matrix,
    windows: &[f64],
    centre: bool,
) -> Vec<Matrix> {
    explicit_relatedness(tables, samples, windows)
        .iter()
        .map(|sigma| {
            if centre {
                matmul(&centre_relatedness(sigma), weights)
            } else {
                matmul(sigma, weights)
            }
        })
        .collect()
}

pub fn assert_close(a: &Matrix, b: &Matrix) {
    assert_eq!(a.nrows(), b.nrows());
    assert_eq!(a.ncols(), b.ncols());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert!(
            (x - y).abs() <= 1e-9 * (1.0 + y.abs()),
            "{x} != {y}\nleft: {a:?}\nright: {b:?}"
        );
    }
}

pub fn assert_all_close(a: &[Matrix], b: &[Matrix]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_close(x, y)
    }
}

pub fn scale(a: &Matrix, factor: f64) -> Matrix {
    let rows = (0..a.nrows())
        .map(|i| a.row(i).iter().map(|x| x * factor).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    Matrix::from_rows(&rows).unwrap()
}

/// Columns of `a` followed by columns of `b`.
pub fn hcat(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.nrows(), b.nrows());
    let rows = (0..a.nrows())
        .map(|i| {
            let mut row = a.row(i).to_vec();
            row.extend_from_slice(b.row(i));
            row
        })
        .collect::<Vec<_>>();
    Matrix::from_rows(&rows).unwrap()
}

#[test]
fn test_balanced_tree_layout() {
    let tables = balanced_tree(4, 1.0);
    assert_eq!(tables.num_nodes(), 7);
    assert_eq!(tables.samples(), (0..4).map(Node).collect::<Vec<_>>());
    assert_eq!(tables.nodes_time(), &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 2.0]);
    let mut edges = tables
        .edges()
        .iter()
        .map(|e| (e.parent.as_index(), e.child.as_index()))
        .collect::<Vec<_>>();
    edges.sort();
    assert_eq!(edges, vec![(4, 0), (4, 1), (5, 2), (5, 3), (6, 4), (6, 5)]);
}

#[test]
fn test_explicit_relatedness_of_balanced_tree() {
    let tables = balanced_tree(4, 1.0);
    let sigma = explicit_relatedness(&tables, &tables.samples(), &[0.0, 1.0]);
    let expected = Matrix::from_rows(&[
        [2.0, 1.0, 0.0, 0.0],
        [1.0, 2.0, 0.0, 0.0],
        [0.0, 0.0, 2.0, 1.0],
        [0.0, 0.0, 1.0, 2.0],
    ])
    .unwrap();
    assert_eq!(sigma, vec![expected]);
}

#[test]
fn test_centred_relatedness_sums_to_zero() {
    let tables = wright_fisher(1, 4, 4, 50);
    let samples = tables.samples();
    let sigma = explicit_relatedness(&tables, &samples, &[0.0, 50.0]);
    let c = centre_relatedness(&sigma[0]);
    for m in [c.column_means(), transpose(&c).column_means()] {
        assert!(m.iter().all(|x| x.abs() < 1e-9));
    }
}

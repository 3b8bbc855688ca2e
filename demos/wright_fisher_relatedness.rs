use rand::Rng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use branch_relatedness::windowed_relatedness_vector;
use branch_relatedness::ForestTables;
use branch_relatedness::Matrix;
use branch_relatedness::NodeFlags;
use branch_relatedness::SweepOptions;
use branch_relatedness::TablesBuilder;

// Standard WF with exactly 1 crossover per birth.
// Nothing is simplified, so every ancestor stays in the tables.
fn haploid_wf(popsize: usize, ngenerations: usize, genome_length: i64, seed: u64) -> ForestTables {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let sample_parent = rand::distributions::Uniform::new(0, popsize);
    let sample_breakpoint = rand::distributions::Uniform::new(1, genome_length);

    let mut tables = TablesBuilder::new(genome_length as f64);
    let mut parents = vec![];
    for _ in 0..popsize {
        parents.push(tables.add_node(ngenerations as f64, NodeFlags::default()));
    }
    let mut children = vec![];

    for generation in 1..=ngenerations {
        let flags = if generation == ngenerations {
            NodeFlags::sample()
        } else {
            NodeFlags::default()
        };
        for _ in 0..popsize {
            let child = tables.add_node((ngenerations - generation) as f64, flags);
            children.push(child);
            let left_parent = parents[rng.sample(sample_parent)];
            let right_parent = parents[rng.sample(sample_parent)];
            let breakpoint = rng.sample(sample_breakpoint) as f64;
            tables.add_edge(0.0, breakpoint, left_parent, child);
            tables.add_edge(breakpoint, genome_length as f64, right_parent, child);
        }
        std::mem::swap(&mut parents, &mut children);
        children.clear();
    }

    match tables.build() {
        Ok(tables) => tables,
        Err(e) => panic!("simulation produced bad tables: {e}"),
    }
}

pub fn main() -> branch_relatedness::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let genome_length = 100_000;
    let tables = haploid_wf(50, 200, genome_length, 213512);
    let samples = tables.samples();

    let mut rng = rand::rngs::StdRng::seed_from_u64(54321);
    let rows = samples
        .iter()
        .map(|_| vec![rng.gen::<f64>(), 1.0])
        .collect::<Vec<_>>();
    let weights = Matrix::from_rows(&rows)?;

    let windows = (0..=4)
        .map(|i| (genome_length * i / 4) as f64)
        .collect::<Vec<_>>();
    let out = windowed_relatedness_vector(
        &tables,
        &samples,
        weights,
        &windows,
        SweepOptions::default().with_centre(),
    )?;

    println!(
        "{} nodes, {} edges, {} samples",
        tables.num_nodes(),
        tables.num_edges(),
        samples.len()
    );
    for (w, m) in out.iter().enumerate() {
        let first = m.row(0);
        println!(
            "window [{}, {}): sample 0 -> {:.3}, {:.3}",
            windows[w],
            windows[w + 1],
            first[0],
            first[1]
        );
    }
    Ok(())
}

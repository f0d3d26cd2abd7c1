use criterion::Criterion;

use polyneat::activation::steep_sigmoid;
use polyneat::config::GenomeConfig;
use polyneat::innovation::{ConnectionInnovation, NodeInnovation};
use polyneat::random::seeded_rng;
use polyneat::types::Value;
use polyneat::Genome;

fn xor_genome() -> Genome {
    let mut conn_innov = ConnectionInnovation::default();
    let mut node_innov = NodeInnovation::default();
    let mut rng = seeded_rng(0xC0FFEE);
    Genome::new(
        &[1],
        &[2],
        &[1],
        &[],
        &[Value::F32(1.0)],
        vec![Value::F32(0.0)],
        vec![vec![vec![steep_sigmoid()]]],
        0,
        &GenomeConfig::default(),
        &mut conn_innov,
        &mut node_innov,
        &mut rng,
    )
    .unwrap()
}

fn bench_mutate(bench: &mut Criterion) {
    let genome = xor_genome();
    let cfg = GenomeConfig::default();
    let mut conn_innov = ConnectionInnovation::new(10_000);
    let mut node_innov = NodeInnovation::new(10_000);
    let mut rng = seeded_rng(1);

    bench.bench_function("mutate", |b| {
        b.iter(|| genome.clone().mutate(&cfg, &mut conn_innov, &mut node_innov, &mut rng))
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default().sample_size(2000).significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_mutate(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default().configure_from_args().final_summary();
}

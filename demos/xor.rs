//! XOR: the canonical single-type NEAT benchmark. Two boolean inputs, one boolean-ish output,
//! fitness is `4.0` minus the total absolute error across the four input pairs.

use approx::relative_eq;

use polyneat::activation::steep_sigmoid;
use polyneat::config::{GenomeConfig, PopulationConfig};
use polyneat::random::seeded_rng;
use polyneat::types::Value;
use polyneat::Population;

const TARGET_FITNESS: f64 = 3.95;
const MAX_GENERATIONS: u32 = 50;

fn xor_fitness(pop: &mut Population, genome_id: usize) -> f64 {
    let pairs: [([f32; 2], f32); 4] = [([0., 0.], 0.), ([1., 1.], 0.), ([1., 0.], 1.), ([0., 1.], 1.)];

    let mut fitness = 4.0;
    for (inputs, want) in pairs {
        pop.reset_memory(genome_id);
        pop.load_inputs(genome_id, &[Value::F32(inputs[0]), Value::F32(inputs[1])]);
        pop.run(genome_id);
        let Value::F32(got) = pop.output(genome_id, 0) else {
            panic!("xor output node should carry F32");
        };
        fitness -= (want - got).abs() as f64;
    }
    fitness
}

fn main() {
    let genome_cfg = GenomeConfig::default();
    let population_cfg = PopulationConfig::default();
    let mut rng = seeded_rng(0xC0FFEE);

    let mut pop = Population::new(
        vec![1],
        vec![2],
        vec![1],
        vec![Value::F32(1.0)],
        vec![Value::F32(0.0)],
        vec![vec![vec![steep_sigmoid()]]],
        0,
        genome_cfg,
        population_cfg,
        &mut rng,
    )
    .expect("xor schema is well-formed");

    for generation in 0..MAX_GENERATIONS {
        for genome_id in 0..pop.genomes.len() {
            let fitness = xor_fitness(&mut pop, genome_id);
            pop.set_fitness(genome_id, fitness);
        }

        pop.speciate(&mut rng);

        let fittest = pop.fittest_genome_id.map(|id| pop.genomes[id].fitness).unwrap_or(0.0);
        println!("generation {generation}: fittest={fittest:.4} species={}", pop.species.len());

        if fittest >= TARGET_FITNESS || relative_eq!(fittest, 4.0, epsilon = 1e-6) {
            println!("target met in generation {generation}: {fittest:.4}");
            return;
        }

        pop.build_next_gen(&mut rng).expect("mutation schema stays well-formed");
    }

    println!("target not met within {MAX_GENERATIONS} generations");
}

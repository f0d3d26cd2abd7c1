//! The global population loop: speciation, fitness accounting, and reproduction.

use fxhash::FxHashSet;
use rand::{Rng, RngCore};

use crate::config::{GenomeConfig, PopulationConfig};
use crate::crossover::{delta, keyed_connections};
use crate::error::ConfigError;
use crate::genome::{ActivationTable, Genome};
use crate::innovation::InnovationRegistry;
use crate::reproduce::{crossover_child, select_parent};
use crate::specie::Specie;
use crate::types::Value;

/// A generation of genomes, partitioned into species, with the registries and schema needed to
/// produce the next generation from it.
#[derive(Clone)]
pub struct Population {
    pub generation: u32,
    pub avg_fitness_adjusted: f64,
    pub pop_size: usize,
    pub speciation_thresh: f64,
    pub genomes: Vec<Genome>,
    pub species: Vec<Specie>,
    pub registry: InnovationRegistry,
    pub fittest_genome_id: Option<usize>,
    genome_cfg: GenomeConfig,
    population_cfg: PopulationConfig,
    activation_fns: ActivationTable,
    bias_sch: Vec<usize>,
    inputs_sch: Vec<usize>,
    outputs_sch: Vec<usize>,
    bias_init: Vec<Value>,
    reset_values: Vec<Value>,
    rec_max: u32,
    next_species_id: u32,
}

impl Population {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bias_sch: Vec<usize>,
        inputs_sch: Vec<usize>,
        outputs_sch: Vec<usize>,
        bias_init: Vec<Value>,
        reset_values: Vec<Value>,
        activation_fns: ActivationTable,
        rec_max: u32,
        genome_cfg: GenomeConfig,
        population_cfg: PopulationConfig,
        rng: &mut impl RngCore,
    ) -> Result<Self, ConfigError> {
        let mut registry = InnovationRegistry::default();
        let pop_size = population_cfg.pop_size as usize;
        let mut genomes = Vec::with_capacity(pop_size);
        for _ in 0..pop_size {
            genomes.push(Genome::new(
                &bias_sch,
                &inputs_sch,
                &outputs_sch,
                &[],
                &bias_init,
                reset_values.clone(),
                activation_fns.clone(),
                rec_max,
                &genome_cfg,
                &mut registry.connections,
                &mut registry.nodes,
                rng,
            )?);
        }

        Ok(Self {
            generation: 0,
            avg_fitness_adjusted: 0.0,
            pop_size,
            speciation_thresh: population_cfg.speciation_thresh_init,
            genomes,
            species: Vec::new(),
            registry,
            fittest_genome_id: None,
            genome_cfg,
            population_cfg,
            activation_fns,
            bias_sch,
            inputs_sch,
            outputs_sch,
            bias_init,
            reset_values,
            rec_max,
            next_species_id: 0,
        })
    }

    pub fn load_input(&mut self, genome_id: usize, input_id: usize, value: Value) {
        self.genomes[genome_id].load_input(value, input_id);
    }

    pub fn load_inputs(&mut self, genome_id: usize, inputs: &[Value]) {
        self.genomes[genome_id].load_inputs(inputs);
    }

    pub fn run(&mut self, genome_id: usize) {
        self.genomes[genome_id].run_network();
    }

    pub fn output(&self, genome_id: usize, output_id: usize) -> Value {
        self.genomes[genome_id].output(output_id)
    }

    pub fn outputs(&self, genome_id: usize) -> Vec<Value> {
        self.genomes[genome_id].outputs()
    }

    pub fn set_fitness(&mut self, genome_id: usize, fitness: f64) {
        self.genomes[genome_id].fitness = fitness;
    }

    /// Clear a genome's recurrent history between independent rollouts.
    pub fn reset_memory(&mut self, genome_id: usize) {
        self.genomes[genome_id].prev_outputs = crate::buffer::CircularBuffer::new(self.rec_max as usize);
    }

    /// Evaluate every genome's fitness in parallel via `rayon`, as a convenience alternative to
    /// driving [`crate::threadpool::ThreadPool`] by hand. `f` must only read the genome it's
    /// given; each genome's recurrency buffer and node scratch state belongs to one worker.
    #[cfg(feature = "parallel")]
    pub fn evaluate_with(&mut self, f: impl Fn(&Genome) -> f64 + Sync) {
        crate::threadpool::parallel::evaluate_all(&mut self.genomes, f);
    }

    /// Partition the current genomes into species, adapt the speciation threshold toward the
    /// target band, and refresh fitness accounting.
    ///
    /// Each surviving, non-dead species samples one random existing member as this round's
    /// compatibility representative, then every other genome is walked against the existing
    /// species in order, joining the first whose representative it's within `speciation_thresh`
    /// of, or founding a new species otherwise.
    pub fn speciate(&mut self, rng: &mut impl RngCore) {
        let old_ids: FxHashSet<u32> = self.species.iter().map(|s| s.id).collect();

        let mut species: Vec<Specie> = Vec::new();
        let mut repr_conns = Vec::new();
        for old in self.species.iter().filter(|s| !s.is_dead && !s.members.is_empty()) {
            let representative = old.members[rng.random_range(0..old.members.len())];
            let keyed = keyed_connections(&self.genomes[representative], &mut self.registry.crossover_connections);
            repr_conns.push(keyed);
            species.push(Specie::new(old.id, representative));
        }

        let assigned: FxHashSet<usize> = species.iter().map(|s| s.representative).collect();
        let mut next_id = self.next_species_id;

        for genome_idx in 0..self.genomes.len() {
            if assigned.contains(&genome_idx) {
                continue;
            }
            let conns = keyed_connections(&self.genomes[genome_idx], &mut self.registry.crossover_connections);
            let mut placed = false;
            for (sp, repr) in species.iter_mut().zip(repr_conns.iter()) {
                let d = delta(repr, &conns, self.population_cfg.a, self.population_cfg.b, self.population_cfg.c);
                if d < self.speciation_thresh {
                    sp.members.push(genome_idx);
                    placed = true;
                    break;
                }
            }
            if !placed {
                let id = next_id;
                next_id += 1;
                log::debug!("speciate: new species {id} founded by genome {genome_idx}");
                repr_conns.push(conns.clone());
                species.push(Specie::new(id, genome_idx));
            }
        }
        self.next_species_id = next_id;

        let alive = species.len() as i64;
        let target = self.population_cfg.speciation_target as i64;
        let band = self.population_cfg.speciation_target_thresh as i64;
        if alive < target - band {
            self.speciation_thresh = (self.speciation_thresh - self.population_cfg.speciation_step_thresh).max(0.0);
        } else if alive > target + band {
            self.speciation_thresh += self.population_cfg.speciation_step_thresh;
        }

        for sp in &species {
            if !old_ids.contains(&sp.id) {
                log::debug!("species {} created with representative genome {}", sp.id, sp.representative);
            }
        }

        for sp in &species {
            for &m in &sp.members {
                self.genomes[m].species_id = Some(sp.id);
            }
        }
        self.species = species;

        self.update_fitnesses();
    }

    /// Track the fittest genome, per-species stagnation, and the offspring quota each species is
    /// allowed for the next generation.
    fn update_fitnesses(&mut self) {
        self.fittest_genome_id = self
            .genomes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.fitness.partial_cmp(&b.1.fitness).unwrap())
            .map(|(i, _)| i);

        for sp in &mut self.species {
            if sp.is_dead || sp.members.is_empty() {
                continue;
            }
            let n = sp.members.len() as f64;
            let sum_fitness: f64 = sp.members.iter().map(|&i| self.genomes[i].fitness).sum();
            let avg = sum_fitness / n;
            if avg > sp.avg_fitness {
                sp.gens_since_improved = 0;
            } else {
                sp.gens_since_improved += 1;
            }
            sp.sum_fitness = sum_fitness;
            sp.avg_fitness = avg;
            sp.avg_fitness_adjusted = avg / n;
        }

        let pop_avg_adjusted: f64 = self
            .species
            .iter()
            .filter(|s| !s.is_dead)
            .map(|s| s.avg_fitness_adjusted * s.members.len() as f64)
            .sum::<f64>()
            / self.pop_size as f64;
        self.avg_fitness_adjusted = pop_avg_adjusted;

        for sp in &mut self.species {
            if sp.is_dead {
                sp.allowed_offspring = 0;
                continue;
            }
            if sp.gens_since_improved < self.population_cfg.thresh_gens_since_improved {
                sp.allowed_offspring = if pop_avg_adjusted > 0.0 {
                    ((sp.members.len() as f64) * sp.avg_fitness_adjusted / pop_avg_adjusted).floor() as usize
                } else {
                    0
                };
            } else {
                sp.allowed_offspring = 0;
                sp.is_dead = true;
                log::warn!("species {} stale after {} generations, producing zero offspring", sp.id, sp.gens_since_improved);
            }
        }
    }

    /// Produce the next generation: elitism clone of the fittest genome, then fitness-proportional
    /// crossover within each species up to its offspring quota, padded with fresh genomes, then
    /// mutated in place (except the elite).
    pub fn build_next_gen(&mut self, rng: &mut impl RngCore) -> Result<(), ConfigError> {
        let mut next_genomes: Vec<Genome> = Vec::with_capacity(self.pop_size);

        if self.population_cfg.elitism > 0 {
            if let Some(fit_id) = self.fittest_genome_id {
                next_genomes.push(self.genomes[fit_id].clone());
            }
        }

        for sp in &self.species {
            if sp.allowed_offspring == 0 || sp.members.is_empty() {
                continue;
            }
            for _ in 0..sp.allowed_offspring {
                if next_genomes.len() >= self.pop_size {
                    break;
                }
                let fitness = |i: usize| self.genomes[i].fitness;
                let a = select_parent(&sp.members, fitness, rng);
                let b = select_parent(&sp.members, fitness, rng);
                let (fitter, other) = if self.genomes[a].fitness >= self.genomes[b].fitness {
                    (a, b)
                } else {
                    (b, a)
                };
                next_genomes.push(crossover_child(
                    &self.genomes[fitter],
                    &self.genomes[other],
                    &mut self.registry.crossover_connections,
                    rng,
                ));
            }
        }

        while next_genomes.len() < self.pop_size {
            next_genomes.push(Genome::new(
                &self.bias_sch,
                &self.inputs_sch,
                &self.outputs_sch,
                &[],
                &self.bias_init,
                self.reset_values.clone(),
                self.activation_fns.clone(),
                self.rec_max,
                &self.genome_cfg,
                &mut self.registry.connections,
                &mut self.registry.nodes,
                rng,
            )?);
        }
        next_genomes.truncate(self.pop_size);

        let elite_count = if self.population_cfg.elitism > 0 { 1 } else { 0 };
        for g in next_genomes.iter_mut().skip(elite_count) {
            g.mutate(&self.genome_cfg, &mut self.registry.connections, &mut self.registry.nodes, rng);
        }

        for sp in &mut self.species {
            sp.members.clear();
            sp.is_dead = false;
        }
        let species_ids: FxHashSet<u32> = self.species.iter().map(|s| s.id).collect();
        for (idx, g) in next_genomes.iter_mut().enumerate() {
            match g.species_id.filter(|id| species_ids.contains(id)) {
                Some(id) => {
                    if let Some(sp) = self.species.iter_mut().find(|s| s.id == id) {
                        sp.members.push(idx);
                    }
                }
                None => g.species_id = None,
            }
        }

        let fittest_fitness = self.fittest_genome_id.map(|i| self.genomes[i].fitness).unwrap_or(0.0);
        log::info!(
            "generation {} complete: fittest={:.4} species={} thresh={:.3}",
            self.generation,
            fittest_fitness,
            self.species.iter().filter(|s| !s.is_dead).count(),
            self.speciation_thresh
        );

        self.genomes = next_genomes;
        self.generation += 1;
        Ok(())
    }
}

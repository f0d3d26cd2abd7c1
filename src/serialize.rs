//! Byte-exact binary persistence for a population, plus a JSON convenience path.
//!
//! The layout writes a version tag, a genome count, then each genome's fixed-width scalar
//! fields in declaration order followed by its nodes and connections as a `u32` length prefix
//! plus elements — the same length-prefixed scheme the engine this was ported from used for its
//! save files, translated from raw `sizeof` writes to explicit little-endian field encoding so
//! the format doesn't depend on the reading machine's layout. The innovation registry, whose
//! internal shape isn't part of the interchange contract, rides along as an embedded JSON blob.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::activation::{Builtin, Kind};
use crate::error::{SerializationError, SerializationResult};
use crate::genome::{ActivationTable, Connection, Genome, Node};
use crate::innovation::InnovationRegistry;
use crate::population::Population;
use crate::types::Value;

const FORMAT_VERSION: u32 = 1;

fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}
fn write_i32(w: &mut impl Write, v: i32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}
fn write_f32(w: &mut impl Write, v: f32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}
fn write_f64(w: &mut impl Write, v: f64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}
fn write_bool(w: &mut impl Write, v: bool) -> io::Result<()> {
    w.write_all(&[v as u8])
}

fn fill_err(expected: usize) -> impl Fn(io::Error) -> SerializationError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            SerializationError::Truncated { expected, found: 0 }
        } else {
            SerializationError::Io(e)
        }
    }
}

fn read_u32(r: &mut impl Read) -> SerializationResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(fill_err(4))?;
    Ok(u32::from_le_bytes(buf))
}
fn read_i32(r: &mut impl Read) -> SerializationResult<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(fill_err(4))?;
    Ok(i32::from_le_bytes(buf))
}
fn read_f32(r: &mut impl Read) -> SerializationResult<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(fill_err(4))?;
    Ok(f32::from_le_bytes(buf))
}
fn read_f64(r: &mut impl Read) -> SerializationResult<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).map_err(fill_err(8))?;
    Ok(f64::from_le_bytes(buf))
}
fn read_bool(r: &mut impl Read) -> SerializationResult<bool> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf).map_err(fill_err(1))?;
    Ok(buf[0] != 0)
}

fn write_value(w: &mut impl Write, v: &Value) -> io::Result<()> {
    match *v {
        Value::F32(x) => {
            w.write_all(&[0])?;
            write_f32(w, x)
        }
        Value::F64(x) => {
            w.write_all(&[1])?;
            write_f64(w, x)
        }
        Value::I32(x) => {
            w.write_all(&[2])?;
            write_i32(w, x)
        }
        Value::I64(x) => {
            w.write_all(&[3])?;
            w.write_all(&x.to_le_bytes())
        }
        Value::Bool(x) => {
            w.write_all(&[4])?;
            write_bool(w, x)
        }
    }
}

fn read_value(r: &mut impl Read) -> SerializationResult<Value> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag).map_err(fill_err(1))?;
    Ok(match tag[0] {
        0 => Value::F32(read_f32(r)?),
        1 => Value::F64(read_f64(r)?),
        2 => Value::I32(read_i32(r)?),
        3 => {
            let mut buf = [0u8; 8];
            r.read_exact(&mut buf).map_err(fill_err(8))?;
            Value::I64(i64::from_le_bytes(buf))
        }
        4 => Value::Bool(read_bool(r)?),
        other => return Err(SerializationError::Codec(format!("unknown Value tag {other}"))),
    })
}

fn write_kind(w: &mut impl Write, k: Kind) -> io::Result<()> {
    match k {
        Kind::Identity => w.write_all(&[0]),
        Kind::Sigmoid { gain } => {
            w.write_all(&[1])?;
            write_f64(w, gain)
        }
        Kind::Relu => w.write_all(&[2]),
        Kind::Tanh { gain } => {
            w.write_all(&[3])?;
            write_f64(w, gain)
        }
    }
}

fn read_kind(r: &mut impl Read) -> SerializationResult<Kind> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag).map_err(fill_err(1))?;
    Ok(match tag[0] {
        0 => Kind::Identity,
        1 => Kind::Sigmoid { gain: read_f64(r)? },
        2 => Kind::Relu,
        3 => Kind::Tanh { gain: read_f64(r)? },
        other => return Err(SerializationError::Codec(format!("unknown Kind tag {other}"))),
    })
}

fn write_node(w: &mut impl Write, n: &Node) -> io::Result<()> {
    write_u32(w, n.id)?;
    write_u32(w, n.innov_id)?;
    write_i32(w, n.layer)?;
    write_u32(w, n.t_in as u32)?;
    write_u32(w, n.t_out as u32)?;
    write_kind(w, n.activation.0)?;
    write_value(w, &n.reset_value)
}

fn read_node(r: &mut impl Read) -> SerializationResult<Node> {
    let id = read_u32(r)?;
    let innov_id = read_u32(r)?;
    let layer = read_i32(r)?;
    let t_in = read_u32(r)? as usize;
    let t_out = read_u32(r)? as usize;
    let kind = read_kind(r)?;
    let reset_value = read_value(r)?;
    let mut node = Node::new(id, innov_id, layer, t_in, t_out, Builtin::new(kind), reset_value);
    node.reset();
    Ok(node)
}

fn write_connection(w: &mut impl Write, c: &Connection) -> io::Result<()> {
    write_u32(w, c.innov_id)?;
    write_u32(w, c.in_node)?;
    write_u32(w, c.out_node)?;
    write_u32(w, c.in_node_recu)?;
    write_f32(w, c.weight)?;
    write_bool(w, c.enabled)
}

fn read_connection(r: &mut impl Read) -> SerializationResult<Connection> {
    let innov_id = read_u32(r)?;
    let in_node = read_u32(r)?;
    let out_node = read_u32(r)?;
    let in_node_recu = read_u32(r)?;
    let weight = read_f32(r)?;
    let enabled = read_bool(r)?;
    let mut conn = Connection::new(innov_id, in_node, out_node, in_node_recu, weight);
    conn.enabled = enabled;
    Ok(conn)
}

/// Write a genome's persisted fields: `nbBias, nbInput, nbOutput, weightExtremumInit, nodes,
/// connections, recMax, fitness, speciesId`. Recurrent history isn't part of the format; it's
/// rebuilt fresh on load.
pub fn write_genome(w: &mut impl Write, g: &Genome) -> io::Result<()> {
    write_u32(w, g.n_bias)?;
    write_u32(w, g.n_input)?;
    write_u32(w, g.n_output)?;
    write_f32(w, g.weight_extremum_init)?;
    write_u32(w, g.nodes.len() as u32)?;
    for n in &g.nodes {
        write_node(w, n)?;
    }
    write_u32(w, g.connections.len() as u32)?;
    for c in &g.connections {
        write_connection(w, c)?;
    }
    write_u32(w, g.rec_max)?;
    write_f64(w, g.fitness)?;
    match g.species_id {
        Some(id) => {
            write_bool(w, true)?;
            write_u32(w, id)
        }
        None => write_bool(w, false),
    }
}

/// Read a genome back. `n_types`, `activation_fns`, and `reset_values` come from the caller
/// since they describe the population's schema, not any one genome's persisted state.
pub fn read_genome(
    r: &mut impl Read,
    n_types: usize,
    activation_fns: ActivationTable,
    reset_values: Vec<Value>,
) -> SerializationResult<Genome> {
    let n_bias = read_u32(r)?;
    let n_input = read_u32(r)?;
    let n_output = read_u32(r)?;
    let weight_extremum_init = read_f32(r)?;

    let n_nodes = read_u32(r)?;
    let mut nodes = Vec::with_capacity(n_nodes as usize);
    for _ in 0..n_nodes {
        nodes.push(read_node(r)?);
    }

    let n_conns = read_u32(r)?;
    let mut connections = Vec::with_capacity(n_conns as usize);
    for _ in 0..n_conns {
        connections.push(read_connection(r)?);
    }

    let rec_max = read_u32(r)?;
    let fitness = read_f64(r)?;
    let species_id = if read_bool(r)? { Some(read_u32(r)?) } else { None };

    Ok(Genome {
        n_bias,
        n_input,
        n_output,
        weight_extremum_init,
        n_types,
        activation_fns,
        reset_values,
        nodes,
        connections,
        prev_outputs: crate::buffer::CircularBuffer::new(rec_max as usize),
        rec_max,
        fitness,
        species_id,
    })
}

#[derive(Serialize, Deserialize)]
struct RegistryBlob(InnovationRegistry);

/// Write `{version, pop_size, genomes[], registry}`.
pub fn write_population(w: &mut impl Write, pop: &Population) -> SerializationResult<()> {
    write_u32(w, FORMAT_VERSION)?;
    write_u32(w, pop.genomes.len() as u32)?;
    for g in &pop.genomes {
        write_genome(w, g)?;
    }
    let blob = serde_json::to_vec(&RegistryBlob(pop.registry.clone()))?;
    write_u32(w, blob.len() as u32)?;
    w.write_all(&blob)?;
    Ok(())
}

/// Read genomes and the registry back, given the schema that isn't part of the persisted
/// format (type count, activation table, reset values).
pub fn read_population(
    r: &mut impl Read,
    n_types: usize,
    activation_fns: ActivationTable,
    reset_values: Vec<Value>,
) -> SerializationResult<(Vec<Genome>, InnovationRegistry)> {
    let version = read_u32(r)?;
    if version != FORMAT_VERSION {
        return Err(SerializationError::VersionMismatch { expected: FORMAT_VERSION, found: version });
    }
    let pop_size = read_u32(r)?;
    let mut genomes = Vec::with_capacity(pop_size as usize);
    for _ in 0..pop_size {
        genomes.push(read_genome(r, n_types, activation_fns.clone(), reset_values.clone())?);
    }
    let blob_len = read_u32(r)? as usize;
    let mut blob = vec![0u8; blob_len];
    r.read_exact(&mut blob).map_err(fill_err(blob_len))?;
    let RegistryBlob(registry) = serde_json::from_slice(&blob)?;
    Ok((genomes, registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::steep_sigmoid;
    use crate::config::{GenomeConfig, PopulationConfig};
    use crate::random::seeded_rng;

    fn tiny_population() -> Population {
        let mut population_cfg = PopulationConfig::default();
        population_cfg.pop_size = 4;
        let mut rng = seeded_rng(0xC0FFEE);
        Population::new(
            vec![1],
            vec![2],
            vec![1],
            vec![Value::F32(1.0)],
            vec![Value::F32(0.0)],
            vec![vec![vec![steep_sigmoid()]]],
            0,
            GenomeConfig::default(),
            population_cfg,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn binary_round_trip_preserves_genome_count_and_topology() {
        let pop = tiny_population();
        let mut buf = Vec::new();
        write_population(&mut buf, &pop).unwrap();

        let (genomes, registry) =
            read_population(&mut buf.as_slice(), 1, vec![vec![vec![steep_sigmoid()]]], vec![Value::F32(0.0)]).unwrap();

        assert_eq!(genomes.len(), pop.genomes.len());
        for (a, b) in genomes.iter().zip(pop.genomes.iter()) {
            assert_eq!(a.nodes.len(), b.nodes.len());
            assert_eq!(a.connections.len(), b.connections.len());
        }
        assert_eq!(registry.connections.head(), pop.registry.connections.head());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 999).unwrap();
        let err = read_population(&mut buf.as_slice(), 1, vec![vec![vec![steep_sigmoid()]]], vec![Value::F32(0.0)]);
        assert!(matches!(err, Err(SerializationError::VersionMismatch { .. })));
    }

    #[test]
    fn truncated_stream_is_reported() {
        let buf: Vec<u8> = vec![1, 0, 0, 0];
        let err = read_population(&mut buf.as_slice(), 1, vec![vec![vec![steep_sigmoid()]]], vec![Value::F32(0.0)]);
        assert!(matches!(err, Err(SerializationError::Truncated { .. })));
    }
}

//! Persistence of individuals.
//!
//! The text form holds four lines: the genome, the node type of
//! every node, the start node, and the value of every decoded
//! subnode. Values are written with a small token codec:
//!
//! - integers as `i<n>|`,
//! - floats as `d<raw bits>|<readable value>|`, read back from the bits,
//! - strings as `"<text>"` with `\"` and `\\` escapes.
//!
//! Node types are strings `"<id>|<type>"` (1 for judgement, 2 for
//! processing); subnode values are a count followed by
//! `"<node>|<subnode>"` keys and their values. Writing, reading and
//! writing again produces identical text.
//!
//! [`NetworkState`] carries the same content for serde formats.

use crate::learning::QValues;
use crate::network::{Network, NodeType};
use crate::{GnpContext, GnpError, Individual, NodeId, Result, SubnodeId};

use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use std::fmt::Write;

/// The learned value of a subnode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QEntry {
    pub node: NodeId,
    pub subnode: SubnodeId,
    pub q: f64,
}

/// Everything needed to restore an individual.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub genome: Vec<f64>,
    pub node_types: Vec<NodeType>,
    pub start_node: NodeId,
    pub q_values: Vec<QEntry>,
}

/// Appends tokens to a string.
#[derive(Debug, Default)]
pub struct Encoder {
    out: String,
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder::default()
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        let _ = write!(self.out, "i{}|", value);
        self
    }

    pub fn float(&mut self, value: f64) -> &mut Self {
        let _ = write!(self.out, "d{}|{}|", value.to_bits() as i64, value);
        self
    }

    pub fn string(&mut self, value: &str) -> &mut Self {
        self.out.push('"');
        for c in value.chars() {
            if c == '"' || c == '\\' {
                self.out.push('\\');
            }
            self.out.push(c);
        }
        self.out.push('"');
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Reads tokens back from text produced by an [`Encoder`].
///
/// # Examples
/// ```
/// use oxignp::serialization::{Decoder, Encoder};
///
/// let mut encoder = Encoder::new();
/// encoder.int(-3).float(0.1).string("a \"b\"");
/// let text = encoder.finish();
///
/// let mut decoder = Decoder::new(&text);
/// assert_eq!(decoder.int("example").unwrap(), -3);
/// assert_eq!(decoder.float("example").unwrap(), 0.1);
/// assert_eq!(decoder.string("example").unwrap(), "a \"b\"");
/// assert!(decoder.at_end());
/// ```
#[derive(Debug)]
pub struct Decoder<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(text: &'a str) -> Decoder<'a> {
        Decoder { text, position: 0 }
    }

    /// Byte offset of the next token.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether only whitespace is left.
    pub fn at_end(&self) -> bool {
        self.rest().trim().is_empty()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    fn expect(&mut self, what: &'static str, prefix: char) -> Result<()> {
        self.skip_whitespace();
        if self.rest().starts_with(prefix) {
            self.position += prefix.len_utf8();
            Ok(())
        } else {
            Err(GnpError::parse(
                what,
                self.position,
                format!("expected '{}'", prefix),
            ))
        }
    }

    /// Consumes text up to the next `|`, and the `|` itself.
    fn field(&mut self, what: &'static str) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find('|')
            .ok_or_else(|| GnpError::parse(what, self.position, "unterminated token"))?;
        self.position += end + 1;
        Ok(&rest[..end])
    }

    pub fn int(&mut self, what: &'static str) -> Result<i64> {
        self.expect(what, 'i')?;
        let start = self.position;
        let field = self.field(what)?;
        field
            .parse()
            .map_err(|e| GnpError::parse(what, start, format!("{}: {:?}", e, field)))
    }

    pub fn float(&mut self, what: &'static str) -> Result<f64> {
        self.expect(what, 'd')?;
        let start = self.position;
        let bits = self.field(what)?;
        let bits: i64 = bits
            .parse()
            .map_err(|e| GnpError::parse(what, start, format!("{}: {:?}", e, bits)))?;
        self.field(what)?;
        Ok(f64::from_bits(bits as u64))
    }

    pub fn string(&mut self, what: &'static str) -> Result<String> {
        self.expect(what, '"')?;
        let mut value = String::new();
        let mut escaped = false;
        for (i, c) in self.rest().char_indices() {
            match c {
                _ if escaped => {
                    value.push(c);
                    escaped = false;
                }
                '\\' => escaped = true,
                '"' => {
                    self.position += i + 1;
                    return Ok(value);
                }
                _ => value.push(c),
            }
        }
        Err(GnpError::parse(what, self.position, "unterminated string"))
    }

    /// Reads a non-negative integer below `bound`.
    fn index(&mut self, what: &'static str, bound: usize) -> Result<usize> {
        let position = self.position;
        let value = self.int(what)?;
        usize::try_from(value)
            .ok()
            .filter(|&v| v < bound)
            .ok_or_else(|| {
                GnpError::parse(what, position, format!("{} is out of range 0..{}", value, bound))
            })
    }
}

/// Splits a `"a|b"` string into its two integer halves.
fn pair(what: &'static str, position: usize, text: &str) -> Result<(i64, i64)> {
    let mut parts = text.splitn(2, '|');
    let mut next = || -> Result<i64> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| GnpError::parse(what, position, format!("bad pair {:?}", text)))
    };
    Ok((next()?, next()?))
}

impl NetworkState {
    /// Renders the state in text form.
    pub fn to_text(&self) -> String {
        let mut encoder = Encoder::new();
        encoder.int(self.genome.len() as i64);
        for &gene in &self.genome {
            encoder.float(gene);
        }
        encoder.newline();
        for (id, node_type) in self.node_types.iter().enumerate() {
            encoder.string(&format!("{}|{}", id, node_type.code()));
        }
        encoder.newline().int(self.start_node as i64).newline();
        encoder.int(self.q_values.len() as i64);
        for entry in &self.q_values {
            encoder
                .string(&format!("{}|{}", entry.node, entry.subnode))
                .float(entry.q);
        }
        encoder.newline();
        encoder.finish()
    }

    /// Parses the text form.
    ///
    /// # Errors
    /// Returns [`GnpError::Parse`] on malformed text, node types
    /// out of order, or ids out of range.
    pub fn from_text(text: &str) -> Result<NetworkState> {
        let mut lines = text.lines();
        let mut line = |what: &'static str| {
            lines
                .next()
                .ok_or_else(|| GnpError::parse(what, text.len(), "missing line"))
        };

        let mut genome_line = Decoder::new(line("genome")?);
        let len = genome_line.int("genome")?;
        let genome = (0..len)
            .map(|_| genome_line.float("genome"))
            .collect::<Result<Vec<_>>>()?;

        let mut types_line = Decoder::new(line("node types")?);
        let mut node_types = vec![];
        while !types_line.at_end() {
            let position = types_line.position();
            let entry = types_line.string("node types")?;
            let (id, code) = pair("node types", position, &entry)?;
            if id != node_types.len() as i64 {
                return Err(GnpError::parse(
                    "node types",
                    position,
                    format!("expected node {}, found {}", node_types.len(), id),
                ));
            }
            let node_type = NodeType::from_code(code).ok_or_else(|| {
                GnpError::parse("node types", position, format!("unknown type {}", code))
            })?;
            node_types.push(node_type);
        }

        let mut start_line = Decoder::new(line("start node")?);
        let start_node = start_line.index("start node", node_types.len())?;

        let mut q_line = Decoder::new(line("q values")?);
        let count = q_line.int("q values")?;
        let mut q_values = vec![];
        for _ in 0..count {
            let position = q_line.position();
            let key = q_line.string("q values")?;
            let (node, subnode) = pair("q values", position, &key)?;
            let q = q_line.float("q values")?;
            match (usize::try_from(node), usize::try_from(subnode)) {
                (Ok(node), Ok(subnode)) => q_values.push(QEntry { node, subnode, q }),
                _ => {
                    return Err(GnpError::parse(
                        "q values",
                        position,
                        format!("negative id in {:?}", key),
                    ))
                }
            }
        }

        Ok(NetworkState {
            genome,
            node_types,
            start_node,
            q_values,
        })
    }
}

impl<S> Individual<S> {
    /// Captures the genome, node types, start node and subnode
    /// values. The genome is decoded first if it may have changed,
    /// so the captured genome is the repaired one.
    ///
    /// # Errors
    /// Fails if the genome cannot be decoded under `ctx`.
    pub fn state(&mut self, ctx: &GnpContext<S>, rng: &mut dyn RngCore) -> Result<NetworkState> {
        self.prepare(ctx, rng)?;
        let network = self.decoded_network();
        Ok(NetworkState {
            genome: self.genome().to_vec(),
            node_types: network.node_types().to_vec(),
            start_node: network.start_node(),
            q_values: network
                .nodes()
                .iter()
                .flat_map(|node| {
                    node.subnodes().iter().map(move |sub| QEntry {
                        node: node.id(),
                        subnode: sub.id(),
                        q: sub.q(),
                    })
                })
                .collect(),
        })
    }

    /// Restores an individual, decoding its network without
    /// running function-changed hooks and then applying the
    /// stored values.
    ///
    /// # Errors
    /// Fails if the genome cannot be decoded under `ctx`, or if
    /// the node types or values do not fit the decoded network.
    pub fn from_state(
        ctx: &GnpContext<S>,
        state: NetworkState,
        rng: &mut dyn RngCore,
    ) -> Result<Individual<S>> {
        let node_count = ctx.config().node_count();
        if state.node_types.len() != node_count {
            return Err(GnpError::parse(
                "node types",
                0,
                format!("{} node types for {} nodes", state.node_types.len(), node_count),
            ));
        }
        if state.start_node >= node_count {
            return Err(GnpError::parse(
                "start node",
                0,
                format!("start node {} out of range", state.start_node),
            ));
        }
        let expected = ctx.layout().genome_len();
        if state.genome.len() != expected {
            return Err(GnpError::GenomeLength {
                expected,
                actual: state.genome.len(),
            });
        }

        let mut network = Network::from_parts(state.node_types, state.start_node);
        let mut genome = state.genome;
        network.generate(ctx, &mut genome, rng, true)?;
        for (i, entry) in state.q_values.iter().enumerate() {
            let exists = network
                .nodes()
                .get(entry.node)
                .map_or(false, |node| entry.subnode < node.subnodes().len());
            if !exists {
                return Err(GnpError::parse(
                    "q values",
                    i,
                    format!("no subnode {} in node {}", entry.subnode, entry.node),
                ));
            }
            network.set_q(entry.node, entry.subnode, entry.q);
        }
        debug!("restored network with {} values", state.q_values.len());

        let mut individual = Individual::with_network(genome, network);
        individual.initialize = false;
        Ok(individual)
    }

    /// Renders the individual in text form, decoding it first
    /// if needed.
    pub fn write_text(&mut self, ctx: &GnpContext<S>, rng: &mut dyn RngCore) -> Result<String> {
        Ok(self.state(ctx, rng)?.to_text())
    }

    /// Restores an individual from its text form.
    pub fn read_text(ctx: &GnpContext<S>, text: &str, rng: &mut dyn RngCore) -> Result<Individual<S>> {
        Individual::from_state(ctx, NetworkState::from_text(text)?, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, TestState};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trained(seed: u64) -> (GnpContext<TestState>, Individual<TestState>, StdRng) {
        let ctx = testing::context();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut individual = Individual::random(&ctx, &mut rng).unwrap();
        let mut state = TestState::default();
        for _ in 0..5 {
            individual
                .evaluate_learn_explore(&ctx, &mut rng, 0, Some(0.5), &mut state)
                .unwrap();
            for id in state.drain(..) {
                individual.set_delayed_reward(&ctx, id, Some(-0.3)).unwrap();
            }
        }
        individual.after_evaluation();
        (ctx, individual, rng)
    }

    #[test]
    fn text_round_trip() {
        let (ctx, mut individual, mut rng) = trained(1);
        let text = individual.write_text(&ctx, &mut rng).unwrap();
        let mut restored = Individual::read_text(&ctx, &text, &mut rng).unwrap();
        assert_eq!(restored.write_text(&ctx, &mut rng).unwrap(), text);
        assert_eq!(
            restored.state(&ctx, &mut rng).unwrap(),
            individual.state(&ctx, &mut rng).unwrap()
        );
    }

    #[test]
    fn undecoded_individuals_round_trip() {
        let ctx = testing::context();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut individual = Individual::random(&ctx, &mut rng).unwrap();
            let text = individual.write_text(&ctx, &mut rng).unwrap();
            assert_ne!(text.lines().nth(3), Some("i0|"));

            let mut restored = Individual::read_text(&ctx, &text, &mut rng).unwrap();
            assert_eq!(restored.write_text(&ctx, &mut rng).unwrap(), text);
        }
    }

    #[test]
    fn state_follows_genome_changes() {
        let (ctx, mut individual, mut rng) = trained(5);
        let gene = ctx.layout().parameter(0, 0, 1).start;
        individual.genome_mut()[gene] += 1.0;
        let state = individual.state(&ctx, &mut rng).unwrap();
        assert_eq!(state.genome, individual.genome());
        assert!(individual.decoded_network().is_decoded());

        let mut restored = Individual::from_state(&ctx, state.clone(), &mut rng).unwrap();
        assert_eq!(restored.state(&ctx, &mut rng).unwrap(), state);
    }

    #[test]
    fn serde_round_trip() {
        let (ctx, mut individual, mut rng) = trained(2);
        let state = individual.state(&ctx, &mut rng).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let parsed: NetworkState = serde_json::from_str(&json).unwrap();
        let mut restored = Individual::from_state(&ctx, parsed, &mut rng).unwrap();
        assert_eq!(restored.state(&ctx, &mut rng).unwrap(), state);
    }

    #[test]
    fn restored_individuals_keep_values() {
        let (ctx, mut individual, mut rng) = trained(3);
        let text = individual.write_text(&ctx, &mut rng).unwrap();
        let mut restored = Individual::read_text(&ctx, &text, &mut rng).unwrap();
        let before = individual.decoded_network().clone();
        let network = restored.network(&ctx, &mut rng).unwrap();
        for (a, b) in before.nodes().iter().zip(network.nodes()) {
            for (x, y) in a.subnodes().iter().zip(b.subnodes()) {
                assert_eq!(x.q(), y.q());
                assert_eq!(x.function_id(), y.function_id());
            }
        }
    }

    #[test]
    fn node_type_line() {
        let state = NetworkState {
            genome: vec![],
            node_types: vec![NodeType::Processing, NodeType::Judgement],
            start_node: 1,
            q_values: vec![QEntry {
                node: 0,
                subnode: 1,
                q: 0.5,
            }],
        };
        let text = state.to_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "i0|");
        assert_eq!(lines[1], "\"0|2\"\"1|1\"");
        assert_eq!(lines[2], "i1|");
        assert_eq!(lines[3], format!("i1|\"0|1\"d{}|0.5|", 0.5f64.to_bits() as i64));
        assert_eq!(NetworkState::from_text(&text).unwrap(), state);
    }

    #[test]
    fn malformed_text() {
        let (ctx, mut individual, mut rng) = trained(4);
        let text = individual.write_text(&ctx, &mut rng).unwrap();
        let lines: Vec<_> = text.lines().collect();

        let cases = [
            lines[..3].join("\n"),
            text.replacen("i", "x", 1),
            text.replacen("|1\"", "|7\"", 1),
            [lines[0], lines[1], "i99|", lines[3]].join("\n"),
            [lines[0], lines[1], lines[2], "i1|\"0|9\"d0|0|"].join("\n"),
        ];
        for case in &cases {
            assert!(matches!(
                Individual::read_text(&ctx, case, &mut rng),
                Err(GnpError::Parse { .. })
            ));
        }
    }

    #[test]
    fn escaped_strings() {
        let mut encoder = Encoder::new();
        encoder.string("\\\"|");
        let text = encoder.finish();
        assert_eq!(text, "\"\\\\\\\"|\"");
        assert_eq!(Decoder::new(&text).string("test").unwrap(), "\\\"|");
    }

    #[test]
    fn special_floats_survive() {
        let mut encoder = Encoder::new();
        encoder.float(-0.0).float(f64::NAN).float(f64::MAX);
        let text = encoder.finish();
        let mut decoder = Decoder::new(&text);
        assert_eq!(decoder.float("test").unwrap().to_bits(), (-0.0f64).to_bits());
        assert!(decoder.float("test").unwrap().is_nan());
        assert_eq!(decoder.float("test").unwrap(), f64::MAX);
    }
}

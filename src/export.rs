//! Pheromone report — render the learned state of a graph as text.
//!
//! ```text
//! # pheromone report
//! # depth: 2  nodes: 5  edges: 4
//!
//! [layer 0]
//! Input
//!   -> Conv2D     pheromone=0.100000 heuristic=1.000000
//!   -> Dense      pheromone=0.092000 heuristic=1.000000
//! [layer 1]
//! Dense
//!   .units  32=0.100000 64=0.104000
//! ```
//!
//! Purely observational: the report reads a [`Topology`] and writes lines.
//! Nodes are sorted by name inside a layer so two reports of the same state
//! are byte-identical.

use std::io::Write;

use crate::graph::Topology;
use crate::model::{Attribute, NodeRecord};
use crate::Result;

/// Write the full pheromone report for `topology`.
pub fn write_pheromone_report(topology: &Topology, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "# pheromone report")?;
    writeln!(
        writer,
        "# depth: {}  nodes: {}  edges: {}",
        topology.current_depth(),
        topology.nodes().len(),
        topology.edge_count()
    )?;
    writeln!(writer)?;

    for (depth, layer) in topology.layers().iter().enumerate() {
        if layer.is_empty() {
            continue;
        }
        writeln!(writer, "[layer {depth}]")?;

        let mut records: Vec<&NodeRecord> = layer
            .values()
            .filter_map(|id| topology.node(*id).ok())
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        for record in records {
            writeln!(writer, "{}", record.name)?;
            for edge in &record.neighbours {
                let target = topology.node(edge.node).map(|n| n.name.as_str()).unwrap_or("?");
                writeln!(
                    writer,
                    "  -> {:<10} pheromone={:.6} heuristic={:.6}",
                    target, edge.pheromone, edge.heuristic
                )?;
            }
            for attr in &record.attributes {
                writeln!(writer, "  .{}  {}", attr.name, format_attribute(attr))?;
            }
        }
    }
    Ok(())
}

/// `value=weight` pairs in domain order.
fn format_attribute(attr: &Attribute) -> String {
    attr.domain
        .iter()
        .zip(&attr.pheromone)
        .map(|(value, weight)| format!("{value}={weight:.6}"))
        .collect::<Vec<_>>()
        .join(" ")
}

//! Pass scheduler
//!
//! One-shot, synchronous computation performed before any parsing begins.
//! Resolves the requested passes plus their hard dependencies into a total
//! execution order via topological sort. Soft dependencies and
//! execute-before relations order passes only when both sides are present;
//! first/last markers pin a pass to the head or tail of the pipeline.

use super::pass::{Pass, PassDescriptor, PassId};
use super::registry::PassRegistry;
use crate::errors::{PropGraphError, Result};
use ahash::AHashMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

/// Computes the execution order for `requested`, instantiating missing hard
/// dependencies from `registry`.
pub fn order_passes(
    requested: &[PassId],
    registry: &PassRegistry,
) -> Result<Vec<Box<dyn Pass>>> {
    // collect requested passes and, transitively, their hard dependencies;
    // insertion order doubles as the deterministic tie-break
    let mut passes: Vec<(PassDescriptor, Box<dyn Pass>)> = Vec::new();
    let mut known: AHashMap<PassId, usize> = AHashMap::new();
    let mut queue: Vec<PassId> = requested.to_vec();
    while let Some(id) = queue.pop() {
        if known.contains_key(&id) {
            continue;
        }
        let pass = registry.instantiate(id)?;
        let descriptor = pass.descriptor();
        queue.extend(descriptor.hard_dependencies.iter().copied());
        known.insert(id, passes.len());
        passes.push((descriptor, pass));
    }

    let first = marked_pass(&passes, |d| d.execute_first, "first")?;
    let last = marked_pass(&passes, |d| d.execute_last, "last")?;

    let mut graph: DiGraph<PassId, ()> = DiGraph::new();
    let mut indices: AHashMap<PassId, NodeIndex> = AHashMap::new();
    for (descriptor, _) in &passes {
        indices.insert(descriptor.id, graph.add_node(descriptor.id));
    }

    let mut add_edge = |graph: &mut DiGraph<PassId, ()>, from: PassId, to: PassId| {
        let (from, to) = (indices[&from], indices[&to]);
        if !graph.contains_edge(from, to) {
            graph.add_edge(from, to, ());
        }
    };

    for (descriptor, _) in &passes {
        for &dep in &descriptor.hard_dependencies {
            add_edge(&mut graph, dep, descriptor.id);
        }
        // soft dependencies order only against passes that are present
        for &dep in &descriptor.soft_dependencies {
            if known.contains_key(&dep) {
                add_edge(&mut graph, dep, descriptor.id);
            }
        }
        // execute-before(p, q) is a soft dependency of q on p
        for &target in &descriptor.execute_before {
            if known.contains_key(&target) {
                add_edge(&mut graph, descriptor.id, target);
            }
        }
    }

    // pin the first-marked pass to the head and the last-marked to the tail
    if let Some(first) = first {
        for (descriptor, _) in &passes {
            if descriptor.id != first && Some(descriptor.id) != last {
                add_edge(&mut graph, first, descriptor.id);
            }
        }
    }
    if let Some(last) = last {
        for (descriptor, _) in &passes {
            if descriptor.id != last {
                add_edge(&mut graph, descriptor.id, last);
            }
        }
    }

    let sorted = toposort(&graph, None).map_err(|cycle| {
        PropGraphError::config(format!(
            "cyclic pass dependency involving {}",
            graph[cycle.node_id()]
        ))
    })?;

    let mut by_id: AHashMap<PassId, Box<dyn Pass>> = passes
        .into_iter()
        .map(|(d, p)| (d.id, p))
        .collect();
    let order: Vec<Box<dyn Pass>> = sorted
        .into_iter()
        .filter_map(|idx| by_id.remove(&graph[idx]))
        .collect();
    debug!(
        passes = ?order.iter().map(|p| p.descriptor().id).collect::<Vec<_>>(),
        "pass execution order resolved"
    );
    Ok(order)
}

fn marked_pass(
    passes: &[(PassDescriptor, Box<dyn Pass>)],
    marker: impl Fn(&PassDescriptor) -> bool,
    which: &str,
) -> Result<Option<PassId>> {
    let marked: Vec<PassId> = passes
        .iter()
        .filter(|(d, _)| marker(d))
        .map(|(d, _)| d.id)
        .collect();
    match marked.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some(*one)),
        many => Err(PropGraphError::config(format!(
            "more than one pass marked execute-{which}: {}",
            many.iter()
                .map(|id| id.name())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

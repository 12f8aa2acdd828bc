//! `droidplan tree` command

use std::collections::HashSet;

use anyhow::Result;

use crate::cli::TreeArgs;
use crate::commands;
use droidplan::graph::{DependencyGraph, DependencyNode};
use droidplan::ops::dependency_graph;
use droidplan::util::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext) -> Result<()> {
    let loaded = commands::load(&args.input, ctx)?;
    let registries = loaded.config.registries();

    let graph = dependency_graph(&loaded.source, &registries)
        .map_err(|e| commands::report(e, &loaded, ctx))?;

    if graph.is_empty() {
        println!("(no dependencies)");
        return Ok(());
    }

    if args.order {
        for (i, node) in graph.topological_order().into_iter().enumerate() {
            println!("{:>3}. {}", i + 1, describe(node));
        }
        return Ok(());
    }

    let max_depth = args.depth.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    for root in graph.roots() {
        print_tree(&graph, root, 0, max_depth, &mut seen);
    }

    Ok(())
}

fn describe(node: &DependencyNode) -> String {
    let mut line = format!("{} v{} ({})", node.coordinate, node.version, node.kind);
    if let Some(plugin) = &node.implied_by {
        line.push_str(&format!(" [implied by {}]", plugin));
    }
    line
}

fn print_tree<'a>(
    graph: &'a DependencyGraph,
    node: &'a DependencyNode,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<&'a str>,
) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(node.coordinate.as_str());

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let dup_marker = if is_duplicate { " (*)" } else { "" };

    println!("{}{}{}", prefix, describe(node), dup_marker);

    // Don't recurse into nodes already printed
    if is_duplicate {
        return;
    }

    for coordinate in graph.requires(&node.coordinate) {
        if let Some(dep) = graph.node(coordinate) {
            print_tree(graph, dep, depth + 1, max_depth, seen);
        }
    }
}

//! Interactive SCC / shortest-path explorer over an author-graph binary
//! file.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use corpusgraph::graph::AuthorGraph;
use corpusgraph::logging;

#[derive(Parser, Debug)]
#[command(name = "authors", about = "Run Tarjan SCC or Dijkstra over an author graph")]
struct Cli {
    /// Path to an author-graph binary file.
    graph_path: PathBuf,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let graph = match AuthorGraph::load_from_file(&cli.graph_path) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to load author graph: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(nodes = graph.len(), "author graph loaded");

    repl(&graph);
    ExitCode::SUCCESS
}

fn repl(graph: &AuthorGraph) {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("authors> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        match line.trim() {
            "quit" => break,
            "run" => run_algorithm(graph, &mut lines),
            "" => continue,
            other => println!("unknown command: {other}"),
        }
    }
}

fn run_algorithm(graph: &AuthorGraph, lines: &mut impl Iterator<Item = io::Result<String>>) {
    print!("algorithm [SCC|ShortestPath]: ");
    let _ = io::stdout().flush();
    let Some(Ok(line)) = lines.next() else {
        return;
    };
    match line.trim() {
        "SCC" => run_scc(graph, lines),
        "ShortestPath" => run_shortest_path(graph, lines),
        other => println!("unknown algorithm: {other}"),
    }
}

fn run_scc(graph: &AuthorGraph, lines: &mut impl Iterator<Item = io::Result<String>>) {
    print!("query author id (blank for all nodes): ");
    let _ = io::stdout().flush();
    let Some(Ok(line)) = lines.next() else {
        return;
    };
    let trimmed = line.trim();
    let sccs = if trimmed.is_empty() {
        graph.tarjan_all()
    } else {
        let Ok(query) = trimmed.parse::<u64>() else {
            println!("invalid id");
            return;
        };
        graph.tarjan_from(query)
    };
    if sccs.is_empty() {
        println!("no components of size >= 2 found");
        return;
    }
    for (i, component) in sccs.iter().enumerate() {
        println!("component {i}: {component:?}");
    }
}

fn run_shortest_path(graph: &AuthorGraph, lines: &mut impl Iterator<Item = io::Result<String>>) {
    print!("start author id: ");
    let _ = io::stdout().flush();
    let Some(Ok(start_line)) = lines.next() else {
        return;
    };
    print!("destination author id: ");
    let _ = io::stdout().flush();
    let Some(Ok(dest_line)) = lines.next() else {
        return;
    };
    let (Ok(start), Ok(dest)) = (
        start_line.trim().parse::<u64>(),
        dest_line.trim().parse::<u64>(),
    ) else {
        println!("invalid id");
        return;
    };

    let path = graph.shortest_path(start, dest);
    if path.is_empty() {
        println!("no path found between {start} and {dest}");
        return;
    }
    println!(
        "{}",
        path.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
}

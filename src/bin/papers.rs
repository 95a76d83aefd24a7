//! Interactive citation-trace explorer over a paper-graph binary file.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use corpusgraph::graph::PaperGraph;
use corpusgraph::logging;

#[derive(Parser, Debug)]
#[command(name = "papers", about = "Trace paper citations via iterative DFS")]
struct Cli {
    /// Path to a paper-graph binary file.
    graph_path: PathBuf,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let graph = match PaperGraph::load_from_file(&cli.graph_path) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to load paper graph: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(nodes = graph.len(), "paper graph loaded");

    repl(&graph);
    ExitCode::SUCCESS
}

fn repl(graph: &PaperGraph) {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("papers> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        match line.trim() {
            "quit" => break,
            "run" => run_dfs(graph, &mut lines),
            "" => continue,
            other => println!("unknown command: {other}"),
        }
    }
}

fn run_dfs(graph: &PaperGraph, lines: &mut impl Iterator<Item = io::Result<String>>) {
    print!("source paper id: ");
    let _ = io::stdout().flush();
    let Some(Ok(line)) = lines.next() else {
        return;
    };
    let Ok(id) = line.trim().parse::<u32>() else {
        println!("invalid id");
        return;
    };

    let trace = graph.citation_trace(id);
    if trace.is_empty() {
        println!("no trace found for {id}");
        return;
    }
    for (parent, child) in trace {
        println!("{parent} -> {child}");
    }
}

//! `natded`: a command-line front end for the proof checker library.
//!
//! `natded check <file.json>` loads a whole-graph proof, verifies every
//! node, and exits non-zero if any node failed. `natded render` prints a
//! single node's formula back out in either surface syntax. `natded dot`
//! (only under the `dot` feature) exports the proof DAG to Graphviz.

use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use natded::graph::ProofGraph;
use natded::sexpr;
use natded::tptp;

#[derive(Parser)]
#[command(name = "natded")]
#[command(about = "A natural-deduction proof checker", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every node of a proof graph loaded from JSON.
    Check {
        /// Path to a proof graph JSON file (§6 schema: `nodes` + `links`).
        file: String,
    },
    /// Render one node's formula back out in surface syntax.
    Render {
        /// Path to a proof graph JSON file.
        file: String,
        /// The node id to render.
        #[arg(long)]
        node: u64,
        /// Render as TPTP instead of S-expression (requires a first-order formula).
        #[arg(long)]
        tptp: bool,
    },
    /// Export the proof DAG to Graphviz DOT.
    #[cfg(feature = "dot")]
    Dot {
        /// Path to a proof graph JSON file.
        file: String,
        /// Output path for the rendered DOT source.
        #[arg(long)]
        out: String,
    },
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn load_graph(path: &str) -> Result<ProofGraph, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(ProofGraph::from_json(&text)?)
}

/// Finds the dense index a JSON record's `id` field maps to. `ProofGraph`
/// indexes nodes by input position, not the JSON `id` field, so this
/// re-derives the mapping the same way `ProofGraph::from_json` built it.
fn node_index_for_id(path: &str, wanted: u64) -> Result<usize, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&text)?;
    let nodes = parsed["nodes"].as_array().ok_or("malformed proof graph JSON: missing `nodes`")?;
    nodes
        .iter()
        .position(|n| n["id"].as_u64() == Some(wanted))
        .ok_or_else(|| format!("no node with id {wanted}").into())
}

/// Prints a PASS/FAIL line per node and the first failing node's diagnostic
/// to stderr. Returns whether every node verified, for the CLI exit-code
/// contract (§6: 0 iff every node verified, non-zero otherwise).
fn run_check(file: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let graph = load_graph(file)?;
    let results = graph.verify_all();
    let mut first_failure: Option<String> = None;
    for (id, outcome) in &results {
        match outcome {
            Ok(_) => println!("node {id}: PASS"),
            Err(diag) => {
                println!("node {id}: FAIL");
                first_failure.get_or_insert_with(|| diag.to_string());
            }
        }
    }
    if let Some(msg) = &first_failure {
        eprintln!("{msg}");
    }
    Ok(first_failure.is_none())
}

fn run_render(file: &str, node: u64, as_tptp: bool) -> Result<(), Box<dyn std::error::Error>> {
    let graph = load_graph(file)?;
    let idx = node_index_for_id(file, node)?;
    let formula = &graph.node(idx).formula;
    if as_tptp {
        println!("{}", tptp::to_first_order_tptp(&format!("node{node}"), "axiom", formula)?);
    } else {
        println!("{}", sexpr::render(formula));
    }
    Ok(())
}

#[cfg(feature = "dot")]
fn run_dot(file: &str, out: &str) -> Result<(), Box<dyn std::error::Error>> {
    let graph = load_graph(file)?;
    fs::write(out, graph.write_dot())?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    SimpleLogger::new().with_level(level_for(cli.verbose)).init().expect("logger installs exactly once");

    match &cli.command {
        Commands::Check { file } => match run_check(file) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Render { file, node, tptp } => match run_render(file, *node, *tptp) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        #[cfg(feature = "dot")]
        Commands::Dot { file, out } => match run_dot(file, out) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

// Thin CLI entrypoint. Flag parsing, prompts, and output formatting are
// deliberately minimal — the rich CLI UX is an external collaborator
// (§1 Non-goals); this binary exists only so the crate has a runnable
// front door, wiring the in-process components together with in-memory/
// local-filesystem backends suitable for a single operator's machine.

use panka::config::PankaConfig;
use panka::graph::{Builder, GraphStats, Sorter};
use panka::parser::parse_stack;
use panka::Result;
use std::path::Path;
use std::process::ExitCode;

const EXIT_SUCCESS: u8 = 0;
const EXIT_GENERIC_FAILURE: u8 = 1;
const EXIT_VALIDATION_FAILURE: u8 = 2;

fn init_logging(config: &PankaConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let config = match PankaConfig::load(&cwd) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("panka: failed to load configuration: {e}");
            return ExitCode::from(EXIT_GENERIC_FAILURE);
        }
    };
    init_logging(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = match args.first().map(String::as_str) {
        Some("plan") => run_plan(args.get(1)),
        Some("validate") => run_validate(args.get(1)),
        _ => {
            print_usage();
            Ok(EXIT_GENERIC_FAILURE)
        }
    };

    match code {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("panka: {e}");
            ExitCode::from(EXIT_GENERIC_FAILURE)
        }
    }
}

fn print_usage() {
    eprintln!("usage: panka <plan|validate> <stack-path>");
}

fn run_validate(stack_path: Option<&String>) -> Result<u8> {
    let Some(path) = stack_path else {
        print_usage();
        return Ok(EXIT_GENERIC_FAILURE);
    };
    match parse_stack(Path::new(path), None) {
        Ok(result) => {
            for warning in &result.warnings {
                tracing::warn!(%warning, "parse warning");
            }
            println!(
                "stack {:?} parsed: {} components",
                result.stack.metadata.name,
                result.components.len()
            );
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("panka: validation failed: {e}");
            Ok(EXIT_VALIDATION_FAILURE)
        }
    }
}

fn run_plan(stack_path: Option<&String>) -> Result<u8> {
    let Some(path) = stack_path else {
        print_usage();
        return Ok(EXIT_GENERIC_FAILURE);
    };
    let parsed = match parse_stack(Path::new(path), None) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("panka: parse failed: {e}");
            return Ok(EXIT_VALIDATION_FAILURE);
        }
    };
    if !parsed.unresolved_references.is_empty() {
        for r in &parsed.unresolved_references {
            eprintln!("panka: unresolved dependency: {} -> {:?}", r.component, r.target);
        }
        return Ok(EXIT_VALIDATION_FAILURE);
    }
    let graph = match Builder::build(&parsed) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("panka: dependency graph failed: {e}");
            return Ok(EXIT_VALIDATION_FAILURE);
        }
    };
    let stats = GraphStats::compute(&graph);
    let batches = Sorter::get_deployment_batches(&graph, 10);
    println!(
        "stack {:?}: {} resources, {} deployment batches, max depth {}",
        parsed.stack.metadata.name,
        stats.node_count,
        batches.len(),
        stats.max_depth
    );
    Ok(EXIT_SUCCESS)
}

//! The `run` command: probe a registry, dispatch its fixtures, report.

use fixa_corpus::TargetBackend;

use crate::engine::CommandEngine;
use crate::result::{DispatchOutcome, SuiteSummary};
use crate::suite::{SuiteConfig, SuiteRunner};

use super::load_tree;

/// Run every selected fixture of a manifest through `engine`.
pub fn run_manifest(
    path: &str,
    engine: &CommandEngine,
    backend: Option<TargetBackend>,
    config: &SuiteConfig,
) {
    let tree = load_tree(path, backend);
    let runner = SuiteRunner::with_config(config.clone());

    match runner.run(&tree, engine) {
        Ok(summary) => {
            print_suite_summary(&summary, config.verbose);
            std::process::exit(summary.exit_code());
        }
        Err(cancelled) => {
            eprintln!("{cancelled}");
            std::process::exit(130);
        }
    }
}

/// Print the consistency probe and dispatch results.
pub fn print_suite_summary(summary: &SuiteSummary, verbose: bool) {
    if !summary.is_consistent() {
        println!("Consistency probe FAILED:");
        println!("{}", summary.consistency);
        println!();
    } else if verbose {
        println!("{}", summary.consistency);
        println!();
    }

    for result in &summary.results {
        match &result.outcome {
            DispatchOutcome::Passed => {
                if verbose {
                    println!("  PASS: {} ({:.2?})", result.name, result.duration);
                }
            }
            DispatchOutcome::Failed(failure) => {
                println!(
                    "  FAIL: {} [{}] - {}",
                    result.name, result.backend, failure.message
                );
                for cause in &failure.causes {
                    println!("        {cause}");
                }
            }
            DispatchOutcome::Skipped(reason) => {
                if verbose {
                    println!("  SKIP: {} - {reason}", result.name);
                }
            }
        }
    }

    println!();
    println!("Fixture Summary:");
    println!(
        "  {} passed, {} failed, {} skipped ({} total)",
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.total()
    );
    println!("  Completed in {:.2?}", summary.duration);

    println!();
    if summary.has_failures() {
        println!("FAILED");
    } else if summary.total() == 0 {
        println!("NO FIXTURES REGISTERED");
    } else {
        println!("OK");
    }
}

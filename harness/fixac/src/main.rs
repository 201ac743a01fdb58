//! Fixa CLI
//!
//! Keeps a test corpus and its registry honest, and runs the corpus.

use fixa_corpus::{SnapshotOptions, TargetBackend};
use fixac::commands::{
    check_manifest, locate_fixtures, parse_backend_flag, run_manifest, snapshot_corpus, RuleArgs,
};
use fixac::{CommandEngine, ConsistencyPolicy, SuiteConfig};

fn main() {
    fixac::init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "check" => {
            let mut manifest = None;
            let mut backend = None;
            for arg in args.iter().skip(2) {
                if let Some(parsed) = parse_backend_flag(arg) {
                    backend = Some(backend_or_exit(parsed));
                } else if !arg.starts_with('-') && manifest.is_none() {
                    manifest = Some(arg.as_str());
                }
            }

            let Some(manifest) = manifest else {
                eprintln!("Usage: fixa check <manifest.json> [--backend=<name>]");
                std::process::exit(1);
            };
            check_manifest(manifest, backend);
        }
        "run" => {
            // Everything after `--` belongs to the engine command.
            let (ours, engine_args) = match args.iter().position(|a| a == "--") {
                Some(split) => (&args[2..split], &args[split + 1..]),
                None => (&args[2..], &args[args.len()..]),
            };

            let mut manifest = None;
            let mut exec = None;
            let mut backend = None;
            let mut config = SuiteConfig::default();

            for arg in ours {
                if let Some(program) = arg.strip_prefix("--exec=") {
                    exec = Some(program.to_string());
                } else if let Some(filter) = arg.strip_prefix("--filter=") {
                    config.filter = Some(filter.to_string());
                } else if let Some(parsed) = parse_backend_flag(arg) {
                    backend = Some(backend_or_exit(parsed));
                } else if arg == "--verbose" || arg == "-v" {
                    config.verbose = true;
                } else if arg == "--no-parallel" {
                    config.parallel = false;
                } else if arg == "--strict" {
                    config.policy = ConsistencyPolicy::Abort;
                } else if !arg.starts_with('-') && manifest.is_none() {
                    manifest = Some(arg.as_str());
                }
            }

            let (Some(manifest), Some(exec)) = (manifest, exec) else {
                eprintln!(
                    "Usage: fixa run <manifest.json> --exec=<program> [options] [-- args...]"
                );
                eprintln!();
                eprintln!("Engine arguments may use {{path}} and {{backend}} placeholders.");
                std::process::exit(1);
            };
            let engine = CommandEngine::new(exec).args(engine_args.iter().cloned());
            run_manifest(manifest, &engine, backend, &config);
        }
        "snapshot" => {
            let mut root = None;
            let mut base = None;
            let mut rule = RuleArgs::default();
            let mut options = SnapshotOptions::default();

            for arg in args.iter().skip(2) {
                if rule.accept(arg) {
                    continue;
                }
                if let Some(dir) = arg.strip_prefix("--base=") {
                    base = Some(dir);
                } else if let Some(name) = arg.strip_prefix("--name=") {
                    options.name = Some(name.to_string());
                } else if let Some(parsed) = parse_backend_flag(arg) {
                    options.backend = Some(backend_or_exit(parsed));
                } else if arg == "--nest" {
                    options.nest = true;
                } else if !arg.starts_with('-') && root.is_none() {
                    root = Some(arg.as_str());
                }
            }

            let Some(root) = root else {
                eprintln!("Usage: fixa snapshot <root> --pattern=<regex> [options]");
                std::process::exit(1);
            };
            snapshot_corpus(root, base, &rule.rule_or_exit(), &options);
        }
        "locate" => {
            let mut root = None;
            let mut rule = RuleArgs::default();
            for arg in args.iter().skip(2) {
                if !rule.accept(arg) && !arg.starts_with('-') && root.is_none() {
                    root = Some(arg.as_str());
                }
            }

            let Some(root) = root else {
                eprintln!("Usage: fixa locate <root> --pattern=<regex> [--dirs] [--recursive]");
                std::process::exit(1);
            };
            locate_fixtures(root, &rule.rule_or_exit());
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("fixa {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn backend_or_exit(parsed: Result<TargetBackend, fixa_corpus::UnknownBackend>) -> TargetBackend {
    parsed.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Fixa - test corpus consistency and dispatch");
    println!();
    println!("Usage: fixa <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <manifest>     Check the registry against the fixtures on disk");
    println!("  run <manifest>       Check, then run every fixture through an engine");
    println!("  snapshot <root>      Print a manifest for the fixtures under <root>");
    println!("  locate <root>        List located fixtures and their ids");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Run options:");
    println!("  --exec=<program>     Engine program, run once per fixture");
    println!("  -- <args...>         Engine arguments ({{path}}, {{backend}} are substituted)");
    println!("  --filter=<pattern>   Only run fixtures whose name contains pattern");
    println!("  --verbose, -v        Show every result as it completes");
    println!("  --no-parallel        Run fixtures sequentially");
    println!("  --strict             Skip every fixture if the registry drifted");
    println!("  --backend=<name>     Default backend: ANY, JVM, JVM_IR, JS, JS_IR, WASM, NATIVE");
    println!();
    println!("Rule options (snapshot, locate):");
    println!("  --pattern=<regex>    Fixture name pattern; group 1 is the id stem");
    println!("  --dirs               Fixtures are directories");
    println!("  --recursive, -r      Descend into subdirectories");
    println!("  --exclude=<regex>    Skip matching names");
    println!();
    println!("Snapshot options:");
    println!("  --base=<dir>         Directory scope roots are relative to (default: .)");
    println!("  --nest               One scope per subdirectory");
    println!("  --name=<name>        Root scope display name");
    println!("  --backend=<name>     Backend override for the root scope");
    println!();
    println!("Examples:");
    println!(r"  fixa snapshot testData/codegen --pattern='(.+)\.kt' -r --nest > codegen.json");
    println!("  fixa check codegen.json");
    println!("  fixa run codegen.json --exec=./run-box -- --target={{backend}} {{path}}");
    println!("  fixa run codegen.json --exec=./run-box --filter=Bound --strict");
}

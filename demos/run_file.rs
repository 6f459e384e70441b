//! Example: Execute AudioScript programs from files
//!
//! Usage: cargo run --example run_file [--ast] <script.as | program.json>
//!
//! With `--ast` the file holds a JSON-serialized AST instead of source text.
//! Set `RUST_LOG=audioscript=debug` to watch scopes and calls.

use std::env;
use std::fs;
use std::process;

use anyhow::{bail, Context, Result};
use audioscript::{Evaluator, EvaluatorConfig, Execution, Parser, Program, Scanner};

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let (ast_input, file_path) = match args.as_slice() {
        [flag, path] if flag == "--ast" => (true, path),
        [path] => (false, path),
        _ => {
            eprintln!("Usage: cargo run --example run_file [--ast] <file>");
            eprintln!("\nExample scripts in demos/scripts/:");
            eprintln!("  - sum.as");
            eprintln!("  - modules.as");
            process::exit(1);
        }
    };

    match run(file_path, ast_input) {
        Ok(execution) => report(&execution),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(1);
        }
    }
}

fn run(file_path: &str, ast_input: bool) -> Result<Execution> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("reading {}", file_path))?;

    let program = if ast_input {
        serde_json::from_str::<Program>(&contents).context("decoding AST")?
    } else {
        let tokens = Scanner::new(&contents).scan_tokens()?;
        Parser::new(tokens).parse()?
    };
    if program.body.is_empty() && program.declarations.is_none() {
        bail!("{} contains no statements", file_path);
    }

    let mut evaluator = Evaluator::new().with_config(EvaluatorConfig::from_env());
    Ok(evaluator.execute(&program)?)
}

fn report(execution: &Execution) {
    for (index, value) in execution.results.iter().enumerate() {
        println!("[{}] {}", index + 1, value);
    }

    if !execution.globals.is_empty() {
        println!("\nGlobals:");
        for (name, value) in &execution.globals {
            match value {
                Some(value) => println!("  {} = {}", name, value),
                None => println!("  {} (unassigned)", name),
            }
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

//! Script runner
//!
//! Loads every script given on the command line, then runs them in order on a wgpu
//! adapter that satisfies their requirements. Each script draws or dispatches all of
//! its distinct pipelines once.
//!
//! # Usage
//! ```bash
//! cargo run --bin run_scripts -- [--config runner.yaml] [--fail-fast] script.shader_test...
//! ```
//!
//! The exit status is 0 when every script passed, 77 when some were skipped and none
//! failed, and 1 otherwise.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use vkscript_config::{Script, TestResult};
use vkscript_wgpu::{Executor, RunnerConfig, WgpuBackend, render_all};

/// Command-line arguments for the script runner
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Scripts to run, in order
    #[arg(required = true)]
    scripts: Vec<PathBuf>,

    /// YAML runner configuration
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Index of the adapter to use, overriding the configuration
    #[arg(long)]
    device_id: Option<usize>,

    /// Stop at the first failing script
    #[arg(long)]
    fail_fast: bool,

    /// Log cache decisions and adapter selection
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error installing logger: {e}");
    }

    let mut config = match &args.config {
        Some(path) => match RunnerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{}: {e}", path.display());
                process::exit(TestResult::Fail.exit_code());
            }
        },
        None => RunnerConfig::default(),
    };
    if args.device_id.is_some() {
        config.device_id = args.device_id;
    }
    config.fail_fast |= args.fail_fast;

    let mut result = TestResult::Pass;
    let mut scripts = Vec::with_capacity(args.scripts.len());
    for path in &args.scripts {
        match Script::from_file(path) {
            Ok(script) => scripts.push(script),
            Err(e) => {
                tracing::error!("{e}");
                result = result.merge(TestResult::Fail);
            }
        }
    }

    if !(config.fail_fast && result == TestResult::Fail) {
        let fail_fast = config.fail_fast;
        let mut executor = Executor::new(WgpuBackend::new(config));

        result = result.merge(executor.run_batch(&scripts, fail_fast, |_, resources| match render_all(resources.context, resources.window, resources.pipelines) {
            Ok(()) => TestResult::Pass,
            Err(e) => {
                tracing::error!("{e}");
                TestResult::Fail
            }
        }));
    }

    println!("{}", result.to_string().to_uppercase());
    process::exit(result.exit_code());
}

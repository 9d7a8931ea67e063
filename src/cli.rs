use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::executor::bench::DEFAULT_BENCH_TOOL;
use crate::parser::parse_duration;
use crate::runner::Mode;
use crate::runner::RunConfig;

/// Declarative end-to-end HTTP tests and benchmarks
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML file with end-to-end cases
    #[arg(short, long, default_value = "config.yaml")]
    pub path: PathBuf,

    /// Time limit for the whole suite, e.g. `10s`, `1m30s`
    #[arg(short, long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Execute the cases in benchmark mode
    #[arg(short, long)]
    pub bench: bool,

    /// Load generator used in benchmark mode
    #[arg(long, default_value = DEFAULT_BENCH_TOOL)]
    pub bench_tool: String,

    /// Only print log records, no progress lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            path: self.path.clone(),
            timeout: self.timeout,
            mode: if self.bench {
                Mode::Benchmark
            } else {
                Mode::Api
            },
            bench_tool: self.bench_tool.clone(),
        }
    }
}

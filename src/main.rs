use clap::Parser;
use endy::CaseError;
use endy::LoadError;
use endy::Runner;
use endy::cli::Cli;
use endy::load_suite;
use endy::logging;
use endy::outputter::OutPutter;
use miette::Diagnostic;
use miette::Result;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum EndyError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Case(#[from] CaseError),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = cli.run_config();

    // A missing secret ends up here too, so nothing is sent with a
    // half-resolved suite.
    let suite = load_suite(&config.path).map_err(EndyError::Load)?;

    let runner = Runner::new(config, OutPutter::new(!cli.quiet));
    let report = runner.run(&suite).await;

    tracing::info!(
        passed = report.results.len(),
        mode = ?report.mode,
        total = report.total,
        elapsed = ?report.elapsed,
        "run finished"
    );

    report.into_result().map_err(EndyError::Case)?;

    Ok(())
}

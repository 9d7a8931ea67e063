//! Runs declarative end-to-end HTTP checks, or hands each declared case to an
//! external load generator, and stops at the first failure.

pub mod asserter;
pub mod cli;
pub mod executor;
pub mod loader;
pub mod logging;
pub mod outputter;
pub mod parser;
pub mod runner;

pub use executor::CaseError;
pub use loader::LoadError;
pub use loader::Suite;
pub use loader::load_suite;
pub use runner::Mode;
pub use runner::RunConfig;
pub use runner::RunReport;
pub use runner::Runner;

mod runner;
pub mod shutdown;

pub use runner::{bootstrap, run, DbOptions, RunOptions, ShutdownOptions};

#[cfg(test)]
mod tests;

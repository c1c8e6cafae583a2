mod args;
mod commands;
mod logging;
mod reader;

pub use args::Cli;
pub use commands::run;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pullgauge")]
#[command(about = "Condense docker pull/push output into readable progress summaries", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Debug output
    #[arg(short, long, env = "DEBUG")]
    pub debug: bool,

    /// Quiet output (warnings and errors only)
    #[arg(short, long, env = "QUIET")]
    pub quiet: bool,

    /// Enqueue an extra snapshot every N seconds while input is quiet
    /// (0 disables the ticker)
    #[arg(long, default_value_t = 0, value_name = "SECS")]
    pub interval: u64,
}

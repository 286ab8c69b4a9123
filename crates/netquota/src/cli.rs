//! Clap derive structures for the `netquota` daemon.

use std::path::PathBuf;

use clap::Parser;

/// netquota -- per-period bandwidth accounting with quota alerts
#[derive(Debug, Parser)]
#[command(
    name = "netquota",
    version,
    about = "Track interface traffic per billing period and alert before the quota runs out",
    long_about = "Samples the byte counters of one network interface, keeps a running total \
        for the current billing period in a JSON file, and sends a Telegram alert when usage \
        crosses the warning threshold. Crossing the hard ratio sends a final alert and powers \
        the host off.\n\n\
        Runs in the foreground until killed; use a service manager to supervise it."
)]
pub struct Cli {
    /// Config and state file (JSON)
    #[arg(long, short = 'c', env = "NETQUOTA_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interface statistics source in /proc/net/dev format
    #[arg(
        long,
        env = "NETQUOTA_NET_DEV",
        value_name = "PATH",
        default_value = "/proc/net/dev"
    )]
    pub net_dev: PathBuf,

    /// Telegram request timeout in seconds
    #[arg(
        long,
        env = "NETQUOTA_TIMEOUT",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Run a single poll and exit instead of looping
    #[arg(long)]
    pub once: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

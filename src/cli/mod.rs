//! CLI definitions.

use crate::config::CliOverrides;
use clap::Parser;
use std::path::PathBuf;

/// Project-scoped issue tracker REST API (`SQLite`)
#[derive(Parser, Debug)]
#[command(name = "issue-tracker", author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on [default: 0.0.0.0]
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on [default: 3000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database path, or `:memory:` [default: issues.db]
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory holding `public/` and `views/` for the browser front end
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// `SQLite` busy timeout in ms
    #[arg(long)]
    pub lock_timeout: Option<u64>,

    /// YAML config file [default: ./issue-tracker.yaml if present]
    #[arg(long, env = "ISSUE_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Flags that take part in config layering. Unset flags stay `None`.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            bind: self.bind.clone(),
            port: self.port,
            db: self.db.clone(),
            static_dir: self.static_dir.clone(),
            lock_timeout: self.lock_timeout,
            log_json: self.log_json.then_some(true),
        }
    }
}

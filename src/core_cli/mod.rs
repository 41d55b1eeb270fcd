use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferroftpd", about = "An FTP server exposing a rooted, virtualized view of local storage.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the control port from the configuration
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the storage root from the configuration
    #[arg(short, long)]
    pub root: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

use clap::{Parser, Subcommand};

/// The command line of the Water Lock application shell.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the Water Lock screen and react to gestures typed on stdin.
    Run(RunCmd),
    /// Tap the Water Lock icon once, print the status and exit.
    Tap(RunCmd),
}

/// Arguments shared by all subcommands.
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to the configuration TOML file.
    /// If not provided, default values will be used.
    #[arg(short, long)]
    pub config: Option<String>,
}

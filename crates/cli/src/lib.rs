pub mod driver;
pub mod host;
mod shell;
pub mod show;
pub mod view;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "usagescope",
    version,
    about = "Quick usages popup for symbols in a source tree",
    long_about = "Usagescope finds the usages of the symbol at a position (or of a name) and presents \
                  them the way an editor's Show Usages popup does: a short, incrementally filled list \
                  that jumps straight to a single result."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the usages popup once and print it
    Show {
        /// File containing the symbol
        #[arg(value_name = "FILE", required_unless_present = "name")]
        file: Option<PathBuf>,
        /// 1-based line of the caret
        #[arg(default_value_t = 1)]
        line: usize,
        /// 1-based column of the caret
        #[arg(default_value_t = 1)]
        col: usize,
        /// Search for a name instead of resolving a position
        #[arg(long, conflicts_with = "file")]
        name: Option<String>,
        /// Project root. Defaults to the current directory.
        #[arg(long, value_name = "PROJECT_PATH")]
        root: Option<PathBuf>,
        /// Candidate to use when several declarations match
        #[arg(long)]
        pick: Option<usize>,
        /// Open this row of the final popup
        #[arg(long)]
        choose: Option<usize>,
        /// Load this many extra pages of usages
        #[arg(long, default_value_t = 0)]
        more: usize,
        /// Print the popup as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start an interactive shell driving the popup
    #[command(
        long_about = "Starts an interactive shell where `usages` opens the popup and further \
                            commands select, open, filter or widen the search."
    )]
    Shell {
        /// Project root. Defaults to current directory.
        #[arg(value_name = "PROJECT_PATH")]
        path: Option<PathBuf>,
        /// Rows the popup may use
        #[arg(long)]
        rows: Option<usize>,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Show { .. } => "show",
        Commands::Shell { .. } => "shell",
    };
    let _guard = usagescope_runtime::init_logging(component, false);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Show {
            file,
            line,
            col,
            name,
            root,
            pick,
            choose,
            more,
            json,
        } => {
            let root = match root {
                Some(root) => root,
                None => std::env::current_dir()?,
            };
            rt.block_on(show::run(show::ShowArgs {
                root,
                file,
                line,
                col,
                name,
                pick,
                choose,
                more,
                json,
            }))
        }
        Commands::Shell { path, rows } => rt.block_on(shell::run(path, rows)),
    }
}

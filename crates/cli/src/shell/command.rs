use crate::host::OptionsEdit;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use usagescope_api::{FilterRule, SearchScope};

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum CliFilter {
    Imports,
    Comments,
    Reads,
    Writes,
}

impl From<CliFilter> for FilterRule {
    fn from(filter: CliFilter) -> Self {
        match filter {
            CliFilter::Imports => FilterRule::Imports,
            CliFilter::Comments => FilterRule::Comments,
            CliFilter::Reads => FilterRule::Reads,
            CliFilter::Writes => FilterRule::Writes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum CliScope {
    Project,
    Everywhere,
}

/// Scope flags shared by `usages` and `settings`.
#[derive(clap::Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeArgs {
    /// Search scope
    #[arg(long, value_enum, conflicts_with_all = ["file", "dir"])]
    pub scope: Option<CliScope>,
    /// Search a single file
    #[arg(long, value_name = "PATH", conflicts_with = "dir")]
    pub file: Option<PathBuf>,
    /// Search below a directory
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,
}

impl ScopeArgs {
    pub fn scope(&self) -> Option<SearchScope> {
        if let Some(file) = &self.file {
            return Some(SearchScope::File(file.clone()));
        }
        if let Some(dir) = &self.dir {
            return Some(SearchScope::Directory(dir.clone()));
        }
        self.scope.as_ref().map(|scope| match scope {
            CliScope::Project => SearchScope::Project,
            CliScope::Everywhere => SearchScope::Everywhere,
        })
    }
}

/// Helper struct for Clap parsing within the shell
#[derive(Parser, Clone, Debug)]
#[command(no_binary_name = true)]
pub enum ShellCommand {
    /// Show usages of the symbol at a position (1-based line and column)
    Usages {
        /// File containing the symbol
        path: Option<PathBuf>,
        /// Line of the caret
        line: Option<usize>,
        /// Column of the caret
        col: Option<usize>,
        /// Search for a name instead of resolving a position
        #[arg(long, conflicts_with = "path")]
        name: Option<String>,
        /// Candidate to use when several declarations match
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Move the popup selection
    Select { row: usize },
    /// Open a row (the selected one by default)
    Open { row: Option<usize> },
    /// Show the next page of usages
    More,
    /// Search again in the widest scope
    Everywhere,
    /// Hand the search over to the usages panel
    Full,
    /// Change the search options and search again
    Settings {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Include or skip occurrences in comments
        #[arg(long)]
        text: Option<bool>,
    },
    /// Toggle a display filter
    Filter {
        #[arg(value_enum)]
        rule: CliFilter,
    },
    /// Select the first row containing the text
    Find { query: String },
    /// Print the popup again
    Show,
    /// Close the popup
    Close,
    /// Dismiss hints
    Hide,
    /// Clear the screen
    Clear,
}

impl ShellCommand {
    /// Automatically generates the list of available command names from the enum.
    pub fn command_names() -> Vec<String> {
        use clap::CommandFactory;
        let cmd = Self::command();
        let mut names = vec!["help".to_string(), "exit".to_string(), "quit".to_string()];
        names.extend(cmd.get_subcommands().map(|s| s.get_name().to_string()));
        names
    }

    pub fn options_edit(scope: &ScopeArgs, text: Option<bool>) -> OptionsEdit {
        OptionsEdit {
            scope: scope.scope(),
            text_occurrences: text,
        }
    }
}

pub fn parse_shell_command(
    input: &str,
) -> Result<Option<ShellCommand>, Box<dyn std::error::Error>> {
    // Use shlex to split arguments while respecting quotes
    let args = shlex::split(input).ok_or("Invalid quoting")?;

    match ShellCommand::try_parse_from(args) {
        Ok(c) => Ok(Some(c)),
        Err(e) => {
            if e.kind() == ErrorKind::DisplayHelp || e.kind() == ErrorKind::DisplayVersion {
                println!("{}", e);
                return Ok(None);
            }
            Err(Box::new(e))
        }
    }
}

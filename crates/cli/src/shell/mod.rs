mod command;
mod highlighter;
mod prompt;

use reedline::{
    ColumnarMenu, DefaultCompleter, DefaultHinter, Emacs, FileBackedHistory, KeyCode,
    KeyModifiers, MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal,
    default_emacs_keybindings,
};
use std::path::PathBuf;
use tracing::info;
use usagescope_api::{PositionContext, SearchTarget};
use usagescope_core::{ActionId, Invocation, UserAction};

use self::command::{ShellCommand, parse_shell_command};
use self::highlighter::CommandHighlighter;
use self::prompt::DefaultPrompt;
use crate::driver::Driver;

// Shell configuration constants
const SHELL_HISTORY_SIZE: usize = 500;

pub struct ReplServer {
    driver: Driver,
    project_path: PathBuf,
    rt_handle: tokio::runtime::Handle,
}

impl ReplServer {
    pub fn new(project_path: PathBuf, rows: Option<usize>) -> Self {
        Self {
            driver: Driver::new(project_path.clone(), rows, false),
            project_path,
            rt_handle: tokio::runtime::Handle::current(),
        }
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        println!("Project: {:?}", self.project_path);
        println!("Type 'help' for commands.");

        let mut line_editor = self.setup_line_editor();
        loop {
            let title = self.driver.popup().map(|p| p.title.text());
            let prompt = DefaultPrompt::new(title);
            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(buffer)) => {
                    let trimmed = buffer.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if trimmed == "exit" || trimmed == "quit" {
                        break;
                    }

                    match parse_shell_command(trimmed) {
                        Ok(Some(ShellCommand::Clear)) => {
                            let _ = line_editor.clear_screen();
                        }
                        Ok(Some(cmd)) => {
                            let handle = self.rt_handle.clone();
                            handle.block_on(self.execute(cmd));
                        }
                        Ok(None) => {} // Help or handled by Clap
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                    println!("Bye!");
                    break;
                }
                Ok(other) => println!("Event: {:?}", other),
                Err(e) => return Err(e.into()),
            }
        }
        self.driver.usages().close();
        Ok(())
    }

    async fn execute(&mut self, cmd: ShellCommand) {
        info!(?cmd, "shell command");
        let action = match cmd {
            ShellCommand::Usages {
                path,
                line,
                col,
                name,
                pick,
            } => {
                let invocation = match (name, path) {
                    (Some(name), _) => Invocation::Target(SearchTarget::new(name)),
                    (None, Some(path)) => Invocation::At(PositionContext::new(
                        path,
                        line.unwrap_or(1).saturating_sub(1),
                        col.unwrap_or(1).saturating_sub(1),
                    )),
                    (None, None) => {
                        eprintln!("Error: give a position (path line col) or --name");
                        return;
                    }
                };
                self.driver.host().stage_pick(pick);
                self.driver.start(invocation).await;
                return;
            }
            ShellCommand::Show => {
                self.driver.print_popup();
                return;
            }
            ShellCommand::Hide => {
                self.driver.usages().hide_hints();
                return;
            }
            ShellCommand::Select { row } => UserAction::Select(row),
            ShellCommand::Open { row } => UserAction::Choose(row),
            ShellCommand::More => match self.driver.more_row() {
                Some(row) => UserAction::Choose(Some(row)),
                None => {
                    println!("All usages are shown.");
                    return;
                }
            },
            ShellCommand::Everywhere => UserAction::Invoke(ActionId::SearchEverywhere),
            ShellCommand::Full => UserAction::Invoke(ActionId::OpenFullView),
            ShellCommand::Settings { scope, text } => {
                let edit = ShellCommand::options_edit(&scope, text);
                self.driver.host().stage_edit(edit);
                UserAction::Invoke(ActionId::OpenSettings)
            }
            ShellCommand::Filter { rule } => UserAction::Invoke(ActionId::ToggleFilter(rule.into())),
            ShellCommand::Find { query } => UserAction::SpeedSearch(query),
            ShellCommand::Close => UserAction::Close,
            ShellCommand::Clear => return,
        };

        if !self.driver.dispatch(action).await {
            println!("No popup is showing.");
        }
    }

    fn setup_line_editor(&self) -> Reedline {
        let commands = ShellCommand::command_names();

        let mut completer = DefaultCompleter::with_inclusions(&['-', '_']);
        completer.insert(commands.clone());
        let completion_menu = Box::new(ColumnarMenu::default().with_name("completion_menu"));

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu("completion_menu".to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let mut line_editor = Reedline::create()
            .with_completer(Box::new(completer))
            .with_highlighter(Box::new(CommandHighlighter::new(commands)))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(
                    nu_ansi_term::Style::new()
                        .italic()
                        .fg(nu_ansi_term::Color::LightGray),
                ),
            ))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        let history = history_file()
            .and_then(|path| FileBackedHistory::with_file(SHELL_HISTORY_SIZE, path).ok());
        if let Some(history) = history {
            line_editor = line_editor.with_history(Box::new(history));
        }
        line_editor
    }
}

fn history_file() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".usagescope");
    path.push("shell");
    std::fs::create_dir_all(&path).ok()?;
    path.push("history");
    Some(path)
}

pub async fn run(path: Option<PathBuf>, rows: Option<usize>) -> anyhow::Result<()> {
    let project_path = match path {
        Some(p) => p,
        None => std::env::current_dir()?.canonicalize()?,
    };
    let server = ReplServer::new(project_path, rows);
    // the line editor blocks, keep it off the async workers
    tokio::task::spawn_blocking(move || server.run()).await?
}

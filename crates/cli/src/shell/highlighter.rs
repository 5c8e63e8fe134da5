use super::command::CliFilter;
use clap::ValueEnum;
use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

/// What a word of the input line is, given the command it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Command,
    UnknownCommand,
    Flag,
    Path,
    Number,
    FilterRule,
    Invalid,
    Text,
    Space,
}

impl Token {
    fn style(self) -> Style {
        match self {
            Token::Command => Style::new().fg(Color::LightGreen).bold(),
            Token::UnknownCommand | Token::Invalid => Style::new().fg(Color::Red),
            Token::Flag => Style::new().fg(Color::Cyan),
            Token::Path => Style::new().fg(Color::Yellow),
            Token::Number => Style::new().fg(Color::Purple),
            Token::FilterRule => Style::new().fg(Color::Magenta),
            Token::Text | Token::Space => Style::new(),
        }
    }
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

fn is_filter_rule(word: &str) -> bool {
    CliFilter::value_variants()
        .iter()
        .filter_map(|rule| rule.to_possible_value())
        .any(|value| value.matches(word, false))
}

/// Colors shell input: the command, its flags, and arguments by what the
/// command expects (row numbers, positions, filter rules).
pub struct CommandHighlighter {
    commands: Vec<String>,
}

impl CommandHighlighter {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    fn classify(&self, command: Option<&str>, previous: Option<&str>, word: &str) -> Token {
        let Some(command) = command else {
            return if self.commands.iter().any(|c| c == word) {
                Token::Command
            } else {
                Token::UnknownCommand
            };
        };
        if word.starts_with('-') {
            return Token::Flag;
        }
        match (command, previous) {
            (_, Some("--pick")) => number_or_invalid(word),
            (_, Some("--file" | "--dir")) => Token::Path,
            ("select" | "open", _) => number_or_invalid(word),
            ("filter", _) if is_filter_rule(word) => Token::FilterRule,
            ("filter", _) => Token::Invalid,
            ("usages", _) if is_number(word) => Token::Number,
            ("usages", Some(flag)) if flag == "--name" => Token::Text,
            ("usages", _) => Token::Path,
            _ => Token::Text,
        }
    }
}

fn number_or_invalid(word: &str) -> Token {
    if is_number(word) {
        Token::Number
    } else {
        Token::Invalid
    }
}

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        let mut command: Option<&str> = None;
        let mut previous: Option<&str> = None;

        for chunk in line.split_inclusive(char::is_whitespace) {
            let word = chunk.trim();
            let token = if word.is_empty() {
                Token::Space
            } else {
                let token = self.classify(command, previous, word);
                if command.is_none() {
                    command = Some(word);
                }
                previous = Some(word);
                token
            };
            styled.push((token.style(), chunk.to_string()));
        }
        styled
    }
}

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CommandError;

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\S+)(?:\s+(.*))?$").expect("command pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectTarget {
    /// 1-based position in the history list.
    Position(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    New,
    History,
    Select(SelectTarget),
    Show,
    Voice,
    Theme,
    Sidebar,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Anything that is not a slash command is a query.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(captures) = COMMAND_RE.captures(line.trim()) else {
            return Ok(Command::Ask(line.to_string()));
        };

        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let argument = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|arg| !arg.is_empty());

        match name {
            "new" => Ok(Command::New),
            "history" => Ok(Command::History),
            "show" => Ok(Command::Show),
            "voice" => Ok(Command::Voice),
            "theme" => Ok(Command::Theme),
            "sidebar" => Ok(Command::Sidebar),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "select" => {
                let argument = argument.ok_or(CommandError::MissingArgument("select"))?;
                Ok(Command::Select(parse_select_target(argument)))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

// Conversation ids are millisecond timestamps, far larger than any list position.
fn parse_select_target(argument: &str) -> SelectTarget {
    match argument.parse::<usize>() {
        Ok(position) if argument.len() < 10 => SelectTarget::Position(position),
        _ => SelectTarget::Id(argument.to_string()),
    }
}

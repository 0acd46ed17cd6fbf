/// A prefixed utility command, e.g. `u!ping`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ping" => Some(Command::Ping),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Parse `text` as a command if it starts with `prefix`.
///
/// The name is the first word after the prefix, lowercased. Anything after it
/// is ignored.
pub fn parse_command(prefix: &str, text: &str) -> Option<ParsedCommand> {
    if prefix.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(prefix)?;
    let name = rest.split_whitespace().next().unwrap_or("").to_lowercase();
    Some(ParsedCommand { name })
}

use std::path::PathBuf;

use thiserror::Error;

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Load(PathBuf),
    /// Names separated by whitespace or commas, one candidate each.
    Paste(String),
    Add(String),
    Select(String),
    SelectAll,
    SelectNone,
    Unselect(String),
    Clear,
    Batch,
    Slow(u32),
    Yes,
    No,
    Refresh,
    Details(String),
    Close,
    Cancel(String),
    ClearBatches,
    Token,
    Log,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CommandError {
    #[error("Unknown command: {0} (type `help`)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "load" => Command::Load(PathBuf::from(required(rest, "load <path>")?)),
        "paste" => {
            let names: Vec<&str> = rest
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|name| !name.is_empty())
                .collect();
            if names.is_empty() {
                return Err(CommandError::Usage("paste <name> [name...]"));
            }
            Command::Paste(names.join("\n"))
        }
        "add" => Command::Add(required(rest, "add <name>")?.to_string()),
        "select" => match required(rest, "select <name|all|none>")? {
            "all" => Command::SelectAll,
            "none" => Command::SelectNone,
            name => Command::Select(name.to_string()),
        },
        "unselect" => Command::Unselect(required(rest, "unselect <name>")?.to_string()),
        "clear" => Command::Clear,
        "batch" => Command::Batch,
        "slow" => {
            let minutes = required(rest, "slow <minutes>")?
                .parse::<u32>()
                .map_err(|_| CommandError::Usage("slow <minutes>"))?;
            Command::Slow(minutes)
        }
        "yes" | "y" => Command::Yes,
        "no" | "n" => Command::No,
        "refresh" | "r" => Command::Refresh,
        "details" => Command::Details(required(rest, "details <operation-id>")?.to_string()),
        "close" => Command::Close,
        "cancel" => Command::Cancel(required(rest, "cancel <operation-id>")?.to_string()),
        "clear-batches" => Command::ClearBatches,
        "token" => Command::Token,
        "log" => Command::Log,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(CommandError::Unknown(verb.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn paste_splits_on_spaces_and_commas() {
        assert_eq!(
            parse_command("paste @alice bob,carol  , dave"),
            Ok(Some(Command::Paste("@alice\nbob\ncarol\ndave".to_string())))
        );
        assert_eq!(
            parse_command("paste"),
            Err(CommandError::Usage("paste <name> [name...]"))
        );
    }

    #[test]
    fn selection_keywords() {
        assert_eq!(parse_command("select all"), Ok(Some(Command::SelectAll)));
        assert_eq!(parse_command("SELECT none"), Ok(Some(Command::SelectNone)));
        assert_eq!(
            parse_command("select Alice"),
            Ok(Some(Command::Select("Alice".to_string())))
        );
    }

    #[test]
    fn load_keeps_paths_with_spaces() {
        assert_eq!(
            parse_command("load  my follows.csv "),
            Ok(Some(Command::Load(PathBuf::from("my follows.csv"))))
        );
    }

    #[test]
    fn slow_needs_a_number() {
        assert_eq!(parse_command("slow 30"), Ok(Some(Command::Slow(30))));
        assert_eq!(
            parse_command("slow soon"),
            Err(CommandError::Usage("slow <minutes>"))
        );
    }

    #[test]
    fn unknown_verbs_are_reported() {
        assert_eq!(
            parse_command("unfollow everyone"),
            Err(CommandError::Unknown("unfollow".to_string()))
        );
    }
}

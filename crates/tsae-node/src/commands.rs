//! Interactive commands read from stdin.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { title: String, body: String },
    Remove { title: String },
    List,
    Log,
    Summary,
    Disconnect,
    Connect,
    Sync,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{command} needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let command = match name {
        "add" => {
            let title = words.next().ok_or(CommandError::MissingArgument {
                command: "add",
                argument: "title",
            })?;
            let body = words.collect::<Vec<_>>().join(" ");
            if body.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "add",
                    argument: "body",
                });
            }
            Command::Add {
                title: title.to_string(),
                body,
            }
        }
        "remove" => {
            let title = words.next().ok_or(CommandError::MissingArgument {
                command: "remove",
                argument: "title",
            })?;
            Command::Remove {
                title: title.to_string(),
            }
        }
        "list" => Command::List,
        "log" => Command::Log,
        "summary" => Command::Summary,
        "disconnect" => Command::Disconnect,
        "connect" => Command::Connect,
        "sync" => Command::Sync,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_multi_word_body() {
        assert_eq!(
            parse("add pancakes flour eggs  milk").unwrap(),
            Some(Command::Add {
                title: "pancakes".into(),
                body: "flour eggs milk".into(),
            })
        );
    }

    #[test]
    fn add_requires_title_and_body() {
        assert!(matches!(
            parse("add"),
            Err(CommandError::MissingArgument { argument: "title", .. })
        ));
        assert!(matches!(
            parse("add toast"),
            Err(CommandError::MissingArgument { argument: "body", .. })
        ));
    }

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse("  sync ").unwrap(), Some(Command::Sync));
        assert_eq!(parse("remove toast").unwrap(), Some(Command::Remove { title: "toast".into() }));
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("fly").unwrap_err(), CommandError::Unknown("fly".into()));
    }
}

//! Console command parsing

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::records::{Field, RecordId, ValidationError};

/// Which chart(s) to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Both,
    Bar,
    Scatter,
    /// Datasets and options as JSON, for an external chart library
    Json,
}

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    /// Empty term clears the search
    Search(String),
    Page(usize),
    Next,
    Prev,
    Add,
    Edit(RecordId),
    Set(Field, String),
    Save,
    Cancel,
    Delete(RecordId),
    Import { path: PathBuf, dry_run: bool },
    Chart(ChartKind),
    Refresh,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Field(#[from] ValidationError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "help" | "?" => Command::Help,
            "list" | "ls" => Command::List,
            "search" | "filter" => Command::Search(rest.to_string()),
            "page" => Command::Page(
                rest.parse()
                    .map_err(|_| CommandError::Usage("page <number>"))?,
            ),
            "next" | "n" => Command::Next,
            "prev" | "previous" | "p" => Command::Prev,
            "add" | "new" => Command::Add,
            "edit" => Command::Edit(required_id(rest, "edit <id>")?),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Usage("set <field> <value>"))?;
                Command::Set(field.parse()?, value.trim().to_string())
            }
            "save" | "update" => Command::Save,
            "cancel" => Command::Cancel,
            "delete" | "rm" => Command::Delete(required_id(rest, "delete <id>")?),
            "import" => parse_import(rest)?,
            "chart" | "charts" => Command::Chart(match rest.to_lowercase().as_str() {
                "" => ChartKind::Both,
                "bar" => ChartKind::Bar,
                "scatter" => ChartKind::Scatter,
                "json" => ChartKind::Json,
                _ => return Err(CommandError::Usage("chart [bar|scatter|json]")),
            }),
            "refresh" | "reload" => Command::Refresh,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

fn required_id(rest: &str, usage: &'static str) -> Result<RecordId, CommandError> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        Err(CommandError::Usage(usage))
    } else {
        Ok(RecordId::from(rest))
    }
}

fn parse_import(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "import <path> [--dry-run]";

    let mut dry_run = false;
    let mut path = None;
    for part in rest.split_whitespace() {
        if part == "--dry-run" {
            dry_run = true;
        } else if path.is_none() {
            path = Some(PathBuf::from(part));
        } else {
            return Err(CommandError::Usage(USAGE));
        }
    }

    Ok(Command::Import {
        path: path.ok_or(CommandError::Usage(USAGE))?,
        dry_run,
    })
}

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  list                      show the current page
  search [term]             filter by location or region (no term clears)
  page <n> | next | prev    move between pages
  add                       fill in and submit a new record
  edit <id>                 open a record for editing
  set <field> <value>       change a field of the open record
  save | cancel             submit or discard the open edit
  delete <id>               delete a record
  import <path> [--dry-run] bulk-create records from CSV
  chart [bar|scatter|json]  draw charts for the filtered records
  refresh                   reload records from the store
  quit                      leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!("list".parse::<Command>().unwrap(), Command::List);
        assert_eq!("  NEXT ".parse::<Command>().unwrap(), Command::Next);
        assert_eq!("page 3".parse::<Command>().unwrap(), Command::Page(3));
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_search_keeps_spaces_and_allows_empty() {
        assert_eq!(
            "search Region VII".parse::<Command>().unwrap(),
            Command::Search("Region VII".to_string())
        );
        assert_eq!(
            "search".parse::<Command>().unwrap(),
            Command::Search(String::new())
        );
    }

    #[test]
    fn test_set_takes_rest_of_line() {
        assert_eq!(
            "set regions Region VII".parse::<Command>().unwrap(),
            Command::Set(Field::Regions, "Region VII".to_string())
        );
        assert_eq!(
            "set cases".parse::<Command>().unwrap_err(),
            CommandError::Usage("set <field> <value>")
        );
        assert!(matches!(
            "set province X".parse::<Command>().unwrap_err(),
            CommandError::Field(ValidationError::UnknownField(_))
        ));
    }

    #[test]
    fn test_ids_are_required() {
        assert_eq!(
            "delete abc".parse::<Command>().unwrap(),
            Command::Delete(RecordId::from("abc"))
        );
        assert_eq!(
            "edit".parse::<Command>().unwrap_err(),
            CommandError::Usage("edit <id>")
        );
    }

    #[test]
    fn test_import() {
        assert_eq!(
            "import data.csv --dry-run".parse::<Command>().unwrap(),
            Command::Import {
                path: PathBuf::from("data.csv"),
                dry_run: true
            }
        );
        assert!("import".parse::<Command>().is_err());
    }

    #[test]
    fn test_chart_and_errors() {
        assert_eq!(
            "chart json".parse::<Command>().unwrap(),
            Command::Chart(ChartKind::Json)
        );
        assert_eq!("".parse::<Command>().unwrap_err(), CommandError::Empty);
        assert_eq!(
            "frobnicate".parse::<Command>().unwrap_err(),
            CommandError::Unknown("frobnicate".to_string())
        );
        assert!("page two".parse::<Command>().is_err());
    }
}

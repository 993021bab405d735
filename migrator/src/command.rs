//! Textual command surface.
//!
//! Entry points receive commands as argument lists, e.g. `["up", "3"]`.
//! [`Command::parse`] turns them into a typed [`Command`] the
//! [`Migrator`](crate::migrator::Migrator) can execute.

use crate::errors::{ErrorKind, MigratorError, MigratorResult};
use std::fmt::{Display, Formatter};

/// A migrator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Records the zero migration in an empty history.
    Init,
    /// Applies pending migrations up to `target`, or all of them.
    Up { target: Option<i64> },
    /// Reverts the current migration.
    Down,
    /// Reverts every applied migration back to version 0.
    Reset,
    /// Reports the current version.
    Version,
    /// Rewrites the history to end at `target` without running any body.
    SetVersion { target: i64 },
}

impl Command {
    /// Parses a command from its arguments. Arguments after the ones a
    /// command uses are ignored.
    ///
    /// # Errors
    ///
    /// - `ErrorKind::CommandRequired` for an empty argument list
    /// - `ErrorKind::UnexpectedCommand` for an unknown command name
    /// - `ErrorKind::InvalidVersionFormat` if a version is not an integer
    /// - `ErrorKind::VersionNumberRequired` if `set_version` has no version
    ///
    /// # Examples
    ///
    /// ```rust
    /// use migrator::command::Command;
    ///
    /// assert_eq!(Command::parse(&["up"]).unwrap(), Command::Up { target: None });
    /// assert_eq!(
    ///     Command::parse(&["set_version", "4"]).unwrap(),
    ///     Command::SetVersion { target: 4 }
    /// );
    /// ```
    pub fn parse<S: AsRef<str>>(args: &[S]) -> MigratorResult<Command> {
        let (name, rest) = match args.split_first() {
            Some((name, rest)) => (name.as_ref(), rest),
            None => return Err(MigratorError::of_kind(ErrorKind::CommandRequired)),
        };

        match name {
            "init" => Ok(Command::Init),
            "up" => Ok(Command::Up {
                target: parse_version(rest, false)?,
            }),
            "down" => Ok(Command::Down),
            "reset" => Ok(Command::Reset),
            "version" => Ok(Command::Version),
            "set_version" => match parse_version(rest, true)? {
                Some(target) => Ok(Command::SetVersion { target }),
                None => Err(MigratorError::of_kind(ErrorKind::VersionNumberRequired)),
            },
            other => Err(MigratorError::of_kind(ErrorKind::UnexpectedCommand {
                command: other.to_string(),
            })),
        }
    }

    /// `true` for commands that may write to the history.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::Version)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Up { .. } => "up",
            Command::Down => "down",
            Command::Reset => "reset",
            Command::Version => "version",
            Command::SetVersion { .. } => "set_version",
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Up {
                target: Some(target),
            } => write!(f, "up {}", target),
            Command::SetVersion { target } => write!(f, "set_version {}", target),
            other => write!(f, "{}", other.name()),
        }
    }
}

fn parse_version<S: AsRef<str>>(args: &[S], required: bool) -> MigratorResult<Option<i64>> {
    let argument = match args.first() {
        Some(argument) => argument.as_ref(),
        None if required => return Err(MigratorError::of_kind(ErrorKind::VersionNumberRequired)),
        None => return Ok(None),
    };

    argument.parse::<i64>().map(Some).map_err(|_| {
        MigratorError::of_kind(ErrorKind::InvalidVersionFormat {
            argument: argument.to_string(),
        })
    })
}

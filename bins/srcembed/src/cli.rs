use std::fmt;

pub const HELP: &str = "\
usage: srcembed [--help] || ([--varname <variable name>] <language>)

function: Converts input byte stream into source file (output through stdout).

arguments:
\t[--help]                      --> displays help text
\t[--varname <variable name>]   --> specifies the variable name by which the embedded file shall be referred to in code
\t<language>                    --> specifies the source language

supported languages (possible inputs for <language> field):
\tc++
\tc
";

pub const DEFAULT_VARNAME: &str = "data";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Embed { varname: String, language: String },
}

#[derive(Debug, PartialEq, Eq)]
pub enum UsageError {
    NotEnoughArgs,
    TooManyArgs,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UsageError::NotEnoughArgs => "not enough args",
            UsageError::TooManyArgs => "too many args",
        })
    }
}

/// Parses the arguments following the program name.
///
/// Only the first argument is inspected for flags; whatever follows is taken
/// positionally.
pub fn parse(args: &[String]) -> Result<Command, UsageError> {
    let Some(first) = args.first() else {
        return Err(UsageError::NotEnoughArgs);
    };

    match first.as_str() {
        "--help" if args.len() == 1 => Ok(Command::Help),
        "--help" => Err(UsageError::TooManyArgs),
        "--varname" => match args {
            [_, varname, language] => Ok(Command::Embed {
                varname: varname.clone(),
                language: language.clone(),
            }),
            _ if args.len() < 3 => Err(UsageError::NotEnoughArgs),
            _ => Err(UsageError::TooManyArgs),
        },
        _ if args.len() == 1 => Ok(Command::Embed {
            varname: DEFAULT_VARNAME.to_string(),
            language: first.clone(),
        }),
        _ => Err(UsageError::TooManyArgs),
    }
}

//! Line parser for the interactive prompt.

use std::path::PathBuf;

use client_core::Command;
use shared::domain::{Algorithm, UnknownAlgorithm};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  auth <master key>            unlock the client
  logout                       sign out and reset attempts
  encrypt <AES|DES|RSA> <text> encrypt text
  decrypt <AES|DES|RSA> <text> decrypt base64 ciphertext
  select <path>                pick a file (max 500 MB)
  clear                        drop the selected file
  clear-text                   reset the text panel
  encrypt-file <AES|DES|RSA>   encrypt the selected file
  decrypt-file <AES|DES|RSA>   decrypt the selected file
  download                     save the last produced file
  status                       show session and file state
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Help,
    Quit,
    Command(Command),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help' for the list")]
    UnknownCommand(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error(transparent)]
    Algorithm(#[from] UnknownAlgorithm),
}

pub fn parse(line: &str) -> Result<Input, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(Input::Empty),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => return Ok(Input::Quit),
        "auth" | "login" => Command::Authenticate {
            key: required("auth", "a master key", rest)?.to_string(),
        },
        "logout" => Command::Logout,
        "encrypt" => {
            let (algorithm, text) = algorithm_and_text("encrypt", rest)?;
            Command::EncryptText { text, algorithm }
        }
        "decrypt" => {
            let (algorithm, text) = algorithm_and_text("decrypt", rest)?;
            Command::DecryptText { text, algorithm }
        }
        "select" => Command::SelectFile {
            path: PathBuf::from(required("select", "a file path", rest)?),
        },
        "clear" => Command::ClearFile,
        "clear-text" => Command::ClearText,
        "encrypt-file" => Command::EncryptFile {
            algorithm: required("encrypt-file", "an algorithm", rest)?.parse()?,
        },
        "decrypt-file" => Command::DecryptFile {
            algorithm: required("decrypt-file", "an algorithm", rest)?.parse()?,
        },
        "download" => Command::Download,
        "status" => Command::Status,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Input::Command(command))
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    rest: &'a str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument { command, argument });
    }
    Ok(rest)
}

/// Placeholder guidance shown before a text encryption runs. Only RSA has
/// anything beyond the generic prompt to say.
pub fn hint(command: &Command) -> Option<&'static str> {
    match command {
        Command::EncryptText {
            algorithm: Algorithm::Rsa,
            ..
        } => Some(Algorithm::Rsa.input_hint()),
        _ => None,
    }
}

/// `<ALG> <text>`. The text may be empty; the controller reports that.
fn algorithm_and_text(
    command: &'static str,
    rest: &str,
) -> Result<(Algorithm, String), ParseError> {
    let rest = required(command, "an algorithm", rest)?;
    let (algorithm, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Ok((algorithm.parse()?, text.trim().to_string()))
}

//! Line-oriented command scripts
//!
//! One command per line, `#` starts a comment:
//!
//! ```text
//! set a/b/c hello world
//! update a/b/c ""
//! get a/b/c
//! enumerate a
//! watch a/b/c
//! delete a
//! ```
//!
//! Everything after the key is the value; `""` is a zero-length value.

use crate::{Error, Result};

/// A parsed script command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Get { key: String },
    Set { key: String, value: Vec<u8> },
    Update { key: String, value: Vec<u8> },
    Delete { key: String },
    Enumerate { prefix: String },
    Watch { key: String },
}

impl Command {
    /// Operation name, as used in scripts
    pub fn op(&self) -> &'static str {
        match self {
            Command::Get { .. } => "get",
            Command::Set { .. } => "set",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Enumerate { .. } => "enumerate",
            Command::Watch { .. } => "watch",
        }
    }

    /// The key or prefix the command targets
    pub fn key(&self) -> &str {
        match self {
            Command::Get { key }
            | Command::Set { key, .. }
            | Command::Update { key, .. }
            | Command::Delete { key }
            | Command::Watch { key } => key,
            Command::Enumerate { prefix } => prefix,
        }
    }
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (op, rest) = split_word(line);
    let (key, value) = split_word(rest);

    let command = match op.to_ascii_lowercase().as_str() {
        "get" => Command::Get {
            key: required_key(op, key)?,
        },
        "set" => Command::Set {
            key: required_key(op, key)?,
            value: required_value(key, value)?,
        },
        "update" => Command::Update {
            key: required_key(op, key)?,
            value: required_value(key, value)?,
        },
        "delete" | "del" => Command::Delete {
            key: required_key(op, key)?,
        },
        "enumerate" | "ls" => Command::Enumerate {
            prefix: key.to_string(),
        },
        "watch" => Command::Watch {
            key: required_key(op, key)?,
        },
        other => {
            return Err(Error::Parse(format!("unknown command {:?}", other)));
        }
    };

    Ok(Some(command))
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

fn required_key(op: &str, key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::InvalidKey(format!("{} needs a key", op)));
    }
    Ok(key.to_string())
}

fn required_value(key: &str, value: &str) -> Result<Vec<u8>> {
    match value {
        "" => Err(Error::InvalidValue(format!(
            "missing value for {:?}, use \"\" for an empty value",
            key
        ))),
        "\"\"" => Ok(Vec::new()),
        value => Ok(value.as_bytes().to_vec()),
    }
}

//! Command and reply definitions

use std::fmt;

/// Commands understood by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Define { key: String, value: String },
    Update { key: String, value: String },
    Drop { key: String },
    Get { key: String },
}

impl Command {
    /// Get the command verb as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Command::Define { .. } => "DEFINE",
            Command::Update { .. } => "UPDATE",
            Command::Drop { .. } => "DROP",
            Command::Get { .. } => "GET",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Command::Define { key, .. }
            | Command::Update { key, .. }
            | Command::Drop { key }
            | Command::Get { key } => key,
        }
    }

    /// Whether applying the command may change the table
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::Get { .. })
    }

    /// Render the command as a request line
    pub fn to_line(&self) -> String {
        match self {
            Command::Define { key, value } | Command::Update { key, value } => {
                format!("{} {} {}", self.name(), key, value)
            }
            Command::Drop { key } | Command::Get { key } => format!("{} {}", self.name(), key),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Outcome of applying one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success, carrying the value for GET
    Ok(Option<String>),
    NotFound,
    AlreadyExists,
    Malformed,
    InternalError,
}

impl Reply {
    pub const OK_TAG: &'static str = "OK";
    pub const NOT_FOUND_TAG: &'static str = "NOT_FOUND";
    pub const ALREADY_EXISTS_TAG: &'static str = "ALREADY_EXISTS";
    pub const MALFORMED_TAG: &'static str = "MALFORMED";
    pub const ERROR_TAG: &'static str = "ERROR";

    /// Separator between the OK tag and a returned value
    pub const VALUE_SEPARATOR: char = ':';

    /// Stable wire tag of the reply kind
    pub fn tag(&self) -> &'static str {
        match self {
            Reply::Ok(_) => Self::OK_TAG,
            Reply::NotFound => Self::NOT_FOUND_TAG,
            Reply::AlreadyExists => Self::ALREADY_EXISTS_TAG,
            Reply::Malformed => Self::MALFORMED_TAG,
            Reply::InternalError => Self::ERROR_TAG,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    /// Render the reply as it appears on the wire
    pub fn to_line(&self) -> String {
        match self {
            Reply::Ok(Some(value)) => format!("{}{}{}", Self::OK_TAG, Self::VALUE_SEPARATOR, value),
            other => other.tag().to_string(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

//! Codec for request and reply datagrams
//!
//! A request is a single line `<VERB> <key> [value]`, space delimited, with
//! a case-insensitive verb. A reply is one of the fixed tags of [`Reply`],
//! optionally followed by `:` and the value for a successful GET. Each
//! datagram carries exactly one message, so the datagram boundary delimits
//! it.

use crate::protocol::{Command, Reply};

/// Conventional UDP-safe payload bound
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1024;
pub const DEFAULT_MAX_KEY_LEN: usize = 256;
pub const DEFAULT_MAX_VALUE_LEN: usize = 512;

/// Size bounds enforced while decoding requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_payload_len: usize,
    pub max_key_len: usize,
    pub max_value_len: usize,
}

impl Limits {
    /// No size bounds; only verb and arity are checked
    pub const UNBOUNDED: Limits = Limits {
        max_payload_len: usize::MAX,
        max_key_len: usize::MAX,
        max_value_len: usize::MAX,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}

/// Reasons a payload is rejected as malformed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty request")]
    Empty,

    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLong { len: usize, max: usize },

    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("{verb} requires {expected}")]
    WrongArity {
        verb: &'static str,
        expected: &'static str,
    },

    #[error("key of {len} bytes exceeds limit of {max}")]
    KeyTooLong { len: usize, max: usize },

    #[error("value of {len} bytes exceeds limit of {max}")]
    ValueTooLong { len: usize, max: usize },

    #[error("unrecognized reply: {0}")]
    UnknownReply(String),
}

/// Stateless conversions between datagram payloads and typed messages
pub struct Codec;

impl Codec {
    /// Decode a request datagram into a command
    pub fn decode(payload: &[u8], limits: &Limits) -> Result<Command, DecodeError> {
        if payload.len() > limits.max_payload_len {
            return Err(DecodeError::PayloadTooLong {
                len: payload.len(),
                max: limits.max_payload_len,
            });
        }

        let line = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
        Self::decode_line(line, limits)
    }

    /// Decode a single request line, ignoring a trailing line terminator
    pub fn decode_line(line: &str, limits: &Limits) -> Result<Command, DecodeError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let args: Vec<&str> = line.split_ascii_whitespace().collect();

        let Some(verb) = args.first() else {
            return Err(DecodeError::Empty);
        };

        let command = match verb.to_ascii_uppercase().as_str() {
            "DEFINE" => {
                let (key, value) = Self::key_and_value("DEFINE", &args)?;
                Command::Define { key, value }
            }
            "UPDATE" => {
                let (key, value) = Self::key_and_value("UPDATE", &args)?;
                Command::Update { key, value }
            }
            "DROP" => Command::Drop {
                key: Self::key_only("DROP", &args)?,
            },
            "GET" => Command::Get {
                key: Self::key_only("GET", &args)?,
            },
            _ => return Err(DecodeError::UnknownVerb(verb.to_string())),
        };

        Self::check_lengths(&command, limits)?;
        Ok(command)
    }

    /// Encode a reply into a datagram payload
    pub fn encode(reply: &Reply) -> Vec<u8> {
        reply.to_line().into_bytes()
    }

    /// Encode a command into a request datagram payload
    pub fn encode_command(command: &Command) -> Vec<u8> {
        command.to_line().into_bytes()
    }

    /// Decode a reply datagram, as received by a client
    pub fn decode_reply(payload: &[u8]) -> Result<Reply, DecodeError> {
        let line = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some((tag, value)) = line.split_once(Reply::VALUE_SEPARATOR) {
            if tag == Reply::OK_TAG {
                return Ok(Reply::Ok(Some(value.to_string())));
            }
            return Err(DecodeError::UnknownReply(line.to_string()));
        }

        match line {
            Reply::OK_TAG => Ok(Reply::Ok(None)),
            Reply::NOT_FOUND_TAG => Ok(Reply::NotFound),
            Reply::ALREADY_EXISTS_TAG => Ok(Reply::AlreadyExists),
            Reply::MALFORMED_TAG => Ok(Reply::Malformed),
            Reply::ERROR_TAG => Ok(Reply::InternalError),
            "" => Err(DecodeError::Empty),
            other => Err(DecodeError::UnknownReply(other.to_string())),
        }
    }

    fn key_and_value(verb: &'static str, args: &[&str]) -> Result<(String, String), DecodeError> {
        match args {
            [_, key, value] => Ok((key.to_string(), value.to_string())),
            _ => Err(DecodeError::WrongArity {
                verb,
                expected: "a key and a value",
            }),
        }
    }

    fn key_only(verb: &'static str, args: &[&str]) -> Result<String, DecodeError> {
        match args {
            [_, key] => Ok(key.to_string()),
            _ => Err(DecodeError::WrongArity {
                verb,
                expected: "exactly one key",
            }),
        }
    }

    fn check_lengths(command: &Command, limits: &Limits) -> Result<(), DecodeError> {
        let key = command.key();
        if key.len() > limits.max_key_len {
            return Err(DecodeError::KeyTooLong {
                len: key.len(),
                max: limits.max_key_len,
            });
        }

        if let Command::Define { value, .. } | Command::Update { value, .. } = command {
            if value.len() > limits.max_value_len {
                return Err(DecodeError::ValueTooLong {
                    len: value.len(),
                    max: limits.max_value_len,
                });
            }
        }

        Ok(())
    }
}

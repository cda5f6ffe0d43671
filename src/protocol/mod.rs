//! Protocol module for the request/reply line protocol

pub mod codec;
pub mod command;

pub use codec::{Codec, DecodeError, Limits};
pub use command::{Command, Reply};

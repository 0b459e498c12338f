//! Event Codec Module
//!
//! Wire format of the notifications exchanged on a map's pub/sub channel:
//!
//! ```text
//! put<>k1~~v1><k2~~v2
//! delete<>k1><k2
//! clear<>
//! ```
//!
//! Keys and serialized values must never contain the delimiters, nor form one
//! where they are joined to their neighbours, otherwise other entries of the
//! batch would be corrupted on decode.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::codec::ValueCodec;
use crate::error::{MapError, Result};

// == Wire Delimiters ==
/// Separates the command from its payload
pub const COMMAND_DELIMITER: &str = "<>";
/// Separates the entries of a batch
pub const ENTRY_DELIMITER: &str = "><";
/// Separates a key from its serialized value inside a PUT entry
pub const KEY_VALUE_DELIMITER: &str = "~~";

const RESERVED: [&str; 3] = [COMMAND_DELIMITER, ENTRY_DELIMITER, KEY_VALUE_DELIMITER];

/// Rejects text that contains any reserved delimiter.
///
/// `field` describes the offending text in the returned error.
pub fn ensure_no_delimiters(field: &str, text: &str) -> Result<()> {
    match RESERVED.iter().find(|d| text.contains(**d)) {
        Some(delimiter) => Err(MapError::ReservedDelimiter {
            field: field.to_string(),
            delimiter,
        }),
        None => Ok(()),
    }
}

/// Rejects a key that contains a delimiter or would form one on the wire.
///
/// A key is joined as `><key~~` in PUT batches and `><key><` in DELETE
/// batches, so it must not start with `>` nor end with `<` or `~`.
pub fn ensure_valid_key(field: &str, key: &str) -> Result<()> {
    ensure_no_delimiters(field, key)?;
    ensure_clean_edges(
        field,
        key,
        &[('>', COMMAND_DELIMITER)],
        &[('<', COMMAND_DELIMITER), ('~', KEY_VALUE_DELIMITER)],
    )
}

/// Rejects a serialized value that contains a delimiter or would form one
/// on the wire.
///
/// A value is joined as `~~value><`, so it must not start with `~` nor end
/// with `<`.
pub fn ensure_valid_value(field: &str, raw: &str) -> Result<()> {
    ensure_no_delimiters(field, raw)?;
    ensure_clean_edges(
        field,
        raw,
        &[('~', KEY_VALUE_DELIMITER)],
        &[('<', COMMAND_DELIMITER)],
    )
}

fn ensure_clean_edges(
    field: &str,
    text: &str,
    leading: &[(char, &'static str)],
    trailing: &[(char, &'static str)],
) -> Result<()> {
    let formed = leading
        .iter()
        .find(|(c, _)| text.starts_with(*c))
        .or_else(|| trailing.iter().find(|(c, _)| text.ends_with(*c)));
    match formed {
        Some(&(_, delimiter)) => Err(MapError::ReservedDelimiter {
            field: field.to_string(),
            delimiter,
        }),
        None => Ok(()),
    }
}

// == Command ==
/// Kind of change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Put,
    Delete,
    Clear,
}

impl Command {
    /// Lower-case name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Put => "put",
            Command::Delete => "delete",
            Command::Clear => "clear",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "put" => Ok(Command::Put),
            "delete" => Ok(Command::Delete),
            "clear" => Ok(Command::Clear),
            other => Err(MapError::Decode(format!("unknown command '{}'", other))),
        }
    }
}

// == Map Event ==
/// A change applied to the shared store, broadcast to every process of the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent<V> {
    /// Entries written, in batch order
    Put(Vec<(String, V)>),
    /// Keys removed
    Delete(Vec<String>),
    /// Whole map removed
    Clear,
}

impl<V> MapEvent<V> {
    pub fn command(&self) -> Command {
        match self {
            MapEvent::Put(_) => Command::Put,
            MapEvent::Delete(_) => Command::Delete,
            MapEvent::Clear => Command::Clear,
        }
    }

    /// Number of entries or keys carried by the event.
    pub fn len(&self) -> usize {
        match self {
            MapEvent::Put(entries) => entries.len(),
            MapEvent::Delete(keys) => keys.len(),
            MapEvent::Clear => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Encoding ==
/// Result of encoding an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEvent {
    /// Wire message
    pub message: String,
    /// Entries left out because they could not be encoded safely
    pub skipped: usize,
}

/// Encodes an event into its wire message.
///
/// An entry whose key or serialized value is unusable is left out of the
/// batch and counted in [`EncodedEvent::skipped`]; the other entries are kept.
pub fn encode_event<C: ValueCodec>(event: &MapEvent<C::Value>, codec: &C) -> EncodedEvent {
    let mut skipped = 0;
    let payload = match event {
        MapEvent::Put(entries) => {
            let mut parts = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                match encode_entry(key, value, codec) {
                    Ok(part) => parts.push(part),
                    Err(e) => {
                        warn!("Dropping entry '{}' from put event: {}", key, e);
                        skipped += 1;
                    }
                }
            }
            parts.join(ENTRY_DELIMITER)
        }
        MapEvent::Delete(keys) => {
            let mut parts = Vec::with_capacity(keys.len());
            for key in keys {
                match ensure_valid_key("key", key) {
                    Ok(()) => parts.push(key.as_str()),
                    Err(e) => {
                        warn!("Dropping key from delete event: {}", e);
                        skipped += 1;
                    }
                }
            }
            parts.join(ENTRY_DELIMITER)
        }
        MapEvent::Clear => String::new(),
    };

    EncodedEvent {
        message: format!("{}{}{}", event.command(), COMMAND_DELIMITER, payload),
        skipped,
    }
}

fn encode_entry<C: ValueCodec>(key: &str, value: &C::Value, codec: &C) -> Result<String> {
    ensure_valid_key("key", key)?;
    let raw = codec.encode(value)?;
    ensure_valid_value("serialized value", &raw)?;
    Ok(format!("{}{}{}", key, KEY_VALUE_DELIMITER, raw))
}

// == Decoding ==
/// Result of decoding a wire message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent<V> {
    pub event: MapEvent<V>,
    /// PUT entries dropped because they could not be parsed
    pub skipped: usize,
}

/// Decodes a wire message.
///
/// A message that does not split into a command and a payload, or names an
/// unknown command, fails as a whole. Individual PUT entries that cannot be
/// parsed are dropped and counted in [`DecodedEvent::skipped`].
pub fn decode_event<C: ValueCodec>(message: &str, codec: &C) -> Result<DecodedEvent<C::Value>> {
    let (command, payload) = message
        .split_once(COMMAND_DELIMITER)
        .ok_or_else(|| MapError::Decode(format!("missing '{}' in message", COMMAND_DELIMITER)))?;
    if payload.contains(COMMAND_DELIMITER) {
        return Err(MapError::Decode(format!(
            "more than one '{}' in message",
            COMMAND_DELIMITER
        )));
    }

    let segments = || payload.split(ENTRY_DELIMITER).filter(|s| !s.is_empty());

    let decoded = match command.parse::<Command>()? {
        Command::Clear => DecodedEvent {
            event: MapEvent::Clear,
            skipped: 0,
        },
        Command::Delete => DecodedEvent {
            event: MapEvent::Delete(segments().map(str::to_string).collect()),
            skipped: 0,
        },
        Command::Put => {
            let mut entries = Vec::new();
            let mut skipped = 0;
            for segment in segments() {
                match decode_entry(segment, codec) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        warn!("Dropping unparsable put entry '{}': {}", segment, e);
                        skipped += 1;
                    }
                }
            }
            DecodedEvent {
                event: MapEvent::Put(entries),
                skipped,
            }
        }
    };

    Ok(decoded)
}

fn decode_entry<C: ValueCodec>(segment: &str, codec: &C) -> Result<(String, C::Value)> {
    let (key, raw) = segment.split_once(KEY_VALUE_DELIMITER).ok_or_else(|| {
        MapError::Decode(format!("missing '{}' in put entry", KEY_VALUE_DELIMITER))
    })?;
    Ok((key.to_string(), codec.decode(raw)?))
}

//! JSON output.
//!
//! Intervals are written as an array of `["HH:MM:SS", "HH:MM:SS"]` pairs
//! with 4-space indentation:
//!
//! ```text
//! [
//!     [
//!         "00:00:07",
//!         "00:00:11"
//!     ]
//! ]
//! ```

use std::io::Write;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{error::SightingsError, interval::TimeInterval};

const INDENT: &[u8] = b"    ";

/// Write `intervals` as indented JSON to `writer`. No trailing newline.
///
/// # Errors
///
/// Returns [`SightingsError::IoError`] if writing fails.
pub fn write_json<W: Write>(writer: W, intervals: &[TimeInterval]) -> Result<(), SightingsError> {
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = Serializer::with_formatter(writer, formatter);
    intervals
        .serialize(&mut serializer)
        .map_err(|error| SightingsError::IoError(error.into()))
}

/// Render `intervals` as an indented JSON string.
///
/// ```
/// use sightings::{TimeInterval, to_json};
///
/// assert_eq!(to_json(&[])?, "[]");
///
/// let json = to_json(&[TimeInterval::around_frame(300, 30, 3, 1)])?;
/// assert_eq!(json, "[\n    [\n        \"00:00:07\",\n        \"00:00:11\"\n    ]\n]");
/// # Ok::<(), sightings::SightingsError>(())
/// ```
pub fn to_json(intervals: &[TimeInterval]) -> Result<String, SightingsError> {
    let mut buffer = Vec::new();
    write_json(&mut buffer, intervals)?;
    String::from_utf8(buffer).map_err(|error| {
        SightingsError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, error))
    })
}

//! # Greeter
//!
//! The one behavior every front end of this workspace shares: write the line
//! `estou-a-ver` to an output stream and hand back nothing.
//!
//! The Python extension calls [`estou_a_ver`] directly. The command line host
//! goes through [`write_greeting`] so it can choose the stream.

use std::io::{self, Write};

/// The text printed on every call, without its line terminator.
pub const GREETING: &'static str = "estou-a-ver";

/// Bytes handed to the stream in a single write.
const GREETING_LINE: &'static [u8] = b"estou-a-ver\n";

/// Writes `estou-a-ver\n` to `out`.
///
/// The whole line goes out in one `write_all` so concurrent callers sharing a
/// locked stream never interleave inside a line. The stream is not flushed;
/// buffering stays whatever `out` already does.
///
/// # Errors
///
/// Any I/O error from `out` is returned unchanged.
///
/// # Example
///
/// ```rust
/// let mut out = Vec::new();
/// shared_files::greeter::write_greeting(&mut out).unwrap();
/// assert_eq!(out, b"estou-a-ver\n");
/// ```
pub fn write_greeting<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    tracing::trace!(greeting = GREETING, "writing greeting");
    out.write_all(GREETING_LINE)
}

/// Writes the greeting to the process's standard output.
pub fn estou_a_ver() -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_greeting(&mut handle)
}

//! Secret input
//!
//! Lets the CLI take passwords from stdin instead of argv, where they would
//! show up in the process list.

use std::io::{self, BufRead};

/// Reads one line as a password, without its line ending.
pub fn read_password<R: BufRead>(mut reader: R) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    if line.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no password given on stdin",
        ));
    }
    Ok(line)
}

/// Reads a password from the process's stdin.
pub fn read_password_from_stdin() -> io::Result<String> {
    read_password(io::stdin().lock())
}

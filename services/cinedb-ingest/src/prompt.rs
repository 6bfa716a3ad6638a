//! Line-based interactive prompts

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::path::PathBuf;

use crate::error::IngestError;

/// Source of the answers the importer needs from the operator.
pub trait InputProvider {
    /// Ask for the CSV file path. Returns the raw answer.
    fn ask_path(&mut self) -> io::Result<String>;

    /// Ask whether `collection` should be emptied before loading.
    fn confirm_clear(&mut self, collection: &str) -> io::Result<bool>;
}

/// `y` or `yes`, ignoring case and surrounding whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prompts written to `writer`, answers read one line at a time from
/// `reader`. End of input reads as an empty answer.
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl LinePrompt<BufReader<Stdin>, Stdout> {
    /// Prompt on the process terminal.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.writer, "{}", question)?;
        self.writer.flush()?;

        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line)
    }
}

impl<R: BufRead, W: Write> InputProvider for LinePrompt<R, W> {
    fn ask_path(&mut self) -> io::Result<String> {
        self.ask("📁 Path to the movies CSV file: ")
    }

    fn confirm_clear(&mut self, collection: &str) -> io::Result<bool> {
        let answer = self.ask(&format!(
            "🗑️  Delete all existing documents in '{}' before importing? (y/N): ",
            collection
        ))?;
        Ok(is_affirmative(&answer))
    }
}

/// Use `given` when present, otherwise ask. The path must exist.
pub fn resolve_input_path(
    given: Option<PathBuf>,
    input: &mut dyn InputProvider,
) -> Result<PathBuf, IngestError> {
    let path = match given {
        Some(path) => path,
        None => PathBuf::from(input.ask_path()?.trim()),
    };

    if path.as_os_str().is_empty() || !path.exists() {
        return Err(IngestError::InputNotFound(path));
    }

    Ok(path)
}

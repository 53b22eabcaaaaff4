//! A parser for the OBO flat-file format
//!
//! The format is line based: the file starts with a header block of
//! `tag: value` lines, followed by stanzas. Each stanza starts with a
//! bracketed name, e.g. `[Term]`, and contains `tag: value` lines until the
//! next stanza begins. Tags can repeat, so every tag maps to an ordered list
//! of values.
//!
//! `!` starts a comment that runs to the end of the line. A trailing `\`
//! joins a line with the following one(s) before the tag/value split. Values
//! that start with `"` are parsed as quoted string literals; text after the
//! closing quote is kept as a modifier on the [`Value`], not merged into the
//! value itself.
//!
//! The parser does not attempt error recovery. A malformed line fails the
//! whole document with [`PhenosimError::ParseError`], carrying the offending
//! line number.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::{PhenosimError, SimResult};

/// A single value of a stanza tag, with its optional trailing modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    value: String,
    modifier: Option<String>,
}

impl Value {
    fn new(value: String, modifier: Option<String>) -> Self {
        Value { value, modifier }
    }

    /// The value text, with quotes and escapes resolved
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Trailing text after the closing quote of a quoted value
    pub fn modifier(&self) -> Option<&str> {
        self.modifier.as_deref()
    }
}

/// An ordered multimap of header `tag: value` pairs
///
/// Tag order is first-encounter order and values accumulate per tag, so
/// serializing the header reproduces the parsed input without information
/// loss for repeated tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    entries: Vec<(String, Vec<String>)>,
}

impl Header {
    fn push(&mut self, tag: &str, value: String) {
        match self.entries.iter_mut().find(|(t, _)| t == tag) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((tag.to_string(), vec![value])),
        }
    }

    /// All values recorded for `tag`, in input order
    pub fn get(&self, tag: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, values)| values.as_slice())
    }

    /// Iterates tags and their values in first-encounter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(tag, values)| (tag.as_str(), values.as_slice()))
    }

    /// Returns the number of distinct header tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no header lines were present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (tag, values) in &self.entries {
            for value in values {
                writeln!(f, "{tag}: {value}")?;
            }
        }
        Ok(())
    }
}

/// One stanza of the OBO file, e.g. a `[Term]` record
///
/// Immutable once parsed. Tags map to ordered value lists because a tag may
/// legally appear multiple times (`alt_id`, `is_a`, `synonym`, ...).
#[derive(Debug, Clone)]
pub struct Stanza {
    name: String,
    tags: HashMap<String, Vec<Value>>,
}

impl Stanza {
    fn new(name: &str) -> Self {
        Stanza {
            name: name.to_string(),
            tags: HashMap::new(),
        }
    }

    fn add(&mut self, tag: &str, value: Value) {
        self.tags.entry(tag.to_string()).or_default().push(value);
    }

    /// The stanza type label, e.g. `Term`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values of `tag`, in input order
    pub fn values(&self, tag: &str) -> Option<&[Value]> {
        self.tags.get(tag).map(|values| values.as_slice())
    }

    /// The text of the first value of `tag`
    pub fn first_value(&self, tag: &str) -> Option<&str> {
        self.tags
            .get(tag)
            .and_then(|values| values.first())
            .map(Value::value)
    }
}

/// A fully parsed OBO document: the header block and all stanzas in order
#[derive(Debug, Clone)]
pub struct OboDocument {
    header: Header,
    stanzas: Vec<Stanza>,
}

impl OboDocument {
    /// Parses an OBO document from any buffered reader
    ///
    /// The reader is consumed to the end; parsing stops at the first
    /// malformed line.
    pub fn parse<R: BufRead>(reader: R) -> SimResult<OboDocument> {
        let mut lines = LogicalLines::new(reader);
        let mut header = Header::default();
        let mut stanzas: Vec<Stanza> = Vec::new();
        let mut current: Option<Stanza> = None;

        while let Some(line) = lines.next_logical()? {
            if line.is_empty() {
                continue;
            }
            if let Some(stripped) = line.strip_prefix('[') {
                let name = stripped.strip_suffix(']').ok_or_else(|| {
                    PhenosimError::ParseError {
                        line: lines.lineno,
                        msg: String::from("stanza marker without closing bracket"),
                    }
                })?;
                if let Some(stanza) = current.take() {
                    stanzas.push(stanza);
                }
                current = Some(Stanza::new(name));
                continue;
            }
            let (tag, value) = parse_tag_value(&line, lines.lineno)?;
            match current.as_mut() {
                Some(stanza) => stanza.add(tag, value),
                None => header.push(tag, value.value),
            }
        }
        if let Some(stanza) = current.take() {
            stanzas.push(stanza);
        }

        debug!(
            stanzas = stanzas.len(),
            header_tags = header.len(),
            "parsed OBO document"
        );
        Ok(OboDocument { header, stanzas })
    }

    /// Parses an OBO document from a file on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<OboDocument> {
        let file = File::open(&path).map_err(|err| PhenosimError::CannotRead {
            path: path.as_ref().display().to_string(),
            msg: err.to_string(),
        })?;
        OboDocument::parse(BufReader::new(file))
    }

    /// The header block of the document
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// All stanzas, in encounter order
    pub fn stanzas(&self) -> &[Stanza] {
        &self.stanzas
    }
}

/// Assembles raw input lines into logical lines
///
/// Handles comment skipping/stripping and `\` line continuation and keeps
/// track of the current line number for error reporting.
struct LogicalLines<R> {
    reader: R,
    lineno: usize,
}

impl<R: BufRead> LogicalLines<R> {
    fn new(reader: R) -> Self {
        LogicalLines { reader, lineno: 0 }
    }

    fn read_line(&mut self) -> SimResult<Option<String>> {
        let mut buf = String::new();
        let n = self
            .reader
            .read_line(&mut buf)
            .map_err(|err| PhenosimError::ParseError {
                line: self.lineno + 1,
                msg: err.to_string(),
            })?;
        if n == 0 {
            return Ok(None);
        }
        self.lineno += 1;
        Ok(Some(buf.trim().to_string()))
    }

    fn next_logical(&mut self) -> SimResult<Option<String>> {
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                return Ok(Some(line));
            }
            if line.starts_with('!') {
                continue;
            }
            if let Some(first) = line.strip_suffix('\\') {
                return Ok(Some(self.continue_line(first)?));
            }
            return Ok(Some(strip_trailing_comment(&line)));
        }
    }

    /// Joins continued lines with a single space. Comment lines within the
    /// continuation are skipped, trailing comments are not stripped here.
    fn continue_line(&mut self, first: &str) -> SimResult<String> {
        let mut parts = vec![first.trim_end().to_string()];
        loop {
            let Some(line) = self.read_line()? else {
                break;
            };
            if line.starts_with('!') {
                continue;
            }
            match line.strip_suffix('\\') {
                Some(part) => parts.push(part.trim_end().to_string()),
                None => {
                    parts.push(line);
                    break;
                }
            }
        }
        Ok(parts.join(" "))
    }
}

/// Removes a trailing `!` comment, ignoring escaped `\!` markers
fn strip_trailing_comment(line: &str) -> String {
    let bytes = line.as_bytes();
    for idx in (0..bytes.len()).rev() {
        if bytes[idx] == b'!' && (idx == 0 || bytes[idx - 1] != b'\\') {
            return line[..idx].trim_end().to_string();
        }
    }
    line.to_string()
}

/// Splits a logical line into its tag and [`Value`]
fn parse_tag_value(line: &str, lineno: usize) -> SimResult<(&str, Value)> {
    let (tag, rest) = line
        .split_once(':')
        .ok_or_else(|| PhenosimError::ParseError {
            line: lineno,
            msg: format!("expected `tag: value`, got `{line}`"),
        })?;
    let rest = rest.trim_start();
    if let Some(quoted) = rest.strip_prefix('"') {
        let (value, modifier) = parse_quoted(quoted, lineno)?;
        Ok((tag.trim(), Value::new(value, modifier)))
    } else {
        Ok((tag.trim(), Value::new(rest.to_string(), None)))
    }
}

/// Parses a quoted string literal (opening quote already consumed) and
/// returns the unescaped text plus any trailing modifier annotation
fn parse_quoted(rest: &str, lineno: usize) -> SimResult<(String, Option<String>)> {
    let mut value = String::with_capacity(rest.len());
    let mut chars = rest.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => {
                let modifier = rest[idx + 1..].trim();
                let modifier = if modifier.is_empty() {
                    None
                } else {
                    Some(modifier.to_string())
                };
                return Ok((value, modifier));
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            _ => value.push(c),
        }
    }
    Err(PhenosimError::ParseError {
        line: lineno,
        msg: String::from("unterminated quoted string"),
    })
}

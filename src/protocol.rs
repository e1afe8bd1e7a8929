//! Request framing and response formatting for the line protocol.
//!
//! Requests are comma separated fields terminated by `;`. A request may span
//! several input lines; the pending text is threaded through [`frame`] by the
//! caller so the framer itself holds no state.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::session::ClientId;

pub const TERMINATOR: char = ';';
pub const DELIMITER: char = ',';
pub const LINE_SEPARATOR: char = '\n';

lazy_static! {
    // a numeric first field addresses a connected client
    static ref CLIENT_PREFIX: Regex = Regex::new(r"(?s)^\s*(\d+)\s*,(.*)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Not terminated yet, carries the pending text to hand back with the next line
    Partial(String),
    /// A whole request, the pending text starts over empty
    Complete(String),
}

/// Adds one line to whatever was pending. Only the end of the newest line
/// decides whether the request is complete.
pub fn frame(pending: String, line: &str) -> Frame {
    let line = line.trim_end();
    if pending.is_empty() && line.trim().is_empty() {
        return Frame::Partial(pending);
    }
    let mut buffered = pending;
    buffered.push_str(line);
    if line.ends_with(TERMINATOR) {
        Frame::Complete(buffered)
    } else {
        Frame::Partial(buffered)
    }
}

/// Separates a leading client id from the rest of the request.
pub fn split_client(request: &str) -> Option<(ClientId, &str)> {
    let captures = CLIENT_PREFIX.captures(request)?;
    let client = captures.get(1)?.as_str().parse::<ClientId>().ok()?;
    Some((client, captures.get(2)?.as_str()))
}

/// Splits a request into its keyword and the raw parameter text.
pub fn split_request(request: &str) -> (&str, &str) {
    let request = request.trim();
    let request = request.strip_suffix(TERMINATOR).unwrap_or(request);
    match request.split_once(DELIMITER) {
        Some((command, rest)) => (command.trim(), rest),
        None => (request.trim(), ""),
    }
}

/// Splits parameter text on commas, keeping `{...}` groups whole.
pub fn split_fields(rest: &str) -> Vec<String> {
    let mut fields = Vec::new();
    if rest.trim().is_empty() {
        return fields;
    }
    let mut depth = 0usize;
    let mut field = String::new();
    for c in rest.chars() {
        match c {
            '{' => {
                depth += 1;
                field.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                field.push(c);
            }
            DELIMITER if depth == 0 => {
                fields.push(field.trim().to_string());
                field = String::new();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// The members of a `{a,b}` group; `*` or `{}` means no constraint.
pub fn group_members(field: &str) -> Vec<String> {
    let field = field.trim();
    let inner = field
        .strip_prefix('{')
        .and_then(|f| f.strip_suffix('}'))
        .unwrap_or(field);
    inner
        .split(DELIMITER)
        .map(str::trim)
        .filter(|member| !member.is_empty() && *member != "*")
        .map(str::to_string)
        .collect()
}

/// `<keyword>,<body>;`
pub fn respond(keyword: &str, body: impl fmt::Display) -> String {
    format!("{keyword}{DELIMITER}{body}{TERMINATOR}")
}

/// `<keyword>,<header>` followed by one line per item, then the terminator.
pub fn respond_lines<I>(keyword: &str, header: impl fmt::Display, lines: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let mut response = format!("{keyword}{DELIMITER}{header}");
    for line in lines {
        response.push(LINE_SEPARATOR);
        response += &line.to_string();
    }
    response.push(TERMINATOR);
    response
}

//! Line classification for the event-stream format

/// One line of an event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty or whitespace-only; ends the current event
    Blank,
    /// Starts with `:`
    Comment,
    /// `name: value`, or a bare `name` with an empty value
    Field { name: &'a str, value: &'a str },
}

/// Classify a line, ignoring its line terminator (`\n` or `\r\n`)
pub fn parse_line(line: &str) -> Line<'_> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.starts_with(':') {
        return Line::Comment;
    }

    match line.split_once(':') {
        Some((name, value)) => Line::Field {
            name,
            value: value.strip_prefix(' ').unwrap_or(value),
        },
        None => Line::Field { name: line, value: "" },
    }
}

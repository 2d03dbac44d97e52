//! Inline formatting: splits one line of text into bold, italic and code spans.
//!
//! The scanner walks the line once. Marker runs are collected up front so
//! the nearest closer for any marker is a table lookup; when there is none
//! the marker stays as literal text. Priority at a single position is code, then bold, then
//! italic. Code span content is never scanned again.

use std::ops::Range;

use crate::block::{InlineRun, InlineSpan};

#[derive(Clone, Copy, Default)]
struct Emphasis {
    bold: bool,
    italic: bool,
}

/// Resolve the inline markup of `text` into styled spans.
pub fn format_inline(text: &str) -> InlineRun {
    let mut run = InlineRun::new();
    scan(text, Emphasis::default(), &mut run);
    run
}

fn scan(text: &str, emphasis: Emphasis, run: &mut InlineRun) {
    let bytes = text.as_bytes();
    let delimiters = Delimiters::collect(text);
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => match code_span(bytes, i) {
                Some((content, end)) => {
                    push_text(&text[literal_start..i], emphasis, run);
                    run.push(InlineSpan::code(&text[content]));
                    i = end;
                    literal_start = i;
                }
                // Unterminated code span: the rest of the line is literal.
                None => break,
            },
            marker @ (b'*' | b'_') => {
                let width = marker_run(bytes, i, marker);
                // A run that does not touch the text after it opens nothing,
                // not even with its last marker.
                if !opens(text, i, width, marker) {
                    i += width;
                    continue;
                }
                let table = delimiters.table(marker);

                if width >= 2 && !emphasis.bold && opens(text, i, 2, marker) {
                    if let Some(close) = table.bold_closer(i + 2) {
                        push_text(&text[literal_start..i], emphasis, run);
                        let inner = Emphasis {
                            bold: true,
                            ..emphasis
                        };
                        scan(&text[i + 2..close], inner, run);
                        i = close + 2;
                        literal_start = i;
                        continue;
                    }
                }

                if !emphasis.italic && opens(text, i, 1, marker) {
                    if let Some(close) = table.italic_closer(text, marker, i + 1) {
                        push_text(&text[literal_start..i], emphasis, run);
                        let inner = Emphasis {
                            italic: true,
                            ..emphasis
                        };
                        scan(&text[i + 1..close], inner, run);
                        i = close + 1;
                        literal_start = i;
                        continue;
                    }
                }

                i += 1;
            }
            _ => i += 1,
        }
    }

    push_text(&text[literal_start..], emphasis, run);
}

fn push_text(text: &str, emphasis: Emphasis, run: &mut InlineRun) {
    run.push(InlineSpan {
        text: text.to_string(),
        bold: emphasis.bold,
        italic: emphasis.italic,
        code: false,
    });
}

/// Find the code span opening at `start`: the content range and the index
/// just past the closing backticks. The closer must be a backtick run of the
/// same length as the opener.
fn code_span(bytes: &[u8], start: usize) -> Option<(Range<usize>, usize)> {
    let ticks = marker_run(bytes, start, b'`');
    let content_start = start + ticks;
    let mut pos = content_start;

    while pos < bytes.len() {
        if bytes[pos] == b'`' {
            let width = marker_run(bytes, pos, b'`');
            if width == ticks {
                return Some((content_start..pos, pos + width));
            }
            pos += width;
        } else {
            pos += 1;
        }
    }
    None
}

/// Marker runs of one marker byte that lie outside code spans, with the
/// closer each search would reach precomputed. Built once per scanned slice
/// so every lookup is a binary search.
struct MarkerTable {
    /// `(start, end)` of each maximal run, ascending
    runs: Vec<(usize, usize)>,
    /// Positions where a bold pair may close, ascending
    bold_closers: Vec<usize>,
    /// Italic closer reached by a search entering run `r` at its start.
    /// One extra trailing `None` stands for the end of the line.
    italic_from_run: Vec<Option<usize>>,
}

impl MarkerTable {
    fn new(text: &str, marker: u8, runs: Vec<(usize, usize)>) -> Self {
        // Bold closers sit at the right edge of their run so `***x***`
        // closes the bold last.
        let bold_closers = runs
            .iter()
            .filter(|&&(start, end)| end - start >= 2 && closes(text, end - 2, 2, marker))
            .map(|&(_, end)| end - 2)
            .collect();
        let mut table = Self {
            runs,
            bold_closers,
            italic_from_run: Vec::new(),
        };

        let count = table.runs.len();
        let mut reached = vec![None; count + 1];
        for r in (0..count).rev() {
            let (start, end) = table.runs[r];
            reached[r] = if end - start == 1 {
                if closes(text, start, 1, marker) {
                    Some(start)
                } else {
                    reached[r + 1]
                }
            } else {
                table.after_run(text, marker, start, end, &reached, r)
            };
        }
        table.italic_from_run = reached;
        table
    }

    /// Search result at a run of two or more markers first seen at `at`:
    /// an opening bold pair is skipped whole, otherwise the run's last
    /// marker may close the italic.
    fn after_run(
        &self,
        text: &str,
        marker: u8,
        at: usize,
        end: usize,
        reached: &[Option<usize>],
        r: usize,
    ) -> Option<usize> {
        match self.bold_closer(at + 2) {
            Some(bold_close) if opens(text, at, 2, marker) => {
                reached[self.run_containing(bold_close) + 1]
            }
            _ if closes(text, end - 1, 1, marker) => Some(end - 1),
            _ => reached[r + 1],
        }
    }

    /// Nearest bold closer strictly after `from`.
    fn bold_closer(&self, from: usize) -> Option<usize> {
        let next = self.bold_closers.partition_point(|&close| close <= from);
        self.bold_closers.get(next).copied()
    }

    /// Nearest italic closer strictly after `from`, stepping over nested
    /// bold pairs. `from` may point into the middle of a run.
    fn italic_closer(&self, text: &str, marker: u8, from: usize) -> Option<usize> {
        let next = self.runs.partition_point(|&(start, _)| start <= from);
        match next.checked_sub(1).map(|r| (r, self.runs[r])) {
            Some((r, (_, end))) if end > from => {
                if end - from == 1 {
                    self.italic_from_run[r + 1]
                } else {
                    self.after_run(text, marker, from, end, &self.italic_from_run, r)
                }
            }
            _ => self.italic_from_run[next],
        }
    }

    fn run_containing(&self, pos: usize) -> usize {
        self.runs.partition_point(|&(start, _)| start <= pos) - 1
    }
}

/// Both marker tables of one slice.
struct Delimiters {
    star: MarkerTable,
    underscore: MarkerTable,
}

impl Delimiters {
    /// Collect marker runs up to the first unterminated backtick, which
    /// turns the rest of the line literal.
    fn collect(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut star = Vec::new();
        let mut underscore = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'`' => match code_span(bytes, pos) {
                    Some((_, end)) => pos = end,
                    None => break,
                },
                marker @ (b'*' | b'_') => {
                    let end = pos + marker_run(bytes, pos, marker);
                    if marker == b'*' {
                        star.push((pos, end));
                    } else {
                        underscore.push((pos, end));
                    }
                    pos = end;
                }
                _ => pos += 1,
            }
        }

        Self {
            star: MarkerTable::new(text, b'*', star),
            underscore: MarkerTable::new(text, b'_', underscore),
        }
    }

    fn table(&self, marker: u8) -> &MarkerTable {
        if marker == b'*' {
            &self.star
        } else {
            &self.underscore
        }
    }
}

fn marker_run(bytes: &[u8], start: usize, marker: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == marker).count()
}

/// An opener must touch the text it formats; `_` must not start mid-word.
fn opens(text: &str, at: usize, len: usize, marker: u8) -> bool {
    let next = text[at + len..].chars().next();
    if !next.is_some_and(|c| !c.is_whitespace()) {
        return false;
    }
    if marker == b'_' {
        let prev = text[..at].chars().next_back();
        return !prev.is_some_and(char::is_alphanumeric);
    }
    true
}

/// A closer must touch the text it formats; `_` must not end mid-word.
fn closes(text: &str, at: usize, len: usize, marker: u8) -> bool {
    let prev = text[..at].chars().next_back();
    if !prev.is_some_and(|c| !c.is_whitespace()) {
        return false;
    }
    if marker == b'_' {
        let next = text[at + len..].chars().next();
        return !next.is_some_and(char::is_alphanumeric);
    }
    true
}

use crate::block::{Block, BlockKind, InlineSpan};
use crate::error::Result;
use crate::inline::format_inline;
use crate::numbering::ListNumbering;
use crate::table::{TableAccumulator, is_separator_row, split_row};

/// Spaces per list nesting level; a tab always counts as one level.
const INDENT_WIDTH: usize = 2;
const MAX_HEADING_LEVEL: usize = 6;

/// Strip YAML frontmatter from the beginning of markdown content.
/// The block only counts as frontmatter when it holds at least one
/// `key: value` line and nothing that isn't YAML-shaped; otherwise the
/// opening `---` is a rule and the document is parsed as written.
fn strip_frontmatter(markdown: &str) -> &str {
    let Some(body) = markdown
        .strip_prefix("---\n")
        .or_else(|| markdown.strip_prefix("---\r\n"))
    else {
        return markdown;
    };
    // Find the closing ---
    let mut offset = 0;
    let mut has_key = false;
    for line in body.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim_end();
        if line == "---" {
            return if has_key { &body[offset..] } else { markdown };
        }
        match yaml_line(line) {
            Some(YamlLine::Key) => has_key = true,
            Some(YamlLine::Other) => {}
            None => return markdown,
        }
    }
    markdown
}

enum YamlLine {
    Key,
    Other,
}

fn yaml_line(line: &str) -> Option<YamlLine> {
    if line.trim().is_empty()
        || line.starts_with([' ', '\t'])
        || line == "-"
        || line.starts_with("- ")
    {
        return Some(YamlLine::Other);
    }
    let (key, rest) = line.split_once(':')?;
    let key_shaped = key
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    (key_shaped && (rest.is_empty() || rest.starts_with(' '))).then_some(YamlLine::Key)
}

/// Parse markdown text into a list of blocks
pub fn parse(markdown: &str) -> Vec<Block> {
    let markdown = markdown.strip_prefix('\u{feff}').unwrap_or(markdown);
    let markdown = strip_frontmatter(markdown);
    let mut blocks = Vec::new();
    let mut state = ParserState::default();

    for line in markdown.lines() {
        process_line(line, &mut state, &mut blocks);
    }
    finish(&mut state, &mut blocks);

    blocks
}

/// Parse raw bytes; fails only when they are not valid UTF-8.
pub fn parse_bytes(input: &[u8]) -> Result<Vec<Block>> {
    let markdown = std::str::from_utf8(input)?;
    Ok(parse(markdown))
}

#[derive(Default)]
struct ParserState {
    mode: Mode,
    numbering: ListNumbering,
    last_block_kind: Option<BlockKind>,
    // A blank line was seen since the last emitted block
    blank_since_block: bool,
}

#[derive(Default)]
enum Mode {
    #[default]
    Normal,
    InCodeFence {
        fence: Fence,
        language: Option<String>,
        lines: Vec<String>,
    },
    InTable(OpenTable),
}

struct OpenTable {
    rows: TableAccumulator,
    after_blank: bool,
    // First row after a blank line; a separator right after it starts a new table
    held_row: Option<Vec<String>>,
}

impl OpenTable {
    fn new(rows: TableAccumulator) -> Self {
        Self {
            rows,
            after_blank: false,
            held_row: None,
        }
    }

    fn release_held_row(&mut self) {
        if let Some(row) = self.held_row.take() {
            self.rows.feed_row(&row);
        }
    }
}

struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Recognize an opening fence and its language tag.
    fn open(trimmed: &str) -> Option<(Fence, Option<String>)> {
        let marker = trimmed.chars().next().filter(|&c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        // ```code``` on one line is inline code, not a fence
        if marker == '`' && info.contains('`') {
            return None;
        }
        let language = info.split_whitespace().next().map(str::to_string);
        Some((Fence { marker, len }, language))
    }

    fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() >= self.len && trimmed.chars().all(|c| c == self.marker)
    }
}

struct ListLine<'a> {
    level: usize,
    ordered: bool,
    start: u32,
    text: &'a str,
}

fn process_line(line: &str, state: &mut ParserState, blocks: &mut Vec<Block>) {
    match std::mem::take(&mut state.mode) {
        Mode::InCodeFence {
            fence,
            language,
            mut lines,
        } => {
            if fence.closes(line) {
                emit(Block::CodeBlock { language, lines }, state, blocks);
            } else {
                lines.push(line.to_string());
                state.mode = Mode::InCodeFence {
                    fence,
                    language,
                    lines,
                };
            }
        }
        Mode::InTable(table) => continue_table(line, table, state, blocks),
        Mode::Normal => classify(line, state, blocks),
    }
}

fn finish(state: &mut ParserState, blocks: &mut Vec<Block>) {
    match std::mem::take(&mut state.mode) {
        Mode::InCodeFence {
            language, lines, ..
        } => {
            log::debug!("unterminated code fence, closing at end of input");
            emit(Block::CodeBlock { language, lines }, state, blocks);
        }
        Mode::InTable(mut table) => {
            table.release_held_row();
            emit_table(table.rows, state, blocks);
        }
        Mode::Normal => {}
    }
}

fn classify(line: &str, state: &mut ParserState, blocks: &mut Vec<Block>) {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        state.blank_since_block = true;
        return;
    }

    if let Some((fence, language)) = Fence::open(trimmed) {
        state.mode = Mode::InCodeFence {
            fence,
            language,
            lines: Vec::new(),
        };
        return;
    }

    if trimmed.starts_with('|') {
        let cells = split_row(trimmed);
        let mut rows = TableAccumulator::new();
        if is_separator_row(&cells) {
            rows.feed_separator_row();
        } else {
            rows.feed_row(&cells);
        }
        state.mode = Mode::InTable(OpenTable::new(rows));
        return;
    }

    if let Some((level, text)) = heading(trimmed) {
        let text = format_inline(text);
        emit(Block::Heading { level, text }, state, blocks);
        return;
    }

    if let Some(text) = quote(trimmed) {
        push_quote_line(text, state, blocks);
        return;
    }

    if is_thematic_break(trimmed) {
        emit(Block::HorizontalRule, state, blocks);
        return;
    }

    if let Some(item) = list_item(line) {
        let number = if item.ordered {
            state
                .numbering
                .next_index_from(item.level, true, item.start)
        } else {
            state.numbering.next_index(item.level, false)
        };
        let block = Block::ListItem {
            level: item.level,
            ordered: item.ordered,
            index: number.index,
            group: number.group,
            text: format_inline(item.text),
        };
        emit(block, state, blocks);
        return;
    }

    let text = format_inline(trimmed);
    emit(Block::Paragraph { text }, state, blocks);
}

fn continue_table(line: &str, mut table: OpenTable, state: &mut ParserState, blocks: &mut Vec<Block>) {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        table.release_held_row();
        table.after_blank = true;
        state.mode = Mode::InTable(table);
        return;
    }

    if !trimmed.starts_with('|') {
        table.release_held_row();
        emit_table(table.rows, state, blocks);
        classify(line, state, blocks);
        return;
    }

    let cells = split_row(trimmed);
    if is_separator_row(&cells) {
        match table.held_row.take() {
            Some(header) => {
                emit_table(table.rows, state, blocks);
                let mut rows = TableAccumulator::new();
                rows.feed_row(&header);
                rows.feed_separator_row();
                table = OpenTable::new(rows);
            }
            None => table.rows.feed_separator_row(),
        }
    } else if table.after_blank {
        table.release_held_row();
        table.held_row = Some(cells.iter().map(|cell| cell.to_string()).collect());
        table.after_blank = false;
    } else {
        table.release_held_row();
        table.rows.feed_row(&cells);
    }
    state.mode = Mode::InTable(table);
}

fn emit_table(rows: TableAccumulator, state: &mut ParserState, blocks: &mut Vec<Block>) {
    let table = rows.finish();
    if table.is_empty() {
        log::debug!("dropping table without rows");
        return;
    }
    emit(Block::Table(table), state, blocks);
}

fn push_quote_line(text: &str, state: &mut ParserState, blocks: &mut Vec<Block>) {
    let line = format_inline(text);
    if state.last_block_kind == Some(BlockKind::Quote) && !state.blank_since_block {
        if let Some(Block::Quote { text }) = blocks.last_mut() {
            text.push(InlineSpan::line_break());
            text.extend(line);
            return;
        }
    }
    emit(Block::Quote { text: line }, state, blocks);
}

fn emit(block: Block, state: &mut ParserState, blocks: &mut Vec<Block>) {
    let kind = block.kind();
    if kind != BlockKind::ListItem {
        state.numbering.on_non_list_block();
    }
    log::trace!("emit {:?}", kind);
    state.last_block_kind = Some(kind);
    state.blank_since_block = false;
    blocks.push(block);
}

/// `#` to `######` followed by whitespace. Longer marker runs are not
/// headings.
fn heading(trimmed: &str) -> Option<(u8, &str)> {
    let hashes = trimmed.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    if hashes > MAX_HEADING_LEVEL {
        log::debug!("{hashes} heading markers, treating line as a paragraph");
        return None;
    }
    let level = u8::try_from(hashes).ok()?;
    Some((level, strip_closing_hashes(rest.trim())))
}

fn strip_closing_hashes(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.is_empty() {
        ""
    } else if without.ends_with(char::is_whitespace) {
        without.trim_end()
    } else {
        text
    }
}

/// Text of a quote line; nested `>` markers are flattened.
fn quote(trimmed: &str) -> Option<&str> {
    let mut rest = trimmed.strip_prefix('>')?;
    loop {
        rest = rest.trim_start();
        match rest.strip_prefix('>') {
            Some(inner) => rest = inner,
            None => return Some(rest),
        }
    }
}

fn is_thematic_break(trimmed: &str) -> bool {
    let marks: Vec<char> = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3 && matches!(marks[0], '-' | '*' | '_') && marks.iter().all(|&c| c == marks[0])
}

fn list_item(line: &str) -> Option<ListLine<'_>> {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];

    let (ordered, start, rest) = if let Some(rest) = body.strip_prefix(['-', '*', '+']) {
        (false, 1, rest)
    } else {
        let digits = body.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > 9 {
            return None;
        }
        let rest = body[digits..].strip_prefix(['.', ')'])?;
        (true, body[..digits].parse().ok()?, rest)
    };

    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    Some(ListLine {
        level: indent_level(indent),
        ordered,
        start,
        text: rest.trim(),
    })
}

fn indent_level(indent: &str) -> usize {
    let mut level = 0;
    let mut spaces = 0;
    for c in indent.chars() {
        if c == '\t' {
            level += 1 + spaces / INDENT_WIDTH;
            spaces = 0;
        } else {
            spaces += 1;
        }
    }
    level + spaces / INDENT_WIDTH
}

/// A run of text sharing one set of inline styles
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: true,
            ..Self::default()
        }
    }

    /// Line break joining two lines of a quote.
    pub fn line_break() -> Self {
        Self::plain("\n")
    }

    pub fn is_line_break(&self) -> bool {
        !self.bold && !self.italic && !self.code && self.text == "\n"
    }

    fn same_style(&self, other: &InlineSpan) -> bool {
        self.bold == other.bold && self.italic == other.italic && self.code == other.code
    }
}

/// Formatted text content of a block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineRun(Vec<InlineSpan>);

impl InlineRun {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a span, merging it into the previous one when the styles match.
    /// Empty spans are dropped.
    pub fn push(&mut self, span: InlineSpan) {
        if span.text.is_empty() {
            return;
        }
        if let Some(last) = self.0.last_mut() {
            if last.same_style(&span) && !last.is_line_break() && !span.is_line_break() {
                last.text.push_str(&span.text);
                return;
            }
        }
        self.0.push(span);
    }

    pub fn extend(&mut self, other: InlineRun) {
        for span in other.0 {
            self.push(span);
        }
    }

    pub fn spans(&self) -> &[InlineSpan] {
        &self.0
    }

    /// The text with all formatting stripped.
    pub fn plain_text(&self) -> String {
        self.0.iter().map(|span| span.text.as_str()).collect()
    }
}

impl From<Vec<InlineSpan>> for InlineRun {
    fn from(spans: Vec<InlineSpan>) -> Self {
        let mut run = InlineRun::new();
        for span in spans {
            run.push(span);
        }
        run
    }
}

/// One table row; each cell is an inline run
pub type Row = Vec<InlineRun>;

/// A rectangular table: every row has exactly `column_count` cells
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub header: Option<Row>,
    pub rows: Vec<Row>,
    pub column_count: usize,
}

impl Table {
    /// Data rows plus the header row, if any.
    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.header.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Block-level elements of the document model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: InlineRun,
    },
    Paragraph {
        text: InlineRun,
    },
    ListItem {
        level: usize,
        ordered: bool,
        index: u32,
        /// Numbering group; items of one group share a continuous counter.
        group: u32,
        text: InlineRun,
    },
    CodeBlock {
        language: Option<String>,
        lines: Vec<String>,
    },
    Quote {
        text: InlineRun,
    },
    Table(Table),
    HorizontalRule,
}

/// Payload-free tag of a [`Block`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
    CodeBlock,
    Quote,
    Table,
    HorizontalRule,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading { .. } => BlockKind::Heading,
            Block::Paragraph { .. } => BlockKind::Paragraph,
            Block::ListItem { .. } => BlockKind::ListItem,
            Block::CodeBlock { .. } => BlockKind::CodeBlock,
            Block::Quote { .. } => BlockKind::Quote,
            Block::Table(_) => BlockKind::Table,
            Block::HorizontalRule => BlockKind::HorizontalRule,
        }
    }
}

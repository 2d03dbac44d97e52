//! Style resolution.
//!
//! Every block is mapped to a [`StyleDecision`] in two tiers: the template's
//! style for the block when it has one, otherwise a synthesized or built-in
//! style. Code blocks, quotes, inline code and tables carry fixed framing
//! that no template overrides.

use crate::block::{Block, InlineSpan};
use crate::template::{Rgb, StyleDescriptor, Template};

/// Heading sizes in points, indexed by level - 1.
const HEADING_SIZES: [f32; 6] = [20.0, 16.0, 14.0, 12.0, 11.0, 10.0];

const CODE_FONT: &str = "Consolas";
const CODE_SIZE: f32 = 10.0;
const CODE_BACKGROUND: Rgb = Rgb::new(0xF5, 0xF5, 0xF5);
const CODE_BORDER: Rgb = Rgb::new(0xCC, 0xCC, 0xCC);

const QUOTE_BACKGROUND: Rgb = Rgb::new(0xF9, 0xF9, 0xF9);
const QUOTE_BORDER: Rgb = Rgb::new(0x4A, 0x90, 0xE2);

const TABLE_HEADER_BACKGROUND: Rgb = Rgb::new(0xD9, 0xE2, 0xF3);
const TABLE_HEADER_SIZE: f32 = 11.0;

/// Left indent of code blocks and quotes, in inches.
const BLOCK_INDENT_IN: f32 = 0.5;

/// Indent added per list level, also used as the hanging indent.
pub const LIST_INDENT_STEP_TWIPS: u32 = 357;

pub const BULLET_NUMBERING_ID: u32 = 100;
pub const ORDERED_NUMBERING_ID: u32 = 101;

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSource {
    /// The template defined the style.
    Template,
    /// The template lacked the style and one was generated in its place.
    Synthesized,
    /// A fixed style that templates never supply.
    Builtin,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontStyle {
    pub family: Option<String>,
    pub size_pt: Option<f32>,
    pub color: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    fn from_descriptor(descriptor: &StyleDescriptor) -> Self {
        Self {
            family: descriptor.font.clone(),
            size_pt: descriptor.size,
            color: descriptor.color,
            bold: descriptor.bold.unwrap_or(false),
            italic: descriptor.italic.unwrap_or(false),
        }
    }

    fn code() -> Self {
        Self {
            family: Some(CODE_FONT.to_string()),
            size_pt: Some(CODE_SIZE),
            color: Some(Rgb::BLACK),
            ..Self::default()
        }
    }

    /// True when no attribute is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSides {
    All,
    Left,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub sides: BorderSides,
    pub width_pt: f32,
    pub color: Rgb,
    /// Gap between the border and the content
    pub spacing_pt: f32,
}

/// Paragraph framing: shading, border and indentation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub background: Option<Rgb>,
    pub border: Option<Border>,
    pub left_indent_in: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberingKind {
    Bullet,
    Ordered,
}

/// Link from a list item to its numbering definition and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub kind: NumberingKind,
    pub level: usize,
    pub group: u32,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRowStyle {
    pub font: FontStyle,
    pub background: Rgb,
    /// Repeat the header row at the top of every page
    pub repeat: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleDecision {
    pub name: String,
    pub source: StyleSource,
    pub font: FontStyle,
    pub frame: Frame,
    pub numbering: Option<NumberingRef>,
    pub header_row: Option<HeaderRowStyle>,
}

impl StyleDecision {
    fn new(name: impl Into<String>, source: StyleSource, font: FontStyle) -> Self {
        Self {
            name: name.into(),
            source,
            font,
            frame: Frame::default(),
            numbering: None,
            header_row: None,
        }
    }
}

/// Style of an inline code span.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCodeStyle {
    pub font: FontStyle,
    pub background: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFormat {
    Bullet(char),
    Decimal,
    LowerLetter,
    LowerRoman,
}

/// A multi-level numbering scheme shared by every list of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingDefinition {
    pub id: u32,
    pub kind: NumberingKind,
}

impl NumberingDefinition {
    pub const BULLET: Self = Self {
        id: BULLET_NUMBERING_ID,
        kind: NumberingKind::Bullet,
    };

    pub const ORDERED: Self = Self {
        id: ORDERED_NUMBERING_ID,
        kind: NumberingKind::Ordered,
    };

    pub fn for_kind(kind: NumberingKind) -> Self {
        match kind {
            NumberingKind::Bullet => Self::BULLET,
            NumberingKind::Ordered => Self::ORDERED,
        }
    }

    /// Formats cycle every three levels.
    pub fn format(&self, level: usize) -> LevelFormat {
        match (self.kind, level % 3) {
            (NumberingKind::Bullet, 2) => LevelFormat::Bullet('○'),
            (NumberingKind::Bullet, _) => LevelFormat::Bullet('●'),
            (NumberingKind::Ordered, 0) => LevelFormat::Decimal,
            (NumberingKind::Ordered, 1) => LevelFormat::LowerLetter,
            (NumberingKind::Ordered, _) => LevelFormat::LowerRoman,
        }
    }

    pub fn indent_twips(&self, level: usize) -> u32 {
        let depth = u32::try_from(level).unwrap_or(u32::MAX - 1);
        LIST_INDENT_STEP_TWIPS.saturating_mul(depth.saturating_add(1))
    }

    pub fn hanging_twips(&self) -> u32 {
        LIST_INDENT_STEP_TWIPS
    }

    /// The marker text for item `index` at `level`, such as `3.` or `b.`.
    pub fn label(&self, level: usize, index: u32) -> String {
        match self.format(level) {
            LevelFormat::Bullet(glyph) => glyph.to_string(),
            LevelFormat::Decimal => format!("{index}."),
            LevelFormat::LowerLetter => format!("{}.", lower_letter(index)),
            LevelFormat::LowerRoman => format!("{}.", lower_roman(index)),
        }
    }
}

/// Longest letter label; word processors stop doubling letters here too.
const MAX_LETTER_REPEAT: usize = 32;

/// a, b, ..., z, aa, bb, ... as word processors count.
fn lower_letter(index: u32) -> String {
    let index = index.max(1) - 1;
    let letter = char::from(b'a' + (index % 26) as u8);
    let repeat = (index / 26 + 1) as usize;
    std::iter::repeat_n(letter, repeat.min(MAX_LETTER_REPEAT)).collect()
}

fn lower_roman(index: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut rest = index.max(1);
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while rest >= value {
            out.push_str(numeral);
            rest -= value;
        }
    }
    out
}

/// Maps blocks to styles. Holds the template by shared reference so one
/// template can serve many conversions at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleResolver<'t> {
    template: Option<&'t Template>,
}

impl<'t> StyleResolver<'t> {
    pub fn new(template: Option<&'t Template>) -> Self {
        Self { template }
    }

    pub fn resolve(&self, block: &Block) -> StyleDecision {
        match block {
            Block::Heading { level, .. } => self.heading(*level),
            Block::Paragraph { .. } => self.body(),
            Block::ListItem {
                level,
                ordered,
                index,
                group,
                ..
            } => self.list_item(*level, *ordered, *index, *group),
            Block::CodeBlock { .. } => self.code_block(),
            Block::Quote { .. } => self.quote(),
            Block::Table(table) => self.table(table.header.is_some()),
            Block::HorizontalRule => self.horizontal_rule(),
        }
    }

    pub fn heading(&self, level: u8) -> StyleDecision {
        let name = format!("Heading {level}");
        if let Some(descriptor) = self.template.and_then(|t| t.heading(level)) {
            let font = FontStyle {
                bold: descriptor.bold.unwrap_or(true),
                ..FontStyle::from_descriptor(descriptor)
            };
            return StyleDecision::new(name, StyleSource::Template, font);
        }

        let size = HEADING_SIZES[usize::from(level.clamp(1, 6)) - 1];
        let font = FontStyle {
            size_pt: Some(size),
            bold: true,
            ..FontStyle::default()
        };
        StyleDecision::new(name, StyleSource::Synthesized, font)
    }

    /// The body text style, also the preamble's default text style.
    pub fn body(&self) -> StyleDecision {
        match self.template.and_then(|t| t.body.as_ref()) {
            Some(descriptor) => StyleDecision::new(
                "Normal",
                StyleSource::Template,
                FontStyle::from_descriptor(descriptor),
            ),
            None => StyleDecision::new("Normal", StyleSource::Builtin, FontStyle::default()),
        }
    }

    fn list_item(&self, level: usize, ordered: bool, index: u32, group: u32) -> StyleDecision {
        let (base, kind) = if ordered {
            ("List Number", NumberingKind::Ordered)
        } else {
            ("List Bullet", NumberingKind::Bullet)
        };
        let name = match level {
            0 => base.to_string(),
            _ => format!("{base} {}", level + 1),
        };

        let template_style = self.template.and_then(|t| {
            if ordered {
                t.list_number.as_ref()
            } else {
                t.list_bullet.as_ref()
            }
        });
        let mut decision = match template_style {
            Some(descriptor) => StyleDecision::new(
                name,
                StyleSource::Template,
                FontStyle::from_descriptor(descriptor),
            ),
            None => {
                let body = self.body();
                StyleDecision::new(name, body.source, body.font)
            }
        };
        decision.numbering = Some(NumberingRef {
            kind,
            level,
            group,
            index,
        });
        decision
    }

    fn code_block(&self) -> StyleDecision {
        let mut decision = StyleDecision::new("No Spacing", StyleSource::Builtin, FontStyle::code());
        decision.frame = Frame {
            background: Some(CODE_BACKGROUND),
            border: Some(Border {
                sides: BorderSides::All,
                width_pt: 0.75,
                color: CODE_BORDER,
                spacing_pt: 4.0,
            }),
            left_indent_in: BLOCK_INDENT_IN,
        };
        decision
    }

    fn quote(&self) -> StyleDecision {
        let (source, font) = match self.template.and_then(|t| t.quote.as_ref()) {
            Some(descriptor) => (StyleSource::Template, FontStyle::from_descriptor(descriptor)),
            None => (StyleSource::Builtin, self.body().font),
        };
        let mut decision = StyleDecision::new("Quote", source, FontStyle { italic: true, ..font });
        decision.frame = Frame {
            background: Some(QUOTE_BACKGROUND),
            border: Some(Border {
                sides: BorderSides::Left,
                width_pt: 3.0,
                color: QUOTE_BORDER,
                spacing_pt: 8.0,
            }),
            left_indent_in: BLOCK_INDENT_IN,
        };
        decision
    }

    fn table(&self, has_header: bool) -> StyleDecision {
        let mut decision = StyleDecision::new("Table Grid", StyleSource::Builtin, self.body().font);
        if has_header {
            decision.header_row = Some(HeaderRowStyle {
                font: FontStyle {
                    size_pt: Some(TABLE_HEADER_SIZE),
                    bold: true,
                    ..FontStyle::default()
                },
                background: TABLE_HEADER_BACKGROUND,
                repeat: true,
            });
        }
        decision
    }

    fn horizontal_rule(&self) -> StyleDecision {
        let mut decision =
            StyleDecision::new("Horizontal Rule", StyleSource::Builtin, FontStyle::default());
        decision.frame.border = Some(Border {
            sides: BorderSides::Bottom,
            width_pt: 0.75,
            color: CODE_BORDER,
            spacing_pt: 1.0,
        });
        decision
    }

    /// Style of `span` when it is inline code, None otherwise.
    pub fn inline_code(&self, span: &InlineSpan) -> Option<InlineCodeStyle> {
        span.code.then(|| InlineCodeStyle {
            font: FontStyle {
                family: Some(CODE_FONT.to_string()),
                size_pt: Some(CODE_SIZE),
                ..FontStyle::default()
            },
            background: CODE_BACKGROUND,
        })
    }

    /// The bullet and ordered schemes. Both exist in every document, even when
    /// a template is in use.
    pub fn numbering_definitions(&self) -> [NumberingDefinition; 2] {
        [NumberingDefinition::BULLET, NumberingDefinition::ORDERED]
    }

    /// The numbering definition a list item of `kind` refers to.
    pub fn numbering_definition(&self, kind: NumberingKind) -> NumberingDefinition {
        self.numbering_definitions()
            .into_iter()
            .find(|definition| definition.kind == kind)
            .unwrap_or_else(|| NumberingDefinition::for_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{InlineRun, Table};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn heading_block(level: u8) -> Block {
        Block::Heading {
            level,
            text: InlineRun::from(vec![InlineSpan::plain("Title")]),
        }
    }

    fn code_block() -> Block {
        Block::CodeBlock {
            language: Some("rust".into()),
            lines: vec!["fn main() {}".into()],
        }
    }

    fn quote_block() -> Block {
        Block::Quote {
            text: InlineRun::from(vec![InlineSpan::plain("said")]),
        }
    }

    fn rich_template() -> Template {
        Template::from_bytes(
            br##"
            [heading1]
            font = "Georgia"
            size = 24
            color = "#2F5496"

            [body]
            font = "Calibri"
            size = 11

            [quote]
            font = "Garamond"
            color = "#555555"

            [list_number]
            font = "Verdana"
            "##,
        )
        .unwrap()
    }

    #[rstest]
    #[case(1, 20.0)]
    #[case(2, 16.0)]
    #[case(3, 14.0)]
    #[case(4, 12.0)]
    #[case(5, 11.0)]
    #[case(6, 10.0)]
    fn synthesized_heading_ladder(#[case] level: u8, #[case] size: f32) {
        let decision = StyleResolver::new(None).resolve(&heading_block(level));
        assert_eq!(decision.source, StyleSource::Synthesized);
        assert_eq!(decision.name, format!("Heading {level}"));
        assert_eq!(decision.font.size_pt, Some(size));
        assert!(decision.font.bold);
    }

    #[test]
    fn fallback_is_idempotent() {
        let template = rich_template();
        let resolver = StyleResolver::new(Some(&template));
        let first = resolver.resolve(&heading_block(4));
        let second = resolver.resolve(&heading_block(4));
        assert_eq!(first, second);
        assert_eq!(first.source, StyleSource::Synthesized);
    }

    #[test]
    fn template_heading_wins() {
        let template = rich_template();
        let decision = StyleResolver::new(Some(&template)).resolve(&heading_block(1));
        assert_eq!(decision.source, StyleSource::Template);
        assert_eq!(decision.font.family.as_deref(), Some("Georgia"));
        assert_eq!(decision.font.size_pt, Some(24.0));
        assert_eq!(decision.font.color, Some(Rgb::new(0x2F, 0x54, 0x96)));
        assert!(decision.font.bold);
    }

    #[test]
    fn template_can_unbold_headings() {
        let template = Template::from_bytes(b"[heading2]\nbold = false\n").unwrap();
        let decision = StyleResolver::new(Some(&template)).heading(2);
        assert!(!decision.font.bold);
    }

    #[test]
    fn paragraph_uses_body_or_normal() {
        let paragraph = Block::Paragraph {
            text: InlineRun::new(),
        };
        let plain = StyleResolver::new(None).resolve(&paragraph);
        assert_eq!(plain.name, "Normal");
        assert_eq!(plain.source, StyleSource::Builtin);
        assert!(plain.font.is_plain());

        let template = rich_template();
        let styled = StyleResolver::new(Some(&template)).resolve(&paragraph);
        assert_eq!(styled.source, StyleSource::Template);
        assert_eq!(styled.font.family.as_deref(), Some("Calibri"));
    }

    #[test]
    fn code_block_framing_ignores_template() {
        let template = rich_template();
        let without = StyleResolver::new(None).resolve(&code_block());
        let with = StyleResolver::new(Some(&template)).resolve(&code_block());
        assert_eq!(without, with);

        assert_eq!(with.name, "No Spacing");
        assert_eq!(with.font.family.as_deref(), Some("Consolas"));
        assert_eq!(with.font.size_pt, Some(10.0));
        assert_eq!(with.frame.background, Some(Rgb::new(0xF5, 0xF5, 0xF5)));
        let border = with.frame.border.unwrap();
        assert_eq!(border.sides, BorderSides::All);
        assert_eq!(border.width_pt, 0.75);
        assert_eq!(border.color, Rgb::new(0xCC, 0xCC, 0xCC));
        assert_eq!(border.spacing_pt, 4.0);
        assert_eq!(with.frame.left_indent_in, 0.5);
    }

    #[test]
    fn quote_keeps_framing_but_takes_template_typography() {
        let template = rich_template();
        let plain = StyleResolver::new(None).resolve(&quote_block());
        let styled = StyleResolver::new(Some(&template)).resolve(&quote_block());

        assert_eq!(plain.frame, styled.frame);
        assert!(plain.font.italic);
        assert!(styled.font.italic);
        assert_eq!(styled.font.family.as_deref(), Some("Garamond"));

        let border = styled.frame.border.unwrap();
        assert_eq!(border.sides, BorderSides::Left);
        assert_eq!(border.width_pt, 3.0);
        assert_eq!(border.color, Rgb::new(0x4A, 0x90, 0xE2));
        assert_eq!(styled.frame.background, Some(Rgb::new(0xF9, 0xF9, 0xF9)));
    }

    #[test]
    fn list_items_carry_numbering() {
        let template = rich_template();
        let resolver = StyleResolver::new(Some(&template));
        let item = Block::ListItem {
            level: 1,
            ordered: true,
            index: 3,
            group: 7,
            text: InlineRun::new(),
        };
        let decision = resolver.resolve(&item);
        assert_eq!(decision.name, "List Number 2");
        assert_eq!(decision.font.family.as_deref(), Some("Verdana"));
        assert_eq!(
            decision.numbering,
            Some(NumberingRef {
                kind: NumberingKind::Ordered,
                level: 1,
                group: 7,
                index: 3,
            })
        );

        let bullet = Block::ListItem {
            level: 0,
            ordered: false,
            index: 1,
            group: 8,
            text: InlineRun::new(),
        };
        let decision = resolver.resolve(&bullet);
        assert_eq!(decision.name, "List Bullet");
        // No list_bullet style, so the body style applies.
        assert_eq!(decision.font.family.as_deref(), Some("Calibri"));
    }

    #[test]
    fn table_header_style_only_with_header() {
        let resolver = StyleResolver::new(None);
        let headed = Table {
            header: Some(vec![InlineRun::new()]),
            rows: vec![],
            column_count: 1,
        };
        let decision = resolver.resolve(&Block::Table(headed));
        assert_eq!(decision.name, "Table Grid");
        let header = decision.header_row.unwrap();
        assert!(header.font.bold);
        assert_eq!(header.font.size_pt, Some(11.0));
        assert_eq!(header.background, Rgb::new(0xD9, 0xE2, 0xF3));
        assert!(header.repeat);

        let bare = Table {
            header: None,
            rows: vec![vec![InlineRun::new()]],
            column_count: 1,
        };
        assert!(resolver.resolve(&Block::Table(bare)).header_row.is_none());
    }

    #[test]
    fn inline_code_style_is_fixed() {
        let resolver = StyleResolver::new(None);
        assert!(resolver.inline_code(&InlineSpan::plain("x")).is_none());
        let style = resolver.inline_code(&InlineSpan::code("x")).unwrap();
        assert_eq!(style.font.family.as_deref(), Some("Consolas"));
        assert_eq!(style.background, Rgb::new(0xF5, 0xF5, 0xF5));
    }

    #[test]
    fn numbering_definitions_exist_with_template() {
        let template = rich_template();
        let with = StyleResolver::new(Some(&template)).numbering_definitions();
        let without = StyleResolver::new(None).numbering_definitions();
        assert_eq!(with, without);
        assert_eq!(with[0].id, BULLET_NUMBERING_ID);
        assert_eq!(with[1].id, ORDERED_NUMBERING_ID);
    }

    #[rstest]
    #[case(NumberingKind::Bullet, 0, 4, "●")]
    #[case(NumberingKind::Bullet, 1, 1, "●")]
    #[case(NumberingKind::Bullet, 2, 1, "○")]
    #[case(NumberingKind::Bullet, 3, 1, "●")]
    #[case(NumberingKind::Ordered, 0, 12, "12.")]
    #[case(NumberingKind::Ordered, 1, 2, "b.")]
    #[case(NumberingKind::Ordered, 1, 27, "aa.")]
    #[case(NumberingKind::Ordered, 1, 53, "aaa.")]
    #[case(NumberingKind::Ordered, 2, 4, "iv.")]
    #[case(NumberingKind::Ordered, 2, 1994, "mcmxciv.")]
    #[case(NumberingKind::Ordered, 3, 5, "5.")]
    fn labels_cycle_by_level(
        #[case] kind: NumberingKind,
        #[case] level: usize,
        #[case] index: u32,
        #[case] label: &str,
    ) {
        assert_eq!(NumberingDefinition::for_kind(kind).label(level, index), label);
    }

    #[test]
    fn huge_letter_index_stays_short() {
        let label = NumberingDefinition::ORDERED.label(1, 999_999_999);
        assert!(label.len() <= MAX_LETTER_REPEAT + 1);
        assert!(label.ends_with('.'));
    }

    #[test]
    fn list_item_definition_matches_kind() {
        let resolver = StyleResolver::new(None);
        assert_eq!(
            resolver.numbering_definition(NumberingKind::Ordered),
            NumberingDefinition::ORDERED
        );
        assert_eq!(
            resolver.numbering_definition(NumberingKind::Bullet).id,
            BULLET_NUMBERING_ID
        );
    }

    #[test]
    fn indent_grows_per_level() {
        let def = NumberingDefinition::BULLET;
        assert_eq!(def.indent_twips(0), 357);
        assert_eq!(def.indent_twips(2), 1071);
        assert_eq!(def.hanging_twips(), 357);
    }
}

use crate::block::{Block, InlineRun, Table};
use crate::config::Config;
use crate::style::{BorderSides, FontStyle, Frame, StyleDecision, StyleResolver};

const TWIPS_PER_PT: f32 = 20.0;

/// Vertical gap between list items, in points.
const LIST_ITEM_SPACING_PT: f32 = 6.0;

/// Convert blocks to Typst markup
pub fn blocks_to_typst(blocks: &[Block], resolver: &StyleResolver<'_>, config: &Config) -> String {
    let emitter = Emitter {
        resolver,
        config,
        body: resolver.body().font,
    };

    let mut out = String::new();
    emitter.preamble(&mut out);

    let mut i = 0;
    while i < blocks.len() {
        if config.layout.keep_with_next && matches!(blocks[i], Block::Heading { .. }) {
            // A run of headings stays on the page of the block that follows it.
            let mut end = i;
            while end < blocks.len() && matches!(blocks[end], Block::Heading { .. }) {
                end += 1;
            }
            let end = (end + 1).min(blocks.len());

            out.push_str("#block(breakable: false)[\n");
            for block in &blocks[i..end] {
                emitter.block(block, &mut out);
            }
            out.push_str("]\n\n");
            i = end;
        } else {
            emitter.block(&blocks[i], &mut out);
            i += 1;
        }
    }

    out
}

struct Emitter<'a, 't> {
    resolver: &'a StyleResolver<'t>,
    config: &'a Config,
    body: FontStyle,
}

impl Emitter<'_, '_> {
    fn preamble(&self, out: &mut String) {
        out.push_str("#set page(paper: ");
        push_string_literal(&self.config.page.paper, out);
        if self.config.page.numbers {
            out.push_str(", numbering: \"1\"");
        }
        out.push_str(")\n");

        // Set up paragraph settings to prevent widows/orphans
        out.push_str("#set par(linebreaks: \"optimized\")\n");

        let body_args = font_args(&self.body, &FontStyle::default());
        if !body_args.is_empty() {
            out.push_str(&format!("#set text({})\n", body_args.join(", ")));
        }
        out.push('\n');
    }

    fn block(&self, block: &Block, out: &mut String) {
        let decision = self.resolver.resolve(block);
        log::trace!("render {:?} as {}", block.kind(), decision.name);

        match block {
            Block::Heading { level, text } => self.heading(*level, text, &decision, out),
            Block::Paragraph { text } => {
                self.styled_spans(text, &decision.font, out);
                out.push_str("\n\n");
            }
            Block::ListItem { text, .. } => self.list_item(text, &decision, out),
            Block::CodeBlock { language, lines } => {
                self.code_block(language.as_deref(), lines, &decision, out)
            }
            Block::Quote { text } => {
                framed(&decision.frame, true, out, |out| {
                    self.styled_spans(text, &decision.font, out)
                });
                out.push_str("\n\n");
            }
            Block::Table(table) => self.table(table, &decision, out),
            Block::HorizontalRule => {
                out.push_str("#line(length: 100%");
                if let Some(border) = decision.frame.border {
                    out.push_str(&format!(
                        ", stroke: {}pt + {}",
                        border.width_pt,
                        rgb(border.color)
                    ));
                }
                out.push_str(")\n\n");
            }
        }
    }

    fn heading(&self, level: u8, text: &InlineRun, decision: &StyleDecision, out: &mut String) {
        let mut args = font_args(&decision.font, &self.body);
        // Typst bolds headings on its own, so the weight is always spelled out.
        if decision.font.bold == self.body.bold {
            args.push(weight_arg(decision.font.bold));
        }

        out.push_str(&format!("#heading(level: {level})["));
        with_text(&args, out, |out| spans_to_typst(text, self.resolver, false, out));
        out.push_str("]\n\n");
    }

    fn list_item(&self, text: &InlineRun, decision: &StyleDecision, out: &mut String) {
        let Some(numbering) = decision.numbering else {
            self.styled_spans(text, &decision.font, out);
            out.push_str("\n\n");
            return;
        };

        let definition = self.resolver.numbering_definition(numbering.kind);
        let hanging_twips = definition.hanging_twips();
        let pad = (definition.indent_twips(numbering.level) - hanging_twips) as f32 / TWIPS_PER_PT;
        let hanging = hanging_twips as f32 / TWIPS_PER_PT;

        out.push_str(&format!(
            "#block(inset: (left: {pad}pt), above: {LIST_ITEM_SPACING_PT}pt, below: {LIST_ITEM_SPACING_PT}pt)"
        ));
        out.push_str(&format!("[#par(hanging-indent: {hanging}pt)[#box(width: {hanging}pt)["));
        let label = definition.label(numbering.level, numbering.index);
        escape_text(&label, false, out);
        out.push(']');
        let args = font_args(&decision.font, &self.body);
        if args.is_empty() {
            spans_to_typst(text, self.resolver, true, out);
        } else {
            with_text(&args, out, |out| spans_to_typst(text, self.resolver, false, out));
        }
        out.push_str("]]\n\n");
    }

    fn code_block(
        &self,
        language: Option<&str>,
        lines: &[String],
        decision: &StyleDecision,
        out: &mut String,
    ) {
        // Keep code blocks together when possible
        framed(&decision.frame, false, out, |out| {
            let args = font_args(&decision.font, &self.body);
            with_text(&args, out, |out| {
                out.push_str("#raw(block: true, ");
                if let Some(lang) = language {
                    out.push_str("lang: ");
                    push_string_literal(lang, out);
                    out.push_str(", ");
                }
                push_string_literal(&lines.join("\n"), out);
                out.push(')');
            });
        });
        out.push_str("\n\n");
    }

    fn table(&self, table: &Table, decision: &StyleDecision, out: &mut String) {
        if table.column_count == 0 {
            return;
        }

        let keep_together = table.row_count() <= self.config.layout.unbreakable_table_rows;

        // Keep small tables together
        if keep_together {
            out.push_str("#block(breakable: false)[\n");
        }
        out.push_str("#table(\n");
        out.push_str(&format!("  columns: {},\n", table.column_count));

        if let (Some(header), Some(style)) = (&table.header, &decision.header_row) {
            out.push_str("  table.header(\n");
            out.push_str(&format!("    repeat: {},\n", style.repeat));
            let args = font_args(&style.font, &self.body);
            for cell in header {
                out.push_str(&format!("    table.cell(fill: {})[", rgb(style.background)));
                with_text(&args, out, |out| spans_to_typst(cell, self.resolver, false, out));
                out.push_str("],\n");
            }
            out.push_str("  ),\n");
        }

        for row in &table.rows {
            for cell in row {
                out.push_str("  [");
                self.styled_spans(cell, &decision.font, out);
                out.push_str("],\n");
            }
        }

        out.push_str(")\n");
        if keep_together {
            out.push_str("]\n");
        }
        out.push('\n');
    }

    /// Spans wrapped in whatever the font changes relative to the body text.
    fn styled_spans(&self, run: &InlineRun, font: &FontStyle, out: &mut String) {
        let args = font_args(font, &self.body);
        with_text(&args, out, |out| spans_to_typst(run, self.resolver, false, out));
    }
}

/// `#text(...)` arguments for the attributes in which `font` differs from
/// `base`.
fn font_args(font: &FontStyle, base: &FontStyle) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(family) = font.family.as_deref().filter(|_| font.family != base.family) {
        let mut arg = String::from("font: ");
        push_string_literal(family, &mut arg);
        args.push(arg);
    }
    if let Some(size) = font.size_pt.filter(|_| font.size_pt != base.size_pt) {
        args.push(format!("size: {size}pt"));
    }
    if let Some(color) = font.color.filter(|_| font.color != base.color) {
        args.push(format!("fill: {}", rgb(color)));
    }
    if font.bold != base.bold {
        args.push(weight_arg(font.bold));
    }
    if font.italic != base.italic {
        let style = if font.italic { "italic" } else { "normal" };
        args.push(format!("style: \"{style}\""));
    }
    args
}

fn weight_arg(bold: bool) -> String {
    let weight = if bold { "bold" } else { "regular" };
    format!("weight: \"{weight}\"")
}

fn rgb(color: crate::template::Rgb) -> String {
    format!("rgb(\"{color}\")")
}

fn with_text(args: &[String], out: &mut String, body: impl FnOnce(&mut String)) {
    if args.is_empty() {
        body(out);
    } else {
        out.push_str(&format!("#text({})[", args.join(", ")));
        body(out);
        out.push(']');
    }
}

/// Wrap `body` in a block carrying the frame's fill and border, padded by
/// its left indent.
fn framed(frame: &Frame, breakable: bool, out: &mut String, body: impl FnOnce(&mut String)) {
    let indented = frame.left_indent_in > 0.0;
    if indented {
        out.push_str(&format!("#pad(left: {}in)[", frame.left_indent_in));
    }

    let mut args = Vec::new();
    if !breakable {
        args.push("breakable: false".to_string());
    }
    args.push("width: 100%".to_string());
    if let Some(background) = frame.background {
        args.push(format!("fill: {}", rgb(background)));
    }
    if let Some(border) = frame.border {
        let stroke = format!("{}pt + {}", border.width_pt, rgb(border.color));
        let spacing = border.spacing_pt;
        match border.sides {
            BorderSides::All => {
                args.push(format!("stroke: {stroke}"));
                args.push(format!("inset: {spacing}pt"));
            }
            BorderSides::Left => {
                args.push(format!("stroke: (left: {stroke})"));
                args.push(format!("inset: (left: {spacing}pt, rest: {}pt)", spacing / 2.0));
            }
            BorderSides::Bottom => {
                args.push(format!("stroke: (bottom: {stroke})"));
                args.push(format!("inset: (bottom: {spacing}pt)"));
            }
        }
    }

    out.push_str(&format!("#block({})[", args.join(", ")));
    body(out);
    out.push(']');

    if indented {
        out.push(']');
    }
}

/// `follows_call` is set when the spans come right after a `#call[...]`,
/// where a leading `(` or `.` would extend the call.
fn spans_to_typst(
    run: &InlineRun,
    resolver: &StyleResolver<'_>,
    follows_call: bool,
    out: &mut String,
) {
    let mut after_call = follows_call;

    for span in run.spans() {
        if span.is_line_break() {
            out.push_str(" \\\n");
            after_call = false;
            continue;
        }

        if let Some(style) = resolver.inline_code(span) {
            out.push_str(&format!(
                "#box(fill: {}, inset: (x: 2pt), outset: (y: 2pt))[",
                rgb(style.background)
            ));
            let args = font_args(&style.font, &FontStyle::default());
            with_text(&args, out, |out| {
                out.push_str("#raw(");
                push_string_literal(&span.text, out);
                out.push(')');
            });
            out.push(']');
            after_call = true;
            continue;
        }

        let (open, close) = match (span.bold, span.italic) {
            (true, true) => ("#strong[#emph[", "]]"),
            (true, false) => ("#strong[", "]"),
            (false, true) => ("#emph[", "]"),
            (false, false) => ("", ""),
        };

        if open.is_empty() {
            escape_text(&span.text, after_call, out);
            after_call = false;
        } else {
            out.push_str(open);
            escape_text(&span.text, false, out);
            out.push_str(close);
            after_call = true;
        }
    }
}

/// Escape characters that carry meaning in Typst markup.
fn escape_text(text: &str, after_call: bool, out: &mut String) {
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        let escape = match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' => true,
            // List, heading, term and comment markers, and the dash and
            // non-breaking space shorthands
            '=' | '-' | '+' | '/' | '~' => true,
            // `1.` at the start of a line is an enumeration
            '.' => prev.is_some_and(|p| p.is_ascii_digit()) || (prev.is_none() && after_call),
            '(' => prev.is_none() && after_call,
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(ch);
        prev = Some(ch);
    }
}

/// Write `value` as a Typst string literal.
fn push_string_literal(value: &str, out: &mut String) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

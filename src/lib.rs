mod block;
mod config;
mod error;
mod inline;
mod numbering;
mod parser;
mod style;
mod table;
mod template;
mod typst;

pub use block::{Block, BlockKind, InlineRun, InlineSpan, Row, Table};
pub use config::{Config, FontConfig, LayoutConfig, PageConfig};
pub use error::{Error, Result};
pub use inline::format_inline;
pub use numbering::{ListNumber, ListNumbering};
pub use style::{
    Border, BorderSides, FontStyle, Frame, HeaderRowStyle, InlineCodeStyle, LevelFormat,
    NumberingDefinition, NumberingKind, NumberingRef, StyleDecision, StyleResolver, StyleSource,
};
pub use table::TableAccumulator;
pub use template::{Rgb, StyleDescriptor, Template};

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Parse markdown text into a vector of blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    parser::parse(markdown)
}

/// Parse raw markdown bytes. Fails only when the bytes are not UTF-8.
pub fn parse_bytes(input: &[u8]) -> Result<Vec<Block>> {
    parser::parse_bytes(input)
}

/// Convert markdown to Typst markup using default config.
pub fn markdown_to_typst(markdown: &str) -> String {
    markdown_to_typst_with_config(markdown, &Config::compiled_default(), None)
}

/// Convert markdown to Typst markup with custom config and an optional
/// template.
pub fn markdown_to_typst_with_config(
    markdown: &str,
    config: &Config,
    template: Option<&Template>,
) -> String {
    let blocks = parse(markdown);
    blocks_to_typst(&blocks, config, template)
}

/// Render already parsed blocks as Typst markup.
pub fn blocks_to_typst(blocks: &[Block], config: &Config, template: Option<&Template>) -> String {
    let resolver = StyleResolver::new(template);
    typst::blocks_to_typst(blocks, &resolver, config)
}

/// Convert markdown to PDF bytes using default config.
pub fn markdown_to_pdf(markdown: &str) -> Result<Vec<u8>> {
    markdown_to_pdf_with_config(markdown, &Config::compiled_default(), None)
}

/// Convert markdown to PDF bytes with custom config and an optional template.
pub fn markdown_to_pdf_with_config(
    markdown: &str,
    config: &Config,
    template: Option<&Template>,
) -> Result<Vec<u8>> {
    typst_to_pdf(markdown_to_typst_with_config(markdown, config, template), config)
}

/// Compile Typst markup produced by this crate into PDF bytes.
pub fn typst_to_pdf(typst_content: String, config: &Config) -> Result<Vec<u8>> {
    use typst_library::layout::PagedDocument;

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(config.font.system);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Compile(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| Error::Pdf(format!("{:?}", e)))
}

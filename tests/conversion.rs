use mddoc::{
    Block, Config, NumberingKind, StyleResolver, StyleSource, Template, markdown_to_pdf,
    markdown_to_pdf_with_config, parse, parse_bytes,
};

const SAMPLE: &str = "\
---
title: Sample
---
# Release notes

Intro with **bold**, *italic* and `code`.

1. first
2. second
   - nested
3. third

> quoted
> twice

| Name | Value |
|------|-------|
| a    | 1     |
| b    |

```rust
fn main() {}
```

---
";

#[test]
fn sample_parses_into_expected_kinds() {
    let blocks = parse(SAMPLE);
    let kinds: Vec<_> = blocks.iter().map(Block::kind).collect();
    use mddoc::BlockKind::*;
    assert_eq!(
        kinds,
        vec![
            Heading,
            Paragraph,
            ListItem,
            ListItem,
            ListItem,
            ListItem,
            Quote,
            Table,
            CodeBlock,
            HorizontalRule,
        ]
    );
}

#[test]
fn bullet_sublist_restarts_parent_numbering() {
    let blocks = parse(SAMPLE);
    let resolver = StyleResolver::new(None);
    let numbers: Vec<_> = blocks
        .iter()
        .filter_map(|block| resolver.resolve(block).numbering)
        .map(|n| (n.kind, n.level, n.index))
        .collect();
    assert_eq!(
        numbers,
        vec![
            (NumberingKind::Ordered, 0, 1),
            (NumberingKind::Ordered, 0, 2),
            (NumberingKind::Bullet, 1, 1),
            (NumberingKind::Ordered, 0, 1),
        ]
    );
}

#[test]
fn bytes_and_text_agree() {
    assert_eq!(parse_bytes(SAMPLE.as_bytes()).unwrap(), parse(SAMPLE));
}

#[test]
fn template_applies_only_where_defined() {
    let template = Template::from_bytes(b"[heading1]\nsize = 30\n").unwrap();
    let resolver = StyleResolver::new(Some(&template));
    let blocks = parse("# a\n## b");
    assert_eq!(resolver.resolve(&blocks[0]).source, StyleSource::Template);
    assert_eq!(resolver.resolve(&blocks[1]).source, StyleSource::Synthesized);
}

#[test]
fn renders_pdf() {
    let pdf = markdown_to_pdf(SAMPLE).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn renders_pdf_with_template_and_page_numbers() {
    let template = Template::from_bytes(
        b"[body]\nsize = 12\n\n[quote]\ncolor = \"#333333\"\n\n[heading2]\ncolor = \"#2F5496\"\n",
    )
    .unwrap();
    let mut config = Config::compiled_default();
    config.page.numbers = true;

    let pdf = markdown_to_pdf_with_config(SAMPLE, &config, Some(&template)).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

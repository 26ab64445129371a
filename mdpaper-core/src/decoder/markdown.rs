//! Event-stream Markdown parsing

use super::{normalize, parse_literature, ParsedDocument};
use crate::error::Result;
use crate::types::{
    Block, Caption, Content, Formula, Image, ListItem, OrderedList, Row, Run, RunStyle, Table,
    Text,
};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

/// Parse Markdown source into a block tree and bibliography map
pub fn parse(input: &str) -> Result<ParsedDocument> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    let events: Vec<Event> = Parser::new_ext(input, options).collect();
    Decoder {
        events,
        pos: 0,
        doc: ParsedDocument::default(),
    }
    .run()
}

/// Where inline collection stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopAt {
    Paragraph,
    /// End of a list item at the given nesting depth
    Item(u8),
}

struct Decoder<'a> {
    events: Vec<Event<'a>>,
    pos: usize,
    doc: ParsedDocument,
}

impl<'a> Decoder<'a> {
    fn bump(&mut self) -> Option<Event<'a>> {
        let ev = self.events.get(self.pos).cloned();
        if ev.is_some() {
            self.pos += 1;
        }
        ev
    }

    fn run(mut self) -> Result<ParsedDocument> {
        // stack[0] is the root; a heading of level L lands at depth L
        let mut stack: Vec<Block> = vec![Block::new()];

        while let Some(event) = self.bump() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    let title = normalize(&self.collect_plain_until(TagEnd::Heading(level)));
                    let level = level as u8;
                    while stack.len() - 1 >= level as usize {
                        let done = stack.pop().unwrap_or_default();
                        if let Some(parent) = stack.last_mut() {
                            parent.add_sub_block(done);
                        }
                    }
                    let mut block = Block::new();
                    block.set_title(title, level)?;
                    stack.push(block);
                }
                Event::Start(Tag::Paragraph) => {
                    if let Some(block) = stack.last_mut() {
                        self.parse_inline(block, StopAt::Paragraph)?;
                    }
                }
                Event::Start(Tag::Table(_)) => {
                    if let Some(block) = stack.last_mut() {
                        let table = self.parse_table(block)?;
                        block.add_content(Content::Table(table));
                    }
                }
                Event::Start(Tag::List(Some(_))) => {
                    let list = self.parse_ordered_list(1)?;
                    if let Some(block) = stack.last_mut() {
                        block.add_content(Content::List(list));
                    }
                }
                Event::Start(Tag::List(None)) => {
                    tracing::warn!("unordered lists are not supported, skipping");
                    self.skip_container();
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.parse_code_block(kind)?;
                }
                Event::Start(_) => {
                    tracing::warn!(?event, "unsupported block element, skipping");
                    self.skip_container();
                }
                Event::Rule | Event::Html(_) | Event::End(_) => {}
                _ => {}
            }
        }

        while stack.len() > 1 {
            let done = stack.pop().unwrap_or_default();
            if let Some(parent) = stack.last_mut() {
                parent.add_sub_block(done);
            }
        }
        self.doc.root = stack.pop().unwrap_or_default();
        Ok(self.doc)
    }

    /// Collect inline content into `block` until the stop tag closes.
    ///
    /// Display math and images split the surrounding text into separate
    /// paragraphs, matching how the template lays them out.
    fn parse_inline(&mut self, block: &mut Block, stop: StopAt) -> Result<()> {
        let mut inline = InlineBuilder::default();

        while let Some(event) = self.bump() {
            match event {
                Event::End(TagEnd::Paragraph) if stop == StopAt::Paragraph => break,
                Event::End(TagEnd::Item) if matches!(stop, StopAt::Item(_)) => break,
                // a tight list item runs straight into its sub-list
                Event::Start(Tag::List(ordered)) if matches!(stop, StopAt::Item(_)) => {
                    inline.flush_text(block);
                    let StopAt::Item(depth) = stop else {
                        continue;
                    };
                    match ordered {
                        Some(_) => {
                            if depth >= 2 {
                                tracing::warn!(
                                    "lists nest at most two levels, rendering as level two"
                                );
                            }
                            let list = self.parse_ordered_list((depth + 1).min(2))?;
                            block.add_content(Content::List(list));
                        }
                        None => {
                            tracing::warn!("unordered lists are not supported, skipping");
                            self.skip_container();
                        }
                    }
                }
                Event::Start(Tag::Paragraph) if matches!(stop, StopAt::Item(_)) => {
                    inline.flush_text(block);
                    self.parse_inline(block, StopAt::Paragraph)?;
                }
                Event::Text(text) => inline.pending.push_str(&text),
                Event::SoftBreak => inline.pending.push('\n'),
                Event::HardBreak => inline.flush_text(block),
                Event::Code(code) => {
                    tracing::warn!(%code, "inline code has no meaning here, kept as text");
                    inline.pending.push_str(&code);
                }
                Event::Start(Tag::Strong) => {
                    inline.flush_runs();
                    inline.bold += 1;
                }
                Event::End(TagEnd::Strong) => {
                    inline.flush_runs();
                    inline.bold = inline.bold.saturating_sub(1);
                }
                Event::Start(Tag::Emphasis) => {
                    inline.flush_runs();
                    inline.italic += 1;
                }
                Event::End(TagEnd::Emphasis) => {
                    inline.flush_runs();
                    inline.italic = inline.italic.saturating_sub(1);
                }
                Event::InlineMath(math) => {
                    inline.flush_runs();
                    inline
                        .text
                        .add_run(Run::new(math.trim(), RunStyle::FORMULA));
                }
                Event::DisplayMath(math) => {
                    inline.flush_text(block);
                    let alias = take_alias_line(block);
                    block.add_content(Content::Formula(Formula {
                        alias,
                        latex: math.trim().to_string(),
                        refname: None,
                    }));
                }
                Event::Start(Tag::Image { dest_url, .. }) => {
                    inline.flush_text(block);
                    let alt = self.collect_plain_until(TagEnd::Image);
                    let caption = Caption::parse(&normalize(&alt))?;
                    let src = (!dest_url.is_empty()).then(|| dest_url.to_string());
                    block.add_content(Content::Image(Image {
                        alias: caption.alias,
                        caption: caption.text,
                        src,
                        width_ratio: caption.width_ratio,
                        refname: None,
                    }));
                }
                // links and other inline wrappers contribute their text only
                Event::Start(_) | Event::End(_) => {}
                _ => {}
            }
        }
        inline.flush_text(block);
        Ok(())
    }

    fn parse_table(&mut self, block: &mut Block) -> Result<Table> {
        let caption_line = match block.content.last() {
            Some(Content::Text(text)) => Some(text.plain_text()),
            _ => None,
        };
        let caption = match caption_line {
            Some(raw) => {
                block.content.pop();
                Caption::parse(raw.trim())?
            }
            None => {
                tracing::warn!("table without a caption line above it");
                Caption {
                    alias: None,
                    text: String::new(),
                    width_ratio: None,
                }
            }
        };

        let mut rows: Vec<Row> = Vec::new();
        let mut next_has_border = false;
        while let Some(event) = self.bump() {
            match event {
                Event::Start(Tag::TableHead) => {
                    let cells = self.parse_row_cells(TagEnd::TableHead, true);
                    rows.push(Row::new(cells).with_top_border());
                    // the rule between header and body
                    next_has_border = true;
                }
                Event::Start(Tag::TableRow) => {
                    let cells = self.parse_row_cells(TagEnd::TableRow, false);
                    if is_rule_row(&cells) {
                        // an all-dashes row draws a border above the next row
                        next_has_border = true;
                        continue;
                    }
                    let mut row = Row::new(cells);
                    if next_has_border {
                        row = row.with_top_border();
                        next_has_border = false;
                    }
                    rows.push(row);
                }
                Event::End(TagEnd::Table) => break,
                _ => {}
            }
        }

        let mut table = Table::new(caption.text, rows)?;
        table.alias = caption.alias;
        Ok(table)
    }

    /// Cells of one table row. Header cells may be empty; body cells that
    /// are empty mean "merge with the cell above".
    fn parse_row_cells(&mut self, end: TagEnd, header: bool) -> Vec<Option<Text>> {
        let mut cells = Vec::new();
        while let Some(event) = self.bump() {
            match event {
                Event::Start(Tag::TableCell) => {
                    let raw = normalize(&self.collect_plain_until(TagEnd::TableCell));
                    if raw.is_empty() && !header {
                        cells.push(None);
                    } else {
                        cells.push(Some(Text::from_str(raw, RunStyle::NORMAL)));
                    }
                }
                Event::End(e) if e == end => break,
                _ => {}
            }
        }
        cells
    }

    fn parse_ordered_list(&mut self, depth: u8) -> Result<OrderedList> {
        let mut items = Vec::new();
        while let Some(event) = self.bump() {
            match event {
                Event::Start(Tag::Item) => {
                    let mut scratch = Block::new();
                    self.parse_inline(&mut scratch, StopAt::Item(depth))?;
                    items.push(ListItem::new(scratch.content));
                }
                Event::End(TagEnd::List(_)) => break,
                _ => {}
            }
        }
        Ok(OrderedList::new(items, depth.min(2)))
    }

    fn parse_code_block(&mut self, kind: CodeBlockKind) -> Result<()> {
        let info = match &kind {
            CodeBlockKind::Fenced(info) => info.trim().to_string(),
            CodeBlockKind::Indented => String::new(),
        };
        let body = self.collect_plain_until(TagEnd::CodeBlock);

        // the fence info may carry the kind, or the first body line may
        // (the original documents use both spellings)
        let (kind_word, entries) = if !info.is_empty() {
            (info, body.as_str())
        } else {
            match body.split_once('\n') {
                Some((first, rest)) => (first.trim().to_string(), rest),
                None => (body.trim().to_string(), ""),
            }
        };

        match kind_word.as_str() {
            "literature" => parse_literature(entries, &mut self.doc.bibliography),
            "bib" => {
                tracing::warn!("BibTeX sources are not supported, list entries directly");
                Ok(())
            }
            other => {
                tracing::warn!(kind = other, "code block has no meaning here, skipping");
                Ok(())
            }
        }
    }

    /// Concatenated text content up to (and consuming) the given end tag
    fn collect_plain_until(&mut self, end: TagEnd) -> String {
        let mut out = String::new();
        while let Some(event) = self.bump() {
            match event {
                Event::Text(t) | Event::Code(t) => out.push_str(&t),
                Event::SoftBreak | Event::HardBreak => out.push('\n'),
                Event::End(e) if e == end => break,
                _ => {}
            }
        }
        out
    }

    /// Skip a just-opened container and everything inside it
    fn skip_container(&mut self) {
        let mut depth = 1usize;
        while let Some(event) = self.bump() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

/// In-progress inline text of a paragraph
struct InlineBuilder {
    text: Text,
    pending: String,
    bold: usize,
    italic: usize,
}

impl Default for InlineBuilder {
    fn default() -> Self {
        Self {
            text: Text::new(),
            pending: String::new(),
            bold: 0,
            italic: 0,
        }
    }
}

impl InlineBuilder {
    fn style(&self) -> RunStyle {
        let mut style = RunStyle::NORMAL;
        if self.bold > 0 {
            style |= RunStyle::BOLD;
        }
        if self.italic > 0 {
            style |= RunStyle::ITALIC;
        }
        style
    }

    /// Turn accumulated raw text into runs, splitting out `[alias]`
    /// reference spans
    fn flush_runs(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let normalized = normalize(&self.pending);
        self.pending.clear();
        if normalized.is_empty() {
            return;
        }
        split_references(&normalized, self.style(), &mut self.text.runs);
    }

    fn flush_text(&mut self, block: &mut Block) {
        self.flush_runs();
        if !self.text.is_empty() {
            let done = std::mem::replace(&mut self.text, Text::new());
            block.add_content(Content::Text(done));
        }
    }
}

/// `[alias]` spans become reference runs; everything else keeps `style`
fn split_references(text: &str, style: RunStyle, runs: &mut Vec<Run>) {
    static REF_RE: OnceLock<Regex> = OnceLock::new();
    let re = REF_RE.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("static regex"));

    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            runs.push(Run::new(&text[last..m.start()], style));
        }
        // the match is `[alias]`, strip the brackets
        runs.push(Run::new(
            &text[m.start() + 1..m.end() - 1],
            RunStyle::REFERENCE,
        ));
        last = m.end();
    }
    if last < text.len() {
        runs.push(Run::new(&text[last..], style));
    }
}

/// Consume the alias line that must precede a display formula
fn take_alias_line(block: &mut Block) -> Option<String> {
    let alias = match block.content.last() {
        Some(Content::Text(text)) => text.plain_text().trim().to_string(),
        _ => return None,
    };
    block.content.pop();
    (!alias.is_empty()).then_some(alias)
}

fn is_rule_row(cells: &[Option<Text>]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| match c {
            Some(text) => {
                let t = text.plain_text();
                !t.is_empty() && t.chars().all(|ch| ch == '-')
            }
            None => false,
        })
}

//! Template document: ZIP plumbing, body model and anchor addressing

use super::{DEFAULT_PRINTABLE_WIDTH_TWIPS, TWIPS_PER_INCH};
use crate::error::{PaperError, Result, TemplateError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const SETTINGS_PART: &str = "word/settings.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Kind of a top-level body element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Paragraph,
    Table,
    /// Section properties and anything else that must survive body edits
    Other,
}

/// One top-level element of the document body.
///
/// The XML fragment is the source of truth; `text` and `style_name` are
/// extracted copies used for anchor matching only.
#[derive(Debug, Clone)]
pub struct BodyItem {
    pub kind: ItemKind,
    pub xml: String,
    pub text: String,
    pub style_name: Option<String>,
}

impl BodyItem {
    /// Wrap generated paragraph XML; the caller supplies the plain text and
    /// style name it was built from so later anchor searches still work.
    pub fn paragraph(xml: String, text: String, style_name: Option<String>) -> Self {
        Self {
            kind: ItemKind::Paragraph,
            xml,
            text,
            style_name,
        }
    }

    /// Wrap generated table XML
    pub fn table(xml: String) -> Self {
        Self {
            kind: ItemKind::Table,
            xml,
            text: String::new(),
            style_name: None,
        }
    }
}

/// A new media part to be appended to the archive on save
#[derive(Debug)]
struct MediaPart {
    name: String,
    extension: String,
    rel_id: String,
    bytes: Vec<u8>,
}

/// A pre-formatted .docx template opened for anchor-addressed editing.
///
/// Paragraphs are located by substring + style-name match, never by stable
/// identifiers; inserting before an index shifts everything at and after
/// it, deleting an index shifts everything after it. Callers are expected
/// to walk anchors in document order.
pub struct TemplateDocument {
    /// Original archive entries in order, minus the body we re-emit
    entries: Vec<(String, Vec<u8>)>,

    /// document.xml up to and including the `<w:body>` open tag
    prefix: String,

    /// `</w:body>` and everything after it
    suffix: String,

    body: Vec<BodyItem>,

    /// style id -> human style name, from styles.xml
    style_names: HashMap<String, String>,

    /// style name -> style id
    style_ids: HashMap<String, String>,

    media: Vec<MediaPart>,
    next_rel_num: usize,
    next_doc_pr_id: usize,
    printable_width_twips: i64,
    update_toc: bool,
}

impl TemplateDocument {
    /// Open a template .docx from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!(path = %path.as_ref().display(), "reading template");
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Open a template .docx from any seekable reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).map_err(|e| malformed("archive", e))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| malformed("archive", e))?;
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            entries.push((entry.name().to_string(), bytes));
        }

        let document_xml = find_part(&entries, DOCUMENT_PART)?;
        let document_xml = String::from_utf8(document_xml.to_vec())
            .map_err(|e| malformed(DOCUMENT_PART, e))?;
        let styles_xml = find_part(&entries, STYLES_PART)?;
        let styles_xml =
            String::from_utf8(styles_xml.to_vec()).map_err(|e| malformed(STYLES_PART, e))?;

        let (prefix, inner, suffix) = split_body(&document_xml)?;
        let style_names = parse_style_names(&styles_xml)?;
        let style_ids = style_names
            .iter()
            .map(|(id, name)| (name.clone(), id.clone()))
            .collect();

        let mut body = Vec::new();
        for fragment in split_top_level(&inner)? {
            let item = classify_fragment(fragment, &style_names)?;
            // Placeholder tables in the template are never reused; dropping
            // them up front keeps anchor walking purely paragraph-based.
            if item.kind == ItemKind::Table {
                continue;
            }
            body.push(item);
        }

        let printable_width_twips = parse_printable_width(&document_xml);
        let next_rel_num = max_rel_num(&entries) + 1;

        Ok(Self {
            entries,
            prefix,
            suffix,
            body,
            style_names,
            style_ids,
            media: Vec::new(),
            next_rel_num,
            next_doc_pr_id: 1000,
            printable_width_twips,
            update_toc: false,
        })
    }

    /// Number of body items currently in the document
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Plain text of the body item at `index`
    pub fn text_at(&self, index: usize) -> &str {
        &self.body[index].text
    }

    /// Printable page width (page width minus margins) in twips
    pub fn printable_width_twips(&self) -> i64 {
        self.printable_width_twips
    }

    /// Printable page width in inches
    pub fn printable_width_inches(&self) -> f64 {
        self.printable_width_twips as f64 / TWIPS_PER_INCH as f64
    }

    /// Resolve a style name ("Heading 1", "图名中文") to its style id.
    ///
    /// A style missing from the template is a configuration error.
    pub fn style_id(&self, name: &str) -> Result<&str> {
        self.style_ids
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::StyleNotFound(name.to_string()).into())
    }

    /// Find the first paragraph whose text contains `anchor_text`,
    /// optionally constrained to an exact style name, and return the index
    /// immediately after it.
    ///
    /// Multiple matches silently take the first; the fixed template
    /// guarantees anchor uniqueness by construction.
    pub fn anchor_after(&self, anchor_text: &str, style_name: Option<&str>) -> Result<usize> {
        for (i, item) in self.body.iter().enumerate() {
            if item.kind != ItemKind::Paragraph || !item.text.contains(anchor_text) {
                continue;
            }
            if let Some(want) = style_name {
                if item.style_name.as_deref() != Some(want) {
                    continue;
                }
            }
            return Ok(i + 1);
        }
        Err(TemplateError::AnchorNotFound(anchor_text.to_string()).into())
    }

    /// Insert an item immediately before `index`; the target index keeps
    /// addressing the same element, now shifted one further.
    pub fn insert_before(&mut self, index: usize, item: BodyItem) {
        self.body.insert(index.min(self.body.len()), item);
    }

    /// Delete the item at `index`, shifting all later indices down by one
    pub fn delete(&mut self, index: usize) {
        tracing::debug!(index, text = %self.body[index].text, "deleting body item");
        self.body.remove(index);
    }

    /// Delete forward from `index` until a paragraph containing `sentinel`
    /// is reached (the sentinel survives). Returns the number deleted.
    ///
    /// This is how template placeholder runs of unknown length are
    /// consumed before real content is inserted.
    pub fn delete_until(&mut self, index: usize, sentinel: &str) -> usize {
        let mut deleted = 0;
        while index < self.body.len() {
            let item = &self.body[index];
            if item.kind == ItemKind::Other || item.text.contains(sentinel) {
                break;
            }
            self.body.remove(index);
            deleted += 1;
        }
        tracing::debug!(deleted, sentinel, "consumed placeholder paragraphs");
        deleted
    }

    /// Delete every paragraph and table from `index` to the end of the
    /// body, keeping section properties intact
    pub fn clear_from(&mut self, index: usize) {
        let mut i = index;
        while i < self.body.len() {
            if self.body[i].kind == ItemKind::Other {
                i += 1;
            } else {
                self.body.remove(i);
            }
        }
    }

    /// Overwrite the text of the first run of the paragraph at `index`,
    /// keeping the run's formatting
    pub fn set_first_run_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.set_run_text(index, text, false)
    }

    /// Overwrite the text of the last run of the paragraph at `index`
    pub fn set_last_run_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.set_run_text(index, text, true)
    }

    fn set_run_text(&mut self, index: usize, text: &str, last: bool) -> Result<()> {
        let item = &mut self.body[index];
        let rewritten = replace_wt(&item.xml, text, last)
            .ok_or(TemplateError::EmptyParagraph(index))?;
        item.xml = rewritten;
        item.text = extract_wt_text(&item.xml);
        Ok(())
    }

    /// Set the first run of every page header to the given text
    /// (tab-centered running title)
    pub fn set_header_text(&mut self, text: &str) {
        let replacement = format!("\t{}\t", text);
        for (name, bytes) in &mut self.entries {
            if !name.starts_with("word/header") || !name.ends_with(".xml") {
                continue;
            }
            let Ok(xml) = std::str::from_utf8(bytes) else {
                continue;
            };
            if let Some(updated) = replace_wt(xml, &replacement, false) {
                *bytes = updated.into_bytes();
            }
        }
    }

    /// Register image bytes as a media part; returns the relationship id
    /// and a unique drawing id for the picture markup
    pub fn register_image(&mut self, bytes: Vec<u8>, extension: &str) -> (String, usize) {
        let rel_id = format!("rId{}", self.next_rel_num);
        self.next_rel_num += 1;
        let doc_pr_id = self.next_doc_pr_id;
        self.next_doc_pr_id += 1;
        let name = format!("word/media/mdpaper{}.{}", self.media.len() + 1, extension);
        self.media.push(MediaPart {
            name,
            extension: extension.to_string(),
            rel_id: rel_id.clone(),
            bytes,
        });
        (rel_id, doc_pr_id)
    }

    /// Flag the table of contents for recalculation on next open
    pub fn flag_toc_update(&mut self) {
        self.update_toc = true;
    }

    /// Write the edited archive to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(file)?;
        tracing::info!(path = %path.as_ref().display(), "document saved");
        Ok(())
    }

    /// Write the edited archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (name, bytes) in &self.entries {
            zip.start_file(name.clone(), options)
                .map_err(|e| malformed(name, e))?;
            match name.as_str() {
                DOCUMENT_PART => zip.write_all(self.render_document_xml().as_bytes())?,
                SETTINGS_PART if self.update_toc => {
                    zip.write_all(flag_update_fields(bytes)?.as_bytes())?
                }
                RELS_PART if !self.media.is_empty() => {
                    zip.write_all(self.extend_relationships(bytes)?.as_bytes())?
                }
                CONTENT_TYPES_PART if !self.media.is_empty() => {
                    zip.write_all(self.extend_content_types(bytes)?.as_bytes())?
                }
                _ => zip.write_all(bytes)?,
            }
        }

        for part in &self.media {
            zip.start_file(part.name.clone(), options)
                .map_err(|e| malformed(&part.name, e))?;
            zip.write_all(&part.bytes)?;
        }

        zip.finish().map_err(|e| malformed("archive", e))?;
        Ok(())
    }

    fn render_document_xml(&self) -> String {
        let mut out = String::with_capacity(
            self.prefix.len()
                + self.suffix.len()
                + self.body.iter().map(|i| i.xml.len()).sum::<usize>(),
        );
        out.push_str(&self.prefix);
        for item in &self.body {
            out.push_str(&item.xml);
        }
        out.push_str(&self.suffix);
        out
    }

    fn extend_relationships(&self, bytes: &[u8]) -> Result<String> {
        let xml = std::str::from_utf8(bytes).map_err(|e| malformed(RELS_PART, e))?;
        let mut additions = String::new();
        for part in &self.media {
            additions.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"{}\"/>",
                part.rel_id,
                part.name.trim_start_matches("word/"),
            ));
        }
        insert_before_close(xml, "</Relationships>", &additions)
            .ok_or_else(|| malformed(RELS_PART, "missing </Relationships>"))
            .map_err(PaperError::from)
    }

    fn extend_content_types(&self, bytes: &[u8]) -> Result<String> {
        let xml = std::str::from_utf8(bytes).map_err(|e| malformed(CONTENT_TYPES_PART, e))?;
        let mut additions = String::new();
        for part in &self.media {
            let ext = part.extension.as_str();
            if xml.contains(&format!("Extension=\"{}\"", ext)) || additions.contains(ext) {
                continue;
            }
            let mime = match ext {
                "png" => "image/png",
                "jpg" | "jpeg" => "image/jpeg",
                "gif" => "image/gif",
                "bmp" => "image/bmp",
                other => {
                    tracing::warn!(extension = other, "unknown image type, defaulting to png");
                    "image/png"
                }
            };
            additions.push_str(&format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                ext, mime
            ));
        }
        insert_before_close(xml, "</Types>", &additions)
            .ok_or_else(|| malformed(CONTENT_TYPES_PART, "missing </Types>"))
            .map_err(PaperError::from)
    }
}

fn malformed(part: &str, detail: impl ToString) -> TemplateError {
    TemplateError::MalformedPart {
        part: part.to_string(),
        detail: detail.to_string(),
    }
}

fn find_part<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Result<&'a [u8]> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, b)| b.as_slice())
        .ok_or_else(|| malformed(name, "part missing from archive").into())
}

fn insert_before_close(xml: &str, close_tag: &str, additions: &str) -> Option<String> {
    let pos = xml.rfind(close_tag)?;
    let mut out = String::with_capacity(xml.len() + additions.len());
    out.push_str(&xml[..pos]);
    out.push_str(additions);
    out.push_str(&xml[pos..]);
    Some(out)
}

fn flag_update_fields(bytes: &[u8]) -> Result<String> {
    let xml = std::str::from_utf8(bytes).map_err(|e| malformed(SETTINGS_PART, e))?;
    if xml.contains("w:updateFields") {
        return Ok(xml.to_string());
    }
    insert_before_close(xml, "</w:settings>", "<w:updateFields w:val=\"true\"/>")
        .ok_or_else(|| malformed(SETTINGS_PART, "missing </w:settings>").into())
}

/// Split document.xml into (prefix incl. `<w:body>`, body inner XML,
/// `</w:body>` suffix)
fn split_body(xml: &str) -> Result<(String, String, String)> {
    let body_open = xml
        .find("<w:body")
        .ok_or_else(|| malformed(DOCUMENT_PART, "missing <w:body>"))?;
    let content_start = xml[body_open..]
        .find('>')
        .map(|p| body_open + p + 1)
        .ok_or_else(|| malformed(DOCUMENT_PART, "unterminated <w:body>"))?;
    let body_close = xml
        .rfind("</w:body>")
        .ok_or_else(|| malformed(DOCUMENT_PART, "missing </w:body>"))?;

    Ok((
        xml[..content_start].to_string(),
        xml[content_start..body_close].to_string(),
        xml[body_close..].to_string(),
    ))
}

/// Split body XML into its top-level element fragments
fn split_top_level(inner: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(inner);
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    loop {
        let pos_before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| malformed(DOCUMENT_PART, e))?;
        let pos_after = reader.buffer_position() as usize;
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    start = pos_before;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    fragments.push(inner[start..pos_after].to_string());
                }
            }
            Event::Empty(_) => {
                if depth == 0 {
                    fragments.push(inner[pos_before..pos_after].to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(fragments)
}

fn classify_fragment(
    xml: String,
    style_names: &HashMap<String, String>,
) -> Result<BodyItem> {
    let kind = if xml.starts_with("<w:p>") || xml.starts_with("<w:p ") || xml == "<w:p/>" {
        ItemKind::Paragraph
    } else if xml.starts_with("<w:tbl") {
        ItemKind::Table
    } else {
        ItemKind::Other
    };

    if kind != ItemKind::Paragraph {
        return Ok(BodyItem {
            kind,
            xml,
            text: String::new(),
            style_name: None,
        });
    }

    let (text, style_id) = parse_paragraph(&xml)?;
    let style_name = style_id.and_then(|id| style_names.get(&id).cloned());
    Ok(BodyItem {
        kind,
        xml,
        text,
        style_name,
    })
}

/// Extract the concatenated `w:t` text and the `w:pStyle` id of a
/// paragraph fragment
fn parse_paragraph(xml: &str) -> Result<(String, Option<String>)> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut style_id = None;
    let mut in_wt = false;

    loop {
        match reader.read_event().map_err(|e| malformed(DOCUMENT_PART, e))? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_wt = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_wt = false,
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"w:pStyle" => {
                if style_id.is_none() {
                    if let Ok(Some(attr)) = e.try_get_attribute("w:val") {
                        style_id = Some(
                            attr.unescape_value()
                                .map_err(|err| malformed(DOCUMENT_PART, err))?
                                .into_owned(),
                        );
                    }
                }
            }
            Event::Text(t) if in_wt => {
                text.push_str(&t.unescape().map_err(|e| malformed(DOCUMENT_PART, e))?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((text, style_id))
}

fn extract_wt_text(xml: &str) -> String {
    parse_paragraph(xml).map(|(t, _)| t).unwrap_or_default()
}

/// Replace the first (or last) `w:t` element's content, normalizing the
/// opening tag to preserve whitespace. Returns `None` when the fragment
/// has no text run.
fn replace_wt(xml: &str, new_text: &str, last: bool) -> Option<String> {
    let pattern = regex::Regex::new(r"(?s)<w:t(?:\s[^>]*)?>.*?</w:t>").expect("static regex");
    let m = if last {
        pattern.find_iter(xml).last()?
    } else {
        pattern.find(xml)?
    };
    let replacement = format!(
        "<w:t xml:space=\"preserve\">{}</w:t>",
        super::ooxml::esc(new_text)
    );
    let mut out = String::with_capacity(xml.len() + replacement.len());
    out.push_str(&xml[..m.start()]);
    out.push_str(&replacement);
    out.push_str(&xml[m.end()..]);
    Some(out)
}

/// Map style id -> style name from styles.xml
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| malformed(STYLES_PART, e))? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                current_id = e
                    .try_get_attribute("w:styleId")
                    .ok()
                    .flatten()
                    .and_then(|a| a.unescape_value().ok())
                    .map(|v| v.into_owned());
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => current_id = None,
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"w:name" => {
                if let (Some(id), Ok(Some(attr))) =
                    (current_id.as_ref(), e.try_get_attribute("w:val"))
                {
                    if let Ok(name) = attr.unescape_value() {
                        names.insert(id.clone(), name.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}

/// Printable width = page width minus left and right margins, from the
/// section properties; falls back to six inches
fn parse_printable_width(document_xml: &str) -> i64 {
    let grab = |re: &str| -> Option<i64> {
        regex::Regex::new(re)
            .ok()?
            .captures(document_xml)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    };
    let page = grab(r#"<w:pgSz[^>]*\sw:w="(\d+)""#);
    let left = grab(r#"<w:pgMar[^>]*\sw:left="(\d+)""#);
    let right = grab(r#"<w:pgMar[^>]*\sw:right="(\d+)""#);
    match (page, left, right) {
        (Some(p), Some(l), Some(r)) if p > l + r => p - l - r,
        _ => DEFAULT_PRINTABLE_WIDTH_TWIPS,
    }
}

fn max_rel_num(entries: &[(String, Vec<u8>)]) -> usize {
    let Some((_, bytes)) = entries.iter().find(|(n, _)| n == RELS_PART) else {
        return 100;
    };
    let Ok(xml) = std::str::from_utf8(bytes) else {
        return 100;
    };
    let re = regex::Regex::new(r#"Id="rId(\d+)""#).expect("static regex");
    re.captures_iter(xml)
        .filter_map(|c| c.get(1)?.as_str().parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

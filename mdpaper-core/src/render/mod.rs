//! Template renderer: walks a [`Block`] tree and splices OOXML into the
//! document at a moving cursor

use crate::docx::ooxml::{self, BorderLine, CellBorders, CellOpts, ParaOpts, VMerge};
use crate::docx::{
    latex_to_omml, BodyItem, TemplateDocument, EMUS_PER_INCH, FIRST_LINE_INDENT_TWIPS,
    TWIPS_PER_INCH,
};
use crate::error::{ResourceError, Result};
use crate::types::{
    Block, Content, Formula, Image, OrderedList, Table, Text, MAX_WIDTH_INCHES,
};
use std::path::{Path, PathBuf};

/// Style names the renderer expects the template to define
#[derive(Debug, Clone)]
pub struct RenderStyles {
    /// Centered caption style shared by figures, tables and formula labels
    pub caption: String,
    /// Built-in grid style applied to content tables
    pub table: String,
}

impl Default for RenderStyles {
    fn default() -> Self {
        Self {
            caption: "图名中文".to_string(),
            table: "Table Grid".to_string(),
        }
    }
}

/// Inserts rendered blocks into a [`TemplateDocument`].
///
/// The cursor is a body index; every insertion happens before it and
/// advances it, so consecutive renders land in document order.
pub struct Renderer<'a> {
    doc: &'a mut TemplateDocument,
    styles: RenderStyles,
    /// Directory that relative image paths resolve against
    base_dir: PathBuf,
}

impl<'a> Renderer<'a> {
    pub fn new(doc: &'a mut TemplateDocument, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            doc,
            styles: RenderStyles::default(),
            base_dir: base_dir.into(),
        }
    }

    pub fn with_styles(mut self, styles: RenderStyles) -> Self {
        self.styles = styles;
        self
    }

    /// Render a block tree at `cursor`; returns the cursor position after
    /// the rendered content
    pub fn render(&mut self, block: &Block, mut cursor: usize) -> Result<usize> {
        cursor = self.render_title(block, cursor)?;

        for (i, content) in block.content.iter().enumerate() {
            cursor = self.render_content(content, cursor)?;
            // one spacer line between adjacent media items, none next to
            // plain text or lists
            if let Some(next) = block.content.get(i + 1) {
                if content.is_media() && next.is_media() {
                    cursor = self.insert_paragraph(cursor, ooxml::empty_paragraph(), "", None);
                }
            }
        }

        for sub in &block.sub_blocks {
            cursor = self.render(sub, cursor)?;
        }
        Ok(cursor)
    }

    fn render_title(&mut self, block: &Block, cursor: usize) -> Result<usize> {
        let Some(title) = &block.title else {
            return Ok(cursor);
        };
        tracing::debug!(level = block.level, title, "rendering block title");
        let style_name = format!("Heading {}", block.level);
        let style_id = self.doc.style_id(&style_name)?.to_string();

        let mut children = String::new();
        // chapters start on a fresh page
        if block.level == 1 {
            children.push_str(&ooxml::page_break_run());
        }
        children.push_str(&ooxml::run(title, crate::types::RunStyle::NORMAL));

        let opts = ParaOpts {
            style_id: Some(style_id),
            ..Default::default()
        };
        let xml = ooxml::paragraph(&opts, &children);
        Ok(self.insert_item(
            cursor,
            BodyItem::paragraph(xml, title.clone(), Some(style_name)),
        ))
    }

    fn render_content(&mut self, content: &Content, cursor: usize) -> Result<usize> {
        match content {
            Content::Text(text) => self.render_text(text, cursor),
            Content::Image(image) => self.render_image(image, cursor),
            Content::Table(table) => self.render_table(table, cursor),
            Content::Formula(formula) => self.render_formula(formula, cursor),
            Content::List(list) => self.render_list(list, cursor),
        }
    }

    fn render_text(&mut self, text: &Text, cursor: usize) -> Result<usize> {
        let style_name = text.forced_style.clone();
        let style_id = match &style_name {
            Some(name) => Some(self.doc.style_id(name)?.to_string()),
            None => None,
        };
        let opts = ParaOpts {
            style_id,
            first_line_indent_twips: text
                .first_line_indent
                .then_some(FIRST_LINE_INDENT_TWIPS),
            right_tab_twips: text
                .runs
                .iter()
                .any(|r| r.tab_stop)
                .then(|| self.doc.printable_width_twips()),
            ..Default::default()
        };
        let children = ooxml::text_runs(&text.runs, |latex| latex_to_omml(latex, true))?;
        let xml = ooxml::paragraph(&opts, &children);
        Ok(self.insert_item(
            cursor,
            BodyItem::paragraph(xml, text.plain_text(), style_name),
        ))
    }

    fn render_image(&mut self, image: &Image, cursor: usize) -> Result<usize> {
        let mut cursor = cursor;
        if let Some(src) = &image.src {
            let path = self.resolve_path(src);
            let bytes = std::fs::read(&path).map_err(|e| ResourceError::ImageUnreadable {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
            let dims = imagesize::blob_size(&bytes)
                .map_err(|_| ResourceError::ImageDimensions(path.display().to_string()))?;
            let (width_in, height_in) = image.display_size(dims.width as u64, dims.height as u64);
            let cx = (width_in * EMUS_PER_INCH as f64) as i64;
            let cy = (height_in * EMUS_PER_INCH as f64) as i64;
            tracing::debug!(src, width_in, height_in, "embedding image");

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_else(|| "png".to_string());
            let (rel_id, doc_pr_id) = self.doc.register_image(bytes, &ext);

            let opts = self.caption_opts("center")?;
            let drawing = ooxml::drawing(&rel_id, doc_pr_id, &image.caption, cx, cy);
            let xml = ooxml::paragraph(&opts, &drawing);
            cursor = self.insert_item(cursor, BodyItem::paragraph(xml, String::new(), None));
        }
        // caption line below the picture
        let label = match &image.refname {
            Some(refname) => format!("{}  {}", refname, image.caption),
            None => image.caption.clone(),
        };
        self.caption_paragraph(cursor, &label, "center")
    }

    fn render_table(&mut self, table: &Table, cursor: usize) -> Result<usize> {
        let label = match &table.refname {
            Some(refname) => format!("{}  {}", refname, table.caption),
            None => table.caption.clone(),
        };
        let cursor = self.caption_paragraph(cursor, &label, "center")?;

        let widths_twips: Option<Vec<i64>> = table.column_widths().map(|ws| {
            ws.iter()
                .map(|w| (w * MAX_WIDTH_INCHES * TWIPS_PER_INCH as f64) as i64)
                .collect()
        });

        let rows = table.rows();
        let last_row = rows.len() - 1;
        let mut rows_xml = String::new();
        for (i, row) in rows.iter().enumerate() {
            let mut cells_xml = String::new();
            for (j, cell) in row.cells.iter().enumerate() {
                let borders = CellBorders {
                    top: if row.top_border {
                        BorderLine::Solid
                    } else {
                        BorderLine::Hidden
                    },
                    bottom: if i == last_row {
                        BorderLine::Solid
                    } else {
                        BorderLine::Hidden
                    },
                    left: BorderLine::Hidden,
                    right: BorderLine::Hidden,
                };
                let v_merge = match cell {
                    None => Some(VMerge::Continue),
                    Some(_) => {
                        let merged_below = rows
                            .get(i + 1)
                            .map(|r| r.cells.get(j).map(|c| c.is_none()).unwrap_or(false))
                            .unwrap_or(false);
                        merged_below.then_some(VMerge::Restart)
                    }
                };
                let opts = CellOpts {
                    width_twips: widths_twips.as_ref().map(|ws| ws[j]),
                    borders: Some(borders),
                    v_merge,
                };
                let para = match cell {
                    Some(text) => {
                        let children =
                            ooxml::text_runs(&text.runs, |latex| latex_to_omml(latex, true))?;
                        ooxml::paragraph(
                            &ParaOpts {
                                justify: Some("center"),
                                ..Default::default()
                            },
                            &children,
                        )
                    }
                    None => ooxml::paragraph(&ParaOpts::default(), ""),
                };
                cells_xml.push_str(&ooxml::table_cell(&opts, &para));
            }
            rows_xml.push_str(&ooxml::table_row(&cells_xml));
        }

        let table_style_id = self.doc.style_id(&self.styles.table)?.to_string();
        let xml = ooxml::table(Some(&table_style_id), widths_twips.as_deref(), &rows_xml);
        Ok(self.insert_item(cursor, BodyItem::table(xml)))
    }

    /// A formula sits in a borderless one-row, three-column table: empty
    /// cell, centered math, right-aligned label
    fn render_formula(&mut self, formula: &Formula, cursor: usize) -> Result<usize> {
        let col = self.doc.printable_width_twips() / 3;
        let caption_style_id = self.doc.style_id(&self.styles.caption)?.to_string();

        let omath = latex_to_omml(&formula.latex, false)?;
        let math_para = ooxml::paragraph(
            &ParaOpts {
                justify: Some("center"),
                ..Default::default()
            },
            &omath,
        );
        let label_para = ooxml::paragraph(
            &ParaOpts {
                style_id: Some(caption_style_id),
                justify: Some("right"),
                ..Default::default()
            },
            &ooxml::run(
                formula.refname.as_deref().unwrap_or(""),
                crate::types::RunStyle::NORMAL,
            ),
        );

        let cell = |para: &str, width: i64| {
            ooxml::table_cell(
                &CellOpts {
                    width_twips: Some(width),
                    borders: Some(CellBorders::hidden()),
                    v_merge: None,
                },
                para,
            )
        };
        let cells = format!(
            "{}{}{}",
            cell(&ooxml::paragraph(&ParaOpts::default(), ""), col),
            cell(&math_para, col),
            cell(&label_para, col),
        );
        let xml = ooxml::table(None, Some(&[col, col, col]), &ooxml::table_row(&cells));
        Ok(self.insert_item(cursor, BodyItem::table(xml)))
    }

    fn render_list(&mut self, list: &OrderedList, cursor: usize) -> Result<usize> {
        let mut cursor = cursor;
        for (i, item) in list.items.iter().enumerate() {
            let prefix = list.index_prefix(i);
            for (k, content) in item.content.iter().enumerate() {
                if k == 0 {
                    match content {
                        Content::Text(text) => {
                            let mut numbered = text.clone();
                            numbered
                                .runs
                                .insert(0, crate::types::Run::new(&prefix, crate::types::RunStyle::NORMAL));
                            cursor = self.render_text(&numbered, cursor)?;
                            continue;
                        }
                        _ => {
                            // media item: the number stands on its own line
                            cursor = self.render_text(
                                &Text::from_str(&prefix, crate::types::RunStyle::NORMAL),
                                cursor,
                            )?;
                        }
                    }
                }
                cursor = self.render_content(content, cursor)?;
            }
        }
        Ok(cursor)
    }

    fn caption_opts(&self, justify: &'static str) -> Result<ParaOpts> {
        Ok(ParaOpts {
            style_id: Some(self.doc.style_id(&self.styles.caption)?.to_string()),
            justify: Some(justify),
            ..Default::default()
        })
    }

    fn caption_paragraph(
        &mut self,
        cursor: usize,
        text: &str,
        justify: &'static str,
    ) -> Result<usize> {
        let opts = self.caption_opts(justify)?;
        let xml = ooxml::paragraph(&opts, &ooxml::run(text, crate::types::RunStyle::NORMAL));
        Ok(self.insert_item(
            cursor,
            BodyItem::paragraph(xml, text.to_string(), Some(self.styles.caption.clone())),
        ))
    }

    fn insert_paragraph(
        &mut self,
        cursor: usize,
        xml: String,
        text: &str,
        style_name: Option<String>,
    ) -> usize {
        self.insert_item(
            cursor,
            BodyItem::paragraph(xml, text.to_string(), style_name),
        )
    }

    fn insert_item(&mut self, cursor: usize, item: BodyItem) -> usize {
        self.doc.insert_before(cursor, item);
        cursor + 1
    }

    fn resolve_path(&self, src: &str) -> PathBuf {
        let p = Path::new(src);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::minimal_template;
    use crate::types::{Row, Run, RunStyle};
    use std::io::Cursor as IoCursor;

    fn open_doc() -> TemplateDocument {
        TemplateDocument::from_reader(IoCursor::new(minimal_template())).unwrap()
    }

    fn end_cursor(doc: &TemplateDocument) -> usize {
        doc.len()
    }

    #[test]
    fn test_chapter_title_gets_page_break() {
        let mut doc = open_doc();
        let cursor = end_cursor(&doc);
        let mut block = Block::new();
        block.set_title("绪论", 1).unwrap();

        let mut renderer = Renderer::new(&mut doc, ".");
        let after = renderer.render(&block, cursor).unwrap();
        assert_eq!(after, cursor + 1);
        let idx = doc.anchor_after("绪论", Some("Heading 1")).unwrap() - 1;
        assert_eq!(idx, cursor);
    }

    #[test]
    fn test_media_spacing() {
        let mut doc = open_doc();
        let cursor = end_cursor(&doc);

        let mut block = Block::new();
        block.add_content(Content::Text(Text::from_str("前文", RunStyle::NORMAL)));
        block.add_content(Content::Formula(Formula {
            alias: None,
            latex: "x".into(),
            refname: Some("（1.1）".into()),
        }));
        block.add_content(Content::Image(Image {
            alias: None,
            caption: "结构".into(),
            src: None,
            width_ratio: None,
            refname: Some("图1.1".into()),
        }));
        block.add_content(Content::Text(Text::from_str("后文", RunStyle::NORMAL)));

        let mut renderer = Renderer::new(&mut doc, ".");
        let after = renderer.render(&block, cursor).unwrap();
        // text, formula table, spacer, image caption, text: the spacer
        // sits only between the two media items, never next to text
        assert_eq!(after, cursor + 5);
        assert_eq!(doc.text_at(cursor), "前文");
        assert_eq!(doc.text_at(cursor + 2), "");
        assert_eq!(doc.text_at(cursor + 3), "图1.1  结构");
        assert_eq!(doc.text_at(cursor + 4), "后文");
    }

    #[test]
    fn test_table_borders_and_merge() {
        let mut doc = open_doc();
        let cursor = end_cursor(&doc);

        let rows = vec![
            Row::new(vec![
                Some(Text::from_str("列甲", RunStyle::NORMAL)),
                Some(Text::from_str("列乙", RunStyle::NORMAL)),
            ]),
            Row::new(vec![
                Some(Text::from_str("值", RunStyle::NORMAL)),
                Some(Text::from_str("一", RunStyle::NORMAL)),
            ])
            .with_top_border(),
            Row::new(vec![None, Some(Text::from_str("二", RunStyle::NORMAL))]),
        ];
        let mut table = Table::new("样例", rows).unwrap();
        table.alias = Some("tab-x".into());
        let mut block = Block::new();
        block.add_content(Content::Table(table));

        let mut renderer = Renderer::new(&mut doc, ".");
        renderer.render(&block, cursor).unwrap();

        // caption precedes the grid
        assert!(doc.text_at(cursor).contains("样例"));
        let xml = doc_xml(&doc);
        assert!(xml.contains("<w:vMerge w:val=\"restart\"/>"));
        assert!(xml.contains("<w:vMerge/>"));
        // the header separator row carries a black top border
        assert!(xml.contains("<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"000000\"/>"));
    }

    #[test]
    fn test_formula_row_layout() {
        let mut doc = open_doc();
        let cursor = end_cursor(&doc);
        let mut block = Block::new();
        block.add_content(Content::Formula(Formula {
            alias: Some("eq-a".into()),
            latex: "E = mc^2".into(),
            refname: Some("（2.1）".into()),
        }));

        let mut renderer = Renderer::new(&mut doc, ".");
        renderer.render(&block, cursor).unwrap();
        let xml = doc_xml(&doc);
        assert!(xml.contains("m:oMath"));
        assert!(xml.contains("（2.1）"));
        assert!(xml.contains("<w:jc w:val=\"right\"/>"));
        // all edges hidden
        assert!(!xml[xml.find("（2.1）").unwrap()..].contains("w:color=\"000000\""));
    }

    #[test]
    fn test_captionless_image_renders_caption_only() {
        let mut doc = open_doc();
        let cursor = end_cursor(&doc);
        let mut block = Block::new();
        block.add_content(Content::Image(Image {
            alias: Some("fig-a".into()),
            caption: "结构图".into(),
            src: None,
            width_ratio: None,
            refname: Some("图1.1".into()),
        }));

        let mut renderer = Renderer::new(&mut doc, ".");
        let after = renderer.render(&block, cursor).unwrap();
        assert_eq!(after, cursor + 1);
        assert_eq!(doc.text_at(cursor), "图1.1  结构图");
    }

    #[test]
    fn test_ordered_list_prefixes() {
        let mut doc = open_doc();
        let cursor = end_cursor(&doc);
        let list = OrderedList {
            items: vec![
                crate::types::ListItem {
                    content: vec![Content::Text(Text::from_str("第一项", RunStyle::NORMAL))],
                },
                crate::types::ListItem {
                    content: vec![Content::Text(Text::from_str("第二项", RunStyle::NORMAL))],
                },
            ],
            depth: 1,
        };
        let mut block = Block::new();
        block.add_content(Content::List(list));

        let mut renderer = Renderer::new(&mut doc, ".");
        renderer.render(&block, cursor).unwrap();
        assert_eq!(doc.text_at(cursor), "（1） 第一项");
        assert_eq!(doc.text_at(cursor + 1), "（2） 第二项");
    }

    fn doc_xml(doc: &TemplateDocument) -> String {
        let mut buf = IoCursor::new(Vec::new());
        doc.write_to(&mut buf).unwrap();
        buf.set_position(0);
        let mut archive = zip::ZipArchive::new(buf).unwrap();
        let mut xml = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("word/document.xml").unwrap(),
            &mut xml,
        )
        .unwrap();
        xml
    }
}

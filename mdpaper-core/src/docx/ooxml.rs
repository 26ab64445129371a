//! Raw OOXML fragment builders
//!
//! Generated content is spliced into the template's `word/document.xml` as
//! literal XML, so these helpers produce strings rather than a DOM. All
//! text goes through [`esc`] and every `w:t` carries `xml:space="preserve"`
//! because blank-fill runs are whitespace-significant.

use crate::types::{Run, RunStyle};

/// Escape text for use in XML content or attribute values
pub fn esc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Paragraph-level options
#[derive(Debug, Clone, Default)]
pub struct ParaOpts {
    /// Resolved style id (not name)
    pub style_id: Option<String>,

    /// `center` / `right` justification
    pub justify: Option<&'static str>,

    pub first_line_indent_twips: Option<i64>,

    /// Right-aligned tab stop position, for tab-stop runs
    pub right_tab_twips: Option<i64>,
}

/// Build a `w:p` paragraph around pre-rendered child XML (runs, drawings,
/// math)
pub fn paragraph(opts: &ParaOpts, children: &str) -> String {
    let mut ppr = String::new();
    if let Some(style) = &opts.style_id {
        ppr.push_str(&format!("<w:pStyle w:val=\"{}\"/>", esc(style)));
    }
    if let Some(pos) = opts.right_tab_twips {
        ppr.push_str(&format!(
            "<w:tabs><w:tab w:val=\"right\" w:pos=\"{}\"/></w:tabs>",
            pos
        ));
    }
    if let Some(indent) = opts.first_line_indent_twips {
        ppr.push_str(&format!("<w:ind w:firstLine=\"{}\"/>", indent));
    }
    if let Some(jc) = opts.justify {
        ppr.push_str(&format!("<w:jc w:val=\"{}\"/>", jc));
    }

    if ppr.is_empty() {
        format!("<w:p>{}</w:p>", children)
    } else {
        format!("<w:p><w:pPr>{}</w:pPr>{}</w:p>", ppr, children)
    }
}

/// An empty spacer paragraph
pub fn empty_paragraph() -> String {
    "<w:p/>".to_string()
}

/// A run of literal text with the given style mask
pub fn run(text: &str, style: RunStyle) -> String {
    let mut rpr = String::new();
    if style.contains(RunStyle::BOLD) {
        rpr.push_str("<w:b/>");
    }
    if style.contains(RunStyle::ITALIC) {
        rpr.push_str("<w:i/>");
    }
    if style.contains(RunStyle::SUPERSCRIPT) {
        rpr.push_str("<w:vertAlign w:val=\"superscript\"/>");
    } else if style.contains(RunStyle::SUBSCRIPT) {
        rpr.push_str("<w:vertAlign w:val=\"subscript\"/>");
    }

    let rpr = if rpr.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", rpr)
    };
    format!(
        "<w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        rpr,
        esc(text)
    )
}

/// A run holding only a tab character (pairs with a right tab stop)
pub fn tab_run() -> String {
    "<w:r><w:tab/></w:r>".to_string()
}

/// A run holding a page break
pub fn page_break_run() -> String {
    "<w:r><w:br w:type=\"page\"/></w:r>".to_string()
}

/// Render the runs of a [`crate::types::Text`], delegating formula runs to
/// the supplied converter (they need the LaTeX transform, which can fail).
pub fn text_runs(
    runs: &[Run],
    mut formula: impl FnMut(&str) -> crate::error::Result<String>,
) -> crate::error::Result<String> {
    let mut out = String::new();
    for r in runs {
        if r.tab_stop {
            out.push_str(&tab_run());
        } else if r.style.contains(RunStyle::FORMULA) && !r.text.is_empty() {
            out.push_str(&formula(&r.text)?);
        } else {
            out.push_str(&run(&r.text, r.style));
        }
    }
    Ok(out)
}

/// Inline picture drawing markup for an already-registered media part
pub fn drawing(rel_id: &str, doc_pr_id: usize, name: &str, cx: i64, cy: i64) -> String {
    format!(
        concat!(
            "<w:r><w:drawing>",
            "<wp:inline xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
            "distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{id}\" name=\"{name}\"/>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>",
        ),
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = esc(name),
        rel = esc(rel_id),
    )
}

/// Border line of a table cell edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderLine {
    /// Solid black single line
    Solid,
    /// White single line; reads as invisible on paper
    Hidden,
}

impl BorderLine {
    fn color(self) -> &'static str {
        match self {
            BorderLine::Solid => "000000",
            BorderLine::Hidden => "FFFFFF",
        }
    }
}

/// Cell edges, in OOXML edge order
#[derive(Debug, Clone, Copy)]
pub struct CellBorders {
    pub top: BorderLine,
    pub left: BorderLine,
    pub bottom: BorderLine,
    pub right: BorderLine,
}

impl CellBorders {
    pub fn hidden() -> Self {
        Self {
            top: BorderLine::Hidden,
            left: BorderLine::Hidden,
            bottom: BorderLine::Hidden,
            right: BorderLine::Hidden,
        }
    }
}

/// Vertical merge state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    /// First cell of a merged range
    Restart,
    /// Continuation cell, merged with the cell above
    Continue,
}

/// Cell-level options
#[derive(Debug, Clone)]
pub struct CellOpts {
    pub width_twips: Option<i64>,
    pub borders: Option<CellBorders>,
    pub v_merge: Option<VMerge>,
}

impl Default for CellOpts {
    fn default() -> Self {
        Self {
            width_twips: None,
            borders: None,
            v_merge: None,
        }
    }
}

/// Build a `w:tc` table cell around paragraph XML; cells are always
/// vertically centered
pub fn table_cell(opts: &CellOpts, paragraph_xml: &str) -> String {
    let mut tcpr = String::new();
    if let Some(width) = opts.width_twips {
        tcpr.push_str(&format!(
            "<w:tcW w:w=\"{}\" w:type=\"dxa\"/>",
            width
        ));
    }
    if let Some(merge) = opts.v_merge {
        match merge {
            VMerge::Restart => tcpr.push_str("<w:vMerge w:val=\"restart\"/>"),
            VMerge::Continue => tcpr.push_str("<w:vMerge/>"),
        }
    }
    if let Some(b) = &opts.borders {
        tcpr.push_str(&format!(
            concat!(
                "<w:tcBorders>",
                "<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"{}\"/>",
                "<w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"{}\"/>",
                "<w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"{}\"/>",
                "<w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"{}\"/>",
                "</w:tcBorders>",
            ),
            b.top.color(),
            b.left.color(),
            b.bottom.color(),
            b.right.color(),
        ));
    }
    tcpr.push_str("<w:vAlign w:val=\"center\"/>");
    format!("<w:tc><w:tcPr>{}</w:tcPr>{}</w:tc>", tcpr, paragraph_xml)
}

/// Build a `w:tr` row around cell XML
pub fn table_row(cells_xml: &str) -> String {
    format!("<w:tr>{}</w:tr>", cells_xml)
}

/// Build a centered `w:tbl`.
///
/// `style_id` applies a template table style; `grid_twips` fixes the
/// column grid, `None` lets Word auto-fit.
pub fn table(style_id: Option<&str>, grid_twips: Option<&[i64]>, rows_xml: &str) -> String {
    let mut tblpr = String::new();
    if let Some(id) = style_id {
        tblpr.push_str(&format!("<w:tblStyle w:val=\"{}\"/>", esc(id)));
    }
    tblpr.push_str("<w:jc w:val=\"center\"/>");
    let mut grid = String::new();
    match grid_twips {
        Some(cols) => {
            tblpr.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblLayout w:type=\"fixed\"/>");
            for w in cols {
                grid.push_str(&format!("<w:gridCol w:w=\"{}\"/>", w));
            }
        }
        None => {
            tblpr.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>");
        }
    }
    format!(
        "<w:tbl><w:tblPr>{}</w:tblPr><w:tblGrid>{}</w:tblGrid>{}</w:tbl>",
        tblpr, grid, rows_xml
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esc() {
        assert_eq!(esc("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_run_styles() {
        let xml = run("x", RunStyle::BOLD | RunStyle::SUPERSCRIPT);
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains("superscript"));
        assert!(!xml.contains("subscript"));
    }

    #[test]
    fn test_paragraph_with_style() {
        let opts = ParaOpts {
            style_id: Some("a1".into()),
            justify: Some("center"),
            ..Default::default()
        };
        let xml = paragraph(&opts, &run("标题", RunStyle::NORMAL));
        assert!(xml.starts_with("<w:p><w:pPr><w:pStyle w:val=\"a1\"/>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
    }

    #[test]
    fn test_plain_paragraph_has_no_ppr() {
        let xml = paragraph(&ParaOpts::default(), "");
        assert_eq!(xml, "<w:p></w:p>");
    }

    #[test]
    fn test_cell_merge_continue() {
        let opts = CellOpts {
            v_merge: Some(VMerge::Continue),
            ..Default::default()
        };
        let xml = table_cell(&opts, "<w:p/>");
        assert!(xml.contains("<w:vMerge/>"));
    }

    #[test]
    fn test_whitespace_preserved() {
        let xml = run("  padded  ", RunStyle::NORMAL);
        assert!(xml.contains("xml:space=\"preserve\">  padded  <"));
    }
}

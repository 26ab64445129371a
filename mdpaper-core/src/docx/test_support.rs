//! In-memory template fixture shared by unit, integration and CLI tests.
//! Hidden from the documented API; integration tests cannot reach
//! `#[cfg(test)]` modules, so this one stays compiled.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn para(style_id: Option<&str>, runs: &[&str]) -> String {
    let ppr = match style_id {
        Some(id) => format!("<w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>", id),
        None => String::new(),
    };
    let body: String = runs
        .iter()
        .map(|t| format!("<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r>", t))
        .collect();
    format!("<w:p>{}{}</w:p>", ppr, body)
}

fn cover_line(label: &str) -> String {
    para(None, &[label, "____"])
}

fn document_xml() -> String {
    let mut body = String::new();
    // cover page: title placeholders with spare lines below, then the
    // personal-information blank lines
    body.push_str(&para(None, &["大连理工大学本科毕业设计（论文）题目"]));
    body.push_str("<w:p/>");
    body.push_str(&para(
        None,
        &["The Subject of Undergraduate Graduation Project (Thesis) of DUT"],
    ));
    body.push_str("<w:p/><w:p/><w:p/>");
    body.push_str(&cover_line("学 院（系）："));
    body.push_str(&cover_line("专       业："));
    body.push_str(&cover_line("学 生 姓 名："));
    body.push_str(&cover_line("学       号："));
    body.push_str(&cover_line("指 导 教 师："));
    body.push_str(&cover_line("评 阅 教 师："));
    body.push_str(&cover_line("完 成 日 期："));
    // pre-formatted front matter and placeholder body
    body.push_str(&para(Some("H1"), &["摘    要"]));
    body.push_str(&para(None, &["摘要正文占位"]));
    body.push_str(&para(None, &["关键词占位"]));
    body.push_str(&para(Some("H1"), &["结    论"]));
    body.push_str(&para(Some("H1"), &["参考文献"]));
    // placeholder table, dropped on open
    body.push_str(
        "<w:tbl><w:tblPr/><w:tblGrid><w:gridCol w:w=\"1000\"/></w:tblGrid>\
         <w:tr><w:tc><w:tcPr/><w:p/></w:tc></w:tr></w:tbl>",
    );
    body.push_str(
        "<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
         <w:pgMar w:top=\"1440\" w:right=\"1800\" w:bottom=\"1440\" w:left=\"1800\"/></w:sectPr>",
    );

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    )
}

fn styles_xml() -> String {
    let style = |id: &str, name: &str| {
        format!(
            "<w:style w:type=\"paragraph\" w:styleId=\"{}\"><w:name w:val=\"{}\"/></w:style>",
            id, name
        )
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         {}{}{}{}{}{}{}{}{}</w:styles>",
        style("a0", "Normal"),
        style("H1", "Heading 1"),
        style("H2", "Heading 2"),
        style("H3", "Heading 3"),
        style("H4", "Heading 4"),
        style("tn", "图名中文"),
        style("rb", "参考文献正文"),
        style("kw", "关键词"),
        style("tg", "Table Grid"),
    )
}

/// Build a minimal but structurally complete thesis template archive
pub fn minimal_template() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let parts: &[(&str, String)] = &[
        (
            "[Content_Types].xml",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             </Types>"
                .to_string(),
        ),
        (
            "_rels/.rels",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
             </Relationships>"
                .to_string(),
        ),
        ("word/document.xml", document_xml()),
        ("word/styles.xml", styles_xml()),
        (
            "word/settings.xml",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:settings xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             </w:settings>"
                .to_string(),
        ),
        (
            "word/_rels/document.xml.rels",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
             <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings\" Target=\"settings.xml\"/>\
             <Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/header\" Target=\"header1.xml\"/>\
             </Relationships>"
                .to_string(),
        ),
        (
            "word/header1.xml",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:hdr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:p><w:r><w:t>页眉占位</w:t></w:r></w:p></w:hdr>"
                .to_string(),
        ),
    ];

    for (name, content) in parts {
        zip.start_file(name.to_string(), options)
            .expect("fixture zip entry");
        zip.write_all(content.as_bytes()).expect("fixture zip write");
    }
    zip.finish().expect("fixture zip finish").into_inner()
}

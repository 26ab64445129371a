//! LaTeX formula conversion: LaTeX -> MathML -> Office Math (OMML)
//!
//! Word renders native `m:oMath` markup, not MathML, so formulas go
//! through a structural transform. Presentation subtleties Word rebuilds
//! on its own (spacing, fence stretching) are deliberately not carried
//! over.

use crate::error::{ResourceError, Result};
use latex2mathml::{latex_to_mathml, DisplayStyle};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::ooxml::esc;

const OMML_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";

/// Convert a LaTeX fragment to an `m:oMath` element
pub fn latex_to_omml(latex: &str, inline: bool) -> Result<String> {
    let display = if inline {
        DisplayStyle::Inline
    } else {
        DisplayStyle::Block
    };
    let mathml = latex_to_mathml(latex, display).map_err(|e| ResourceError::LatexConversion {
        source_text: latex.to_string(),
        detail: e.to_string(),
    })?;
    mathml_to_omml(&mathml).map_err(|e| {
        ResourceError::LatexConversion {
            source_text: latex.to_string(),
            detail: e.to_string(),
        }
        .into()
    })
}

/// Transform presentation MathML into an `m:oMath` element
pub fn mathml_to_omml(mathml: &str) -> std::result::Result<String, quick_xml::Error> {
    let tree = parse_tree(mathml)?;
    let mut out = format!("<m:oMath xmlns:m=\"{}\">", OMML_NS);
    for node in &tree {
        emit(node, &mut out);
    }
    out.push_str("</m:oMath>");
    Ok(out)
}

enum Node {
    Element { name: String, children: Vec<Node> },
    Text(String),
}

fn parse_tree(xml: &str) -> std::result::Result<Vec<Node>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = vec![Node::Element {
        name: String::new(),
        children: Vec::new(),
    }];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(Node::Element {
                    name,
                    children: Vec::new(),
                });
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                push_child(
                    &mut stack,
                    Node::Element {
                        name,
                        children: Vec::new(),
                    },
                );
            }
            Event::End(_) => {
                let done = stack.pop().unwrap_or(Node::Text(String::new()));
                push_child(&mut stack, done);
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                if !text.trim().is_empty() {
                    push_child(&mut stack, Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.pop() {
        Some(Node::Element { children, .. }) => Ok(children),
        _ => Ok(Vec::new()),
    }
}

fn push_child(stack: &mut Vec<Node>, child: Node) {
    if let Some(Node::Element { children, .. }) = stack.last_mut() {
        children.push(child);
    }
}

fn emit(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => {
            out.push_str("<m:r><m:t>");
            out.push_str(&esc(text));
            out.push_str("</m:t></m:r>");
        }
        Node::Element { name, children } => match name.as_str() {
            // token elements: runs of text
            "mi" | "mn" | "mo" | "mtext" | "ms" => {
                out.push_str("<m:r><m:t>");
                for c in children {
                    if let Node::Text(t) = c {
                        out.push_str(&esc(t));
                    }
                }
                out.push_str("</m:t></m:r>");
            }
            "msup" => emit_script(children, "m:sSup", &["m:e", "m:sup"], out),
            "msub" => emit_script(children, "m:sSub", &["m:e", "m:sub"], out),
            "msubsup" => emit_script(children, "m:sSubSup", &["m:e", "m:sub", "m:sup"], out),
            "mfrac" => emit_script(children, "m:f", &["m:num", "m:den"], out),
            "mover" => emit_script(children, "m:limUpp", &["m:e", "m:lim"], out),
            "munder" => emit_script(children, "m:limLow", &["m:e", "m:lim"], out),
            "msqrt" => {
                out.push_str(
                    "<m:rad><m:radPr><m:degHide m:val=\"on\"/></m:radPr><m:deg/><m:e>",
                );
                emit_all(children, out);
                out.push_str("</m:e></m:rad>");
            }
            "mroot" => {
                out.push_str("<m:rad><m:deg>");
                if children.len() > 1 {
                    emit(&children[1], out);
                }
                out.push_str("</m:deg><m:e>");
                if !children.is_empty() {
                    emit(&children[0], out);
                }
                out.push_str("</m:e></m:rad>");
            }
            // annotation carries the original LaTeX, not content
            "annotation" | "annotation-xml" => {}
            // wrappers flatten into their children
            _ => emit_all(children, out),
        },
    }
}

fn emit_all(children: &[Node], out: &mut String) {
    for c in children {
        emit(c, out);
    }
}

/// Emit an n-ary layout element whose slots map positionally onto the
/// MathML element's children; missing children produce empty slots
fn emit_script(children: &[Node], tag: &str, slots: &[&str], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for (i, slot) in slots.iter().enumerate() {
        out.push('<');
        out.push_str(slot);
        out.push('>');
        if let Some(child) = children.get(i) {
            emit(child, out);
        }
        out.push_str("</");
        out.push_str(slot);
        out.push('>');
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_elements_become_runs() {
        let omml =
            mathml_to_omml("<math><mi>x</mi><mo>+</mo><mn>1</mn></math>").unwrap();
        assert!(omml.starts_with("<m:oMath xmlns:m="));
        assert!(omml.contains("<m:r><m:t>x</m:t></m:r>"));
        assert!(omml.contains("<m:r><m:t>+</m:t></m:r>"));
        assert!(omml.contains("<m:r><m:t>1</m:t></m:r>"));
    }

    #[test]
    fn test_superscript() {
        let omml = mathml_to_omml("<math><msup><mi>x</mi><mn>2</mn></msup></math>").unwrap();
        assert!(omml.contains(
            "<m:sSup><m:e><m:r><m:t>x</m:t></m:r></m:e><m:sup><m:r><m:t>2</m:t></m:r></m:sup></m:sSup>"
        ));
    }

    #[test]
    fn test_fraction_with_rows() {
        let omml = mathml_to_omml(
            "<math><mfrac><mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow><mn>2</mn></mfrac></math>",
        )
        .unwrap();
        assert!(omml.contains("<m:f><m:num>"));
        assert!(omml.contains("</m:num><m:den><m:r><m:t>2</m:t></m:r></m:den></m:f>"));
    }

    #[test]
    fn test_sqrt_hides_degree() {
        let omml = mathml_to_omml("<math><msqrt><mi>x</mi></msqrt></math>").unwrap();
        assert!(omml.contains("<m:degHide m:val=\"on\"/>"));
    }

    #[test]
    fn test_latex_end_to_end() {
        let omml = latex_to_omml("x^2 + 1", false).unwrap();
        assert!(omml.contains("m:sSup"));
    }

    #[test]
    fn test_bad_latex_is_reported() {
        let err = latex_to_omml("\\frac{", false).unwrap_err();
        assert!(err.to_string().contains("\\frac{"));
    }
}

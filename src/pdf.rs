//! Minimal single-page PDF documents for set dividers and placeholders.
//!
//! Only what the merge step needs: one Letter page, Helvetica, left-aligned
//! lines of text. Non-ASCII characters are replaced with `?` because the
//! standard Type 1 fonts carry no Unicode mapping.

use std::io::Write;
use std::path::Path;

use crate::error::Result;

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;

/// A page of text lines at a single font size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPage {
    pub font_size: u32,
    pub lines: Vec<String>,
}

impl TextPage {
    pub fn new(font_size: u32, text: &str) -> Self {
        Self {
            font_size,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Large title page opening a set.
    pub fn divider(set_name: &str) -> Self {
        Self::new(26, set_name)
    }

    pub fn placeholder(text: &str) -> Self {
        Self::new(14, text)
    }

    fn content_stream(&self) -> String {
        let leading = self.font_size + self.font_size / 2;
        let top = PAGE_HEIGHT - MARGIN - self.font_size;
        let mut stream = format!(
            "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
            self.font_size, leading, MARGIN, top
        );
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                stream.push_str("T*\n");
            }
            stream.push_str(&format!("({}) Tj\n", escape_text(line)));
        }
        stream.push_str("ET\n");
        stream
    }

    /// Serialize to a complete PDF file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let content = self.content_stream();
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
            format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
        ];

        let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        out
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// Escape a line for a PDF literal string.
fn escape_text(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

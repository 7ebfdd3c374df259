//! CSV rendering for the lesson import.
//!
//! Fields are quoted only when they contain a comma, a double quote, CR or
//! LF; embedded quotes are doubled. Rows are joined by the configured line
//! ending with no terminator after the last row.

use serde::Deserialize;

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const UTF8_BOM: &str = "\u{FEFF}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LineEnding {
    #[default]
    CrLf,
    Lf,
}

impl LineEnding {
    /// `LF` (any case) selects `\n`; every other value means CRLF.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("LF") {
            LineEnding::Lf
        } else {
            LineEnding::CrLf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

impl From<String> for LineEnding {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub line_ending: LineEnding,
    pub byte_order_mark: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::CrLf,
            byte_order_mark: true,
        }
    }
}

/// A row addressable by column name. `None` renders as an empty field.
pub trait CsvRow {
    fn field(&self, column: &str) -> Option<String>;
}

pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_line(fields: impl Iterator<Item = String>) -> String {
    fields
        .map(|f| escape_field(&f))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn serialize<R: CsvRow>(rows: &[R], headers: &[&str], options: &CsvOptions) -> Vec<u8> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_line(headers.iter().map(|h| h.to_string())));
    for row in rows {
        lines.push(render_line(
            headers.iter().map(|h| row.field(h).unwrap_or_default()),
        ));
    }

    let mut out = String::new();
    if options.byte_order_mark {
        out.push_str(UTF8_BOM);
    }
    out.push_str(&lines.join(options.line_ending.as_str()));
    out.into_bytes()
}

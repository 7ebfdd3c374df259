//! Reading display values out of typed Notion property values.
//!
//! Readers never fail: absent or undecodable values read as empty.

use std::fmt;

use crate::notion::model::{Properties, PropertyValue, RichTextItem};

/// A scalar CSV cell. Numeric columns may carry text when the source
/// value could not be parsed as a number.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

fn plain_text(items: &[RichTextItem]) -> String {
    items.iter().map(|t| t.plain_text.as_str()).collect()
}

fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

pub fn read_text(value: Option<&PropertyValue>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value {
        PropertyValue::Title { title } => plain_text(title),
        PropertyValue::RichText { rich_text } => plain_text(rich_text),
        PropertyValue::Select { select } | PropertyValue::Status { status: select } => select
            .as_ref()
            .map(|o| o.name.clone())
            .unwrap_or_default(),
        PropertyValue::MultiSelect { multi_select } => {
            join(multi_select.iter().map(|o| o.name.as_str()))
        }
        PropertyValue::Url { url: scalar }
        | PropertyValue::Email { email: scalar }
        | PropertyValue::PhoneNumber {
            phone_number: scalar,
        } => scalar.clone().unwrap_or_default(),
        PropertyValue::Number { number } => number
            .map(|n| CellValue::Number(n).to_string())
            .unwrap_or_default(),
        PropertyValue::Date { date } => date
            .as_ref()
            .and_then(|d| d.start.clone())
            .unwrap_or_default(),
        PropertyValue::Checkbox { checkbox } => checkbox.to_string(),
        PropertyValue::People { people } => join(
            people
                .iter()
                .map(|p| p.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&p.id)),
        ),
        PropertyValue::Files { files } => join(files.iter().map(|f| f.name.as_str())),
        PropertyValue::Relation { relation } => join(relation.iter().map(|r| r.id.as_str())),
        PropertyValue::Unsupported => String::new(),
    }
}

/// Number kind yields its number; any other kind is read as text and
/// parsed with `,` accepted as the decimal separator. Text that does not
/// parse is kept as text.
pub fn read_number(value: Option<&PropertyValue>) -> CellValue {
    match value {
        None => CellValue::Empty,
        Some(PropertyValue::Number { number }) => {
            number.map(CellValue::Number).unwrap_or(CellValue::Empty)
        }
        Some(other) => {
            let text = read_text(Some(other));
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return CellValue::Empty;
            }
            match trimmed.replacen(',', ".", 1).parse::<f64>() {
                Ok(n) if n.is_finite() => CellValue::Number(n),
                _ => CellValue::Text(text),
            }
        }
    }
}

/// Text of the first title-kind property, in property order.
pub fn first_title(properties: &Properties) -> String {
    properties
        .values()
        .find_map(|value| match value {
            PropertyValue::Title { title } => Some(plain_text(title)),
            _ => None,
        })
        .unwrap_or_default()
}

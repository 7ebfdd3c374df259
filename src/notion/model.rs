use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Property kind as declared in a database schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum PropertyKind {
    Title,
    RichText,
    Select,
    MultiSelect,
    Status,
    Url,
    Email,
    PhoneNumber,
    Number,
    Date,
    Checkbox,
    People,
    Files,
    Relation,
    Other(String),
}

impl PropertyKind {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKind::Title => "title",
            PropertyKind::RichText => "rich_text",
            PropertyKind::Select => "select",
            PropertyKind::MultiSelect => "multi_select",
            PropertyKind::Status => "status",
            PropertyKind::Url => "url",
            PropertyKind::Email => "email",
            PropertyKind::PhoneNumber => "phone_number",
            PropertyKind::Number => "number",
            PropertyKind::Date => "date",
            PropertyKind::Checkbox => "checkbox",
            PropertyKind::People => "people",
            PropertyKind::Files => "files",
            PropertyKind::Relation => "relation",
            PropertyKind::Other(other) => other,
        }
    }
}

impl From<String> for PropertyKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "title" => PropertyKind::Title,
            "rich_text" => PropertyKind::RichText,
            "select" => PropertyKind::Select,
            "multi_select" => PropertyKind::MultiSelect,
            "status" => PropertyKind::Status,
            "url" => PropertyKind::Url,
            "email" => PropertyKind::Email,
            "phone_number" => PropertyKind::PhoneNumber,
            "number" => PropertyKind::Number,
            "date" => PropertyKind::Date,
            "checkbox" => PropertyKind::Checkbox,
            "people" => PropertyKind::People,
            "files" => PropertyKind::Files,
            "relation" => PropertyKind::Relation,
            _ => PropertyKind::Other(value),
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseProperty {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
}

/// Schema returned by `GET /v1/databases/{id}`. Property order follows the response.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseSchema {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: Vec<RichTextItem>,
    #[serde(default)]
    pub properties: IndexMap<String, DatabaseProperty>,
}

impl DatabaseSchema {
    pub fn kind_of(&self, property: &str) -> Option<&PropertyKind> {
        self.properties.get(property).map(|p| &p.kind)
    }

    pub fn plain_title(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RichTextItem {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PartialUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FileObject {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DateValue {
    #[serde(default)]
    pub start: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RelationRef {
    pub id: String,
}

/// One typed property value on a page.
///
/// Values that cannot be decoded (unknown kinds, missing tag, malformed
/// payload) become [`PropertyValue::Unsupported`] instead of failing the page.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default, deserialize_with = "nullable")]
        title: Vec<RichTextItem>,
    },
    RichText {
        #[serde(default, deserialize_with = "nullable")]
        rich_text: Vec<RichTextItem>,
    },
    Select {
        select: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default, deserialize_with = "nullable")]
        multi_select: Vec<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Url {
        url: Option<String>,
    },
    Email {
        email: Option<String>,
    },
    PhoneNumber {
        phone_number: Option<String>,
    },
    Number {
        number: Option<f64>,
    },
    Date {
        date: Option<DateValue>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    People {
        #[serde(default, deserialize_with = "nullable")]
        people: Vec<PartialUser>,
    },
    Files {
        #[serde(default, deserialize_with = "nullable")]
        files: Vec<FileObject>,
    },
    Relation {
        #[serde(default, deserialize_with = "nullable")]
        relation: Vec<RelationRef>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    pub fn from_json(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or(PropertyValue::Unsupported)
    }
}

pub type Properties = IndexMap<String, PropertyValue>;

/// A database row (Notion page). Read-only input to the export.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: Properties,
}

impl Page {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusFilter {
    pub property: String,
    #[serde(flatten)]
    pub condition: FilterCondition,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FilterCondition {
    Status { equals: String },
    Select { equals: String },
    Checkbox { equals: bool },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Timestamp {
    CreatedTime,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SortKey {
    Property {
        property: String,
        direction: SortDirection,
    },
    Timestamp {
        timestamp: Timestamp,
        direction: SortDirection,
    },
}

/// Body of `POST /v1/databases/{id}/query`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub filter: StatusFilter,
    pub sorts: Vec<SortKey>,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, PropertyValue::from_json(value)))
        .collect())
}

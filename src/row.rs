use crate::csv_writer::CsvRow;
use crate::duration;
use crate::notion::model::{Page, PropertyValue};
use crate::notion::NotionService;
use crate::property::{first_title, read_number, read_text, CellValue};
use crate::relation::{resolve_joined, RelationTitleCache};

pub const COURSE: &str = "Kurzus";
pub const ORDINAL: &str = "Sorszám";
pub const SECTION: &str = "Szakasz";
pub const LESSON_TITLE: &str = "Lecke címe";
pub const VIDEO_STATUS: &str = "Videó státusz";
pub const LESSON_LENGTH: &str = "Lecke hossza";

/// Output columns, in CSV order.
pub const HEADERS: [&str; 6] = [
    COURSE,
    ORDINAL,
    SECTION,
    LESSON_TITLE,
    VIDEO_STATUS,
    LESSON_LENGTH,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRow {
    pub course: String,
    pub ordinal: CellValue,
    pub section: String,
    pub lesson_title: String,
    pub video_status: String,
    pub lesson_length: String,
}

impl CsvRow for OutputRow {
    fn field(&self, column: &str) -> Option<String> {
        let value = match column {
            COURSE => self.course.clone(),
            ORDINAL => self.ordinal.to_string(),
            SECTION => self.section.clone(),
            LESSON_TITLE => self.lesson_title.clone(),
            VIDEO_STATUS => self.video_status.clone(),
            LESSON_LENGTH => self.lesson_length.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Builds one [`OutputRow`] per page.
pub struct RowAssembler<'a> {
    notion: &'a dyn NotionService,
    status_property: &'a str,
    expand_relations: bool,
}

impl<'a> RowAssembler<'a> {
    /// `expand_relations` should already account for the schema: it only
    /// makes sense when the course property is a relation.
    pub fn new(notion: &'a dyn NotionService, status_property: &'a str, expand_relations: bool) -> Self {
        Self {
            notion,
            status_property,
            expand_relations,
        }
    }

    pub async fn assemble(&self, page: &Page, cache: &mut RelationTitleCache) -> OutputRow {
        let course = match page.property(COURSE) {
            Some(PropertyValue::Relation { relation }) if self.expand_relations => {
                let ids: Vec<String> = relation.iter().map(|r| r.id.clone()).collect();
                resolve_joined(self.notion, &ids, cache).await
            }
            other => read_text(other),
        };

        let mut lesson_title = read_text(page.property(LESSON_TITLE));
        if lesson_title.is_empty() {
            lesson_title = first_title(&page.properties);
        }

        let lesson_length = match page.property(LESSON_LENGTH) {
            Some(PropertyValue::Number { number: Some(seconds) }) => duration::from_seconds(*seconds),
            other => duration::normalize(&read_text(other)),
        };

        OutputRow {
            course,
            ordinal: read_number(page.property(ORDINAL)),
            section: read_text(page.property(SECTION)),
            lesson_title,
            video_status: read_text(page.property(self.status_property)),
            lesson_length,
        }
    }
}

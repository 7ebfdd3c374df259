use crate::error::ExportError;
use crate::notion::model::{
    DatabaseSchema, FilterCondition, PropertyKind, QueryRequest, SortDirection, SortKey,
    StatusFilter, Timestamp,
};
use crate::row::{ORDINAL, SECTION};

pub const PAGE_SIZE: u32 = 100;

/// Equality filter on the status property, typed after its schema kind.
/// Checkbox-backed status matches `true` regardless of `status_value`.
pub fn build_filter(
    schema: &DatabaseSchema,
    status_property: &str,
    status_value: &str,
) -> Option<StatusFilter> {
    let condition = match schema.kind_of(status_property)? {
        PropertyKind::Status => FilterCondition::Status {
            equals: status_value.to_string(),
        },
        PropertyKind::Select => FilterCondition::Select {
            equals: status_value.to_string(),
        },
        PropertyKind::Checkbox => FilterCondition::Checkbox { equals: true },
        _ => return None,
    };
    Some(StatusFilter {
        property: status_property.to_string(),
        condition,
    })
}

pub fn build_sorts(schema: &DatabaseSchema) -> Vec<SortKey> {
    let mut sorts = Vec::new();
    if schema.kind_of(ORDINAL) == Some(&PropertyKind::Number) {
        sorts.push(SortKey::Property {
            property: ORDINAL.to_string(),
            direction: SortDirection::Ascending,
        });
    }
    if schema.kind_of(SECTION) == Some(&PropertyKind::Select) {
        sorts.push(SortKey::Property {
            property: SECTION.to_string(),
            direction: SortDirection::Ascending,
        });
    }
    sorts.push(SortKey::Timestamp {
        timestamp: Timestamp::CreatedTime,
        direction: SortDirection::Ascending,
    });
    sorts
}

/// Filter and sort order for one export, fixed before pagination starts.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: StatusFilter,
    pub sorts: Vec<SortKey>,
}

impl QueryPlan {
    pub fn from_schema(
        schema: &DatabaseSchema,
        status_property: &str,
        status_value: &str,
    ) -> Result<Self, ExportError> {
        let filter = build_filter(schema, status_property, status_value)
            .ok_or_else(|| ExportError::UnsupportedStatusProperty(status_property.to_string()))?;
        Ok(Self {
            filter,
            sorts: build_sorts(schema),
        })
    }

    pub fn page_request(&self, start_cursor: Option<String>) -> QueryRequest {
        QueryRequest {
            filter: self.filter.clone(),
            sorts: self.sorts.clone(),
            page_size: PAGE_SIZE,
            start_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(properties: serde_json::Value) -> DatabaseSchema {
        serde_json::from_value(json!({ "id": "db", "properties": properties })).unwrap()
    }

    #[test]
    fn filter_follows_status_kind() {
        let s = schema(json!({
            "A": { "id": "a", "type": "status" },
            "B": { "id": "b", "type": "select" },
            "C": { "id": "c", "type": "checkbox" },
            "D": { "id": "d", "type": "rich_text" }
        }));
        assert_eq!(
            serde_json::to_value(build_filter(&s, "A", "✅ Kész").unwrap()).unwrap(),
            json!({ "property": "A", "status": { "equals": "✅ Kész" } })
        );
        assert_eq!(
            serde_json::to_value(build_filter(&s, "B", "Kész").unwrap()).unwrap(),
            json!({ "property": "B", "select": { "equals": "Kész" } })
        );
        assert_eq!(
            serde_json::to_value(build_filter(&s, "C", "ignored").unwrap()).unwrap(),
            json!({ "property": "C", "checkbox": { "equals": true } })
        );
        assert!(build_filter(&s, "D", "x").is_none());
        assert!(build_filter(&s, "missing", "x").is_none());
    }

    #[test]
    fn sorts_include_only_matching_kinds() {
        let full = schema(json!({
            "Sorszám": { "id": "n", "type": "number" },
            "Szakasz": { "id": "s", "type": "select" }
        }));
        assert_eq!(
            serde_json::to_value(build_sorts(&full)).unwrap(),
            json!([
                { "property": "Sorszám", "direction": "ascending" },
                { "property": "Szakasz", "direction": "ascending" },
                { "timestamp": "created_time", "direction": "ascending" }
            ])
        );

        let mistyped = schema(json!({
            "Sorszám": { "id": "n", "type": "rich_text" },
            "Szakasz": { "id": "s", "type": "multi_select" }
        }));
        assert_eq!(
            serde_json::to_value(build_sorts(&mistyped)).unwrap(),
            json!([{ "timestamp": "created_time", "direction": "ascending" }])
        );
    }

    #[test]
    fn plan_rejects_unsupported_status_property() {
        let s = schema(json!({ "Videó státusz": { "id": "v", "type": "rich_text" } }));
        let err = QueryPlan::from_schema(&s, "Videó státusz", "✅ Kész").unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedStatusProperty(ref p) if p == "Videó státusz"));
    }

    #[test]
    fn page_request_carries_cursor_and_size() {
        let s = schema(json!({ "Kész": { "id": "k", "type": "checkbox" } }));
        let plan = QueryPlan::from_schema(&s, "Kész", "").unwrap();
        let first = plan.page_request(None);
        assert_eq!(first.page_size, 100);
        assert!(first.start_cursor.is_none());
        assert_eq!(
            plan.page_request(Some("c2".into())).start_cursor.as_deref(),
            Some("c2")
        );
    }
}

//! DNS record entities read from the graph.

use serde::Serialize;

use crate::error::AppError;
use crate::graph::Row;

/// A `DomainRecord` entity (A, AAAA or CNAME) selected by the sync query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainRecord {
    /// Graph-assigned entity id (`_id`).
    pub id: String,
    /// Integration-assigned entity key (`_key`).
    pub key: String,
    /// The record value, i.e. the hostname to resolve.
    pub value: Option<String>,
    /// The record name, used as SNI for certificate lookups.
    pub name: Option<String>,
    /// `A`, `AAAA` or `CNAME`.
    pub record_type: Option<String>,
}

impl DomainRecord {
    pub fn new(id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            value: Some(value.into()),
            name: None,
            record_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The hostname to resolve, if the record carries a non-blank value.
    pub fn hostname(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Hostname presented during the TLS handshake.
    ///
    /// Falls back to the record value when the record has no name.
    pub fn certificate_host(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| self.hostname())
    }

    /// Decode one `queryV1` result item (`{entity: {...}, properties: {...}}`).
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            id: row.get_path(&["entity", "_id"])?,
            key: row.get_path(&["entity", "_key"])?,
            value: row.get_path_opt(&["properties", "value"])?,
            name: row.get_path_opt(&["properties", "name"])?,
            record_type: row.get_path_opt(&["properties", "type"])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        Row::try_from(value).unwrap()
    }

    #[test]
    fn test_from_row() {
        let record = DomainRecord::from_row(&row(json!({
            "id": "abc",
            "entity": {"_id": "abc", "_key": "dr1", "_type": ["aws_route53_record"]},
            "properties": {"value": "example.com", "name": "www.example.com", "type": "CNAME"}
        })))
        .unwrap();

        assert_eq!(record.id, "abc");
        assert_eq!(record.key, "dr1");
        assert_eq!(record.hostname(), Some("example.com"));
        assert_eq!(record.certificate_host(), Some("www.example.com"));
        assert_eq!(record.record_type.as_deref(), Some("CNAME"));
    }

    #[test]
    fn test_from_row_missing_key_fails() {
        let result = DomainRecord::from_row(&row(json!({
            "entity": {"_id": "abc"},
            "properties": {"value": "example.com"}
        })));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_value_has_no_hostname() {
        let mut record = DomainRecord::new("id", "dr1", "  ");
        assert_eq!(record.hostname(), None);
        record.value = None;
        assert_eq!(record.certificate_host(), None);
    }

    #[test]
    fn test_certificate_host_falls_back_to_value() {
        let record = DomainRecord::new("id", "dr1", "example.com");
        assert_eq!(record.certificate_host(), Some("example.com"));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// The one document a run persists, whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub keyword: String,
    pub spatial: String,
    /// The serialized aggregate on success, `{}` on failure.
    pub data: Value,
    pub was_successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl RunRecord {
    pub fn success(keyword: impl Into<String>, spatial: impl Into<String>, data: Value) -> Self {
        Self {
            keyword: keyword.into(),
            spatial: spatial.into(),
            data,
            was_successful: true,
            exception: None,
        }
    }

    /// Failure kinds are not distinguished; the error is kept only as text.
    pub fn failure(
        keyword: impl Into<String>,
        spatial: impl Into<String>,
        error: impl Display,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            spatial: spatial.into(),
            data: Value::Object(Default::default()),
            was_successful: false,
            exception: Some(error.to_string()),
        }
    }

    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_document_has_no_exception_key() {
        let record = RunRecord::success("kw", "sp", json!({"tweets": "[]"}));
        let doc = record.to_document().unwrap();
        assert_eq!(
            doc,
            json!({
                "keyword": "kw",
                "spatial": "sp",
                "data": {"tweets": "[]"},
                "was_successful": true
            })
        );
    }

    #[test]
    fn failure_document_keeps_error_text() {
        let record = RunRecord::failure("kw", "sp", "server returned error 429 Too Many Requests: {}");
        let doc = record.to_document().unwrap();
        assert_eq!(doc["data"], json!({}));
        assert_eq!(doc["was_successful"], json!(false));
        assert!(doc["exception"].as_str().unwrap().contains("429"));

        let back: RunRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(back, record);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved text passage with its metadata, used as grounding for
/// evaluation scoring. Constructed by the extraction layer and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Document {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_serde_round_trip() {
        let doc = Document::new("Revenue was $500B").with_metadata(
            json!({"page": 12, "source": "10-K"})
                .as_object()
                .unwrap()
                .clone(),
        );

        let encoded = serde_json::to_string(&doc).unwrap();
        let decoded: Document = serde_json::from_str(&encoded).unwrap();
        assert_eq!(doc, decoded);
    }

    #[test]
    fn test_document_metadata_defaults_to_empty() {
        let doc: Document = serde_json::from_value(json!({"content": "foo"})).unwrap();
        assert!(doc.metadata.is_empty());
    }
}

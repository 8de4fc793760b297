//! `_bulk` request encoding and response parsing

use crate::adapters::sink::{BulkIndexFailure, BulkIndexResult};
use crate::domain::{Result, SinkDocument, SinkError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Body of a `_bulk` response
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    pub items: Vec<HashMap<String, BulkItem>>,
}

/// Outcome of one action, keyed by action name (`index`)
#[derive(Debug, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<Value>,
}

impl BulkItem {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn error_message(&self) -> String {
        match &self.error {
            Some(Value::Object(obj)) => {
                let kind = obj.get("type").and_then(Value::as_str).unwrap_or("error");
                let reason = obj.get("reason").and_then(Value::as_str).unwrap_or("");
                format!("{kind}: {reason}")
            }
            Some(other) => other.to_string(),
            None => format!("status {}", self.status),
        }
    }
}

/// Encode documents as `index` actions, one action line and one source line each
pub fn encode_bulk_body(index: &str, documents: &[SinkDocument]) -> Result<String> {
    let mut body = String::new();
    for doc in documents {
        let action = json!({ "index": { "_index": index, "_id": doc.id } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&doc.body)?);
        body.push('\n');
    }
    Ok(body)
}

/// Match response items to the submitted documents, in order
///
/// # Errors
///
/// Returns `SinkError::InvalidResponse` when the item count differs from
/// the document count.
pub fn parse_bulk_response(
    response: BulkResponse,
    documents: &[SinkDocument],
) -> Result<BulkIndexResult> {
    if response.items.len() != documents.len() {
        return Err(SinkError::InvalidResponse(format!(
            "bulk response has {} items for {} documents",
            response.items.len(),
            documents.len()
        ))
        .into());
    }

    if !response.errors {
        return Ok(BulkIndexResult::all_succeeded(documents.len()));
    }

    let mut result = BulkIndexResult::default();
    for (item, doc) in response.items.into_iter().zip(documents) {
        let Some(outcome) = item.into_values().next() else {
            result.add_failure(BulkIndexFailure {
                document_id: doc.id.clone(),
                error: "empty bulk response item".to_string(),
                is_throttled: false,
            });
            continue;
        };

        if outcome.is_success() {
            result.success_count += 1;
        } else {
            result.add_failure(BulkIndexFailure {
                document_id: outcome.id.clone().unwrap_or_else(|| doc.id.clone()),
                error: outcome.error_message(),
                is_throttled: outcome.status == 429,
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> SinkDocument {
        SinkDocument {
            id: id.to_string(),
            body: json!({ "id": id, "type": "patient" }),
        }
    }

    #[test]
    fn test_encode_bulk_body() {
        let body = encode_bulk_body("patients", &[doc("pat_1"), doc("pat_2")]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(body.ends_with('\n'));

        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_index"], "patients");
        assert_eq!(action["index"]["_id"], "pat_1");

        let source: Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(source["id"], "pat_2");
    }

    #[test]
    fn test_parse_all_succeeded() {
        let response: BulkResponse = serde_json::from_value(json!({
            "took": 3,
            "errors": false,
            "items": [
                { "index": { "_id": "pat_1", "status": 201 } },
                { "index": { "_id": "pat_2", "status": 200 } }
            ]
        }))
        .unwrap();

        let result = parse_bulk_response(response, &[doc("pat_1"), doc("pat_2")]).unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 0);
    }

    #[test]
    fn test_parse_partial_failure() {
        let response: BulkResponse = serde_json::from_value(json!({
            "errors": true,
            "items": [
                { "index": { "_id": "pat_1", "status": 201 } },
                { "index": { "_id": "pat_2", "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [age]" } } },
                { "index": { "_id": "pat_3", "status": 429,
                    "error": { "type": "es_rejected_execution_exception", "reason": "queue full" } } }
            ]
        }))
        .unwrap();

        let result =
            parse_bulk_response(response, &[doc("pat_1"), doc("pat_2"), doc("pat_3")]).unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 2);
        assert_eq!(result.failures[0].document_id, "pat_2");
        assert_eq!(
            result.failures[0].error,
            "mapper_parsing_exception: failed to parse field [age]"
        );
        assert!(!result.failures[0].is_throttled);
        assert!(result.failures[1].is_throttled);
    }

    #[test]
    fn test_parse_item_count_mismatch() {
        let response: BulkResponse = serde_json::from_value(json!({
            "errors": false,
            "items": [ { "index": { "_id": "pat_1", "status": 201 } } ]
        }))
        .unwrap();

        let err = parse_bulk_response(response, &[doc("pat_1"), doc("pat_2")]).unwrap_err();
        assert!(err.to_string().contains("1 items for 2 documents"));
    }
}

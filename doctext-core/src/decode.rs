//! Conversion between textual arguments and BSON documents.
//!
//! Every filter, update, replacement, command and inserted record reaches the
//! facade as JSON text. This module turns that text into [`bson::Document`]
//! values before anything is sent to a backend, and renders documents back
//! to JSON for callers that only deal in text.
//!
//! Extended JSON type wrappers are honoured while decoding, so a filter such as
//! `{"_id": {"$oid": "65a1c2e4f1d2a3b4c5d6e7f8"}}` matches on an `ObjectId`
//! rather than on a nested document. Key order is preserved exactly as written,
//! which matters for command documents where the first key names the command.

use bson::Document;

use crate::error::{DocTextError, DocTextResult};

/// Decodes a single document from JSON text.
///
/// # Errors
///
/// Returns [`DocTextError::Decode`] if `text` is not a JSON object.
///
/// # Example
///
/// ```ignore
/// use doctext::decode::decode_document;
///
/// let filter = decode_document(r#"{"age": {"$gte": 21}}"#)?;
/// assert!(filter.contains_key("age"));
/// ```
pub fn decode_document(text: &str) -> DocTextResult<Document> {
    Ok(serde_json::from_str::<Document>(text)?)
}

/// Decodes an ordered sequence of documents from JSON text.
///
/// The outer value must be an array and every element must be an object.
///
/// # Errors
///
/// Returns [`DocTextError::Decode`] if `text` is not a JSON array of objects.
pub fn decode_document_list(text: &str) -> DocTextResult<Vec<Document>> {
    Ok(serde_json::from_str::<Vec<Document>>(text)?)
}

/// Renders a document as JSON text.
///
/// Non-JSON BSON types are written using their extended JSON wrappers, so the
/// output can be fed back through [`decode_document`].
///
/// # Errors
///
/// Returns [`DocTextError::Serialization`] if the document cannot be rendered.
pub fn encode_document(document: &Document) -> DocTextResult<String> {
    serde_json::to_string(document)
        .map_err(|e| DocTextError::Serialization(e.to_string()))
}

/// Renders a sequence of documents as a JSON array.
///
/// # Errors
///
/// Returns [`DocTextError::Serialization`] if any document cannot be rendered.
pub fn encode_documents(documents: &[Document]) -> DocTextResult<String> {
    serde_json::to_string(documents)
        .map_err(|e| DocTextError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, oid::ObjectId};

    #[test]
    fn decodes_nested_filter() {
        let filter = decode_document(r#"{"age": {"$gte": 21}, "tags": ["a", "b"]}"#).unwrap();

        let age = filter.get_document("age").unwrap();
        assert!(age.contains_key("$gte"));
        assert_eq!(filter.get_array("tags").unwrap().len(), 2);
    }

    #[test]
    fn preserves_key_order() {
        let command = decode_document(r#"{"count": "people", "query": {}, "limit": 5}"#).unwrap();
        let keys = command.keys().map(String::as_str).collect::<Vec<_>>();

        assert_eq!(keys, vec!["count", "query", "limit"]);
    }

    #[test]
    fn honours_object_id_wrappers() {
        let oid = ObjectId::new();
        let text = format!(r#"{{"_id": {{"$oid": "{}"}}}}"#, oid.to_hex());
        let filter = decode_document(&text).unwrap();

        assert_eq!(filter.get("_id"), Some(&Bson::ObjectId(oid)));
    }

    #[test]
    fn rejects_truncated_text() {
        assert!(matches!(decode_document(r#"{"name": "Ann""#), Err(DocTextError::Decode(_))));
        assert!(matches!(decode_document(""), Err(DocTextError::Decode(_))));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(decode_document("[1, 2]"), Err(DocTextError::Decode(_))));
        assert!(matches!(decode_document("42"), Err(DocTextError::Decode(_))));
    }

    #[test]
    fn document_lists_require_an_array_of_objects() {
        let docs = decode_document_list(r#"[{"a": 1}, {"b": 2}]"#).unwrap();
        assert_eq!(docs.len(), 2);

        assert!(matches!(decode_document_list(r#"{"a": 1}"#), Err(DocTextError::Decode(_))));
        assert!(matches!(decode_document_list("[1, 2]"), Err(DocTextError::Decode(_))));
    }

    #[test]
    fn encoded_documents_decode_back() {
        let oid = ObjectId::new();
        let document = bson::doc! { "_id": oid, "name": "Ann" };
        let text = encode_document(&document).unwrap();

        assert_eq!(decode_document(&text).unwrap(), document);
    }

    #[test]
    fn encoded_lists_keep_order_and_types() {
        let oid = ObjectId::new();
        let documents = vec![
            bson::doc! { "_id": oid, "name": "Ann" },
            bson::doc! { "_id": "bob", "name": "Bob" },
        ];
        let text = encode_documents(&documents).unwrap();

        assert!(text.starts_with('['));
        assert_eq!(decode_document_list(&text).unwrap(), documents);
        assert_eq!(encode_documents(&[]).unwrap(), "[]");
    }
}

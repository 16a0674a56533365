//! In-memory view over one record or an ordered collection of records.

use serde::{Deserialize, Serialize};

use crate::types::{Record, Value};

/// A single serialized record or an ordered collection of them.
///
/// The engine mutates a view in place while enriching it and hands it back
/// to the caller when resolution returns. Collection order is never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordView {
    Single(Record),
    Collection(Vec<Record>),
}

impl RecordView {
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, RecordView::Collection(_))
    }

    /// Records in this view: the record itself for a single view.
    #[must_use]
    pub fn items(&self) -> &[Record] {
        match self {
            RecordView::Single(record) => std::slice::from_ref(record),
            RecordView::Collection(records) => records,
        }
    }

    pub fn items_mut(&mut self) -> &mut [Record] {
        match self {
            RecordView::Single(record) => std::slice::from_mut(record),
            RecordView::Collection(records) => records,
        }
    }

    /// Number of records in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Reads an attribute of a single view. Collections have no attributes
    /// of their own and always return `None`.
    #[must_use]
    pub fn get(&self, attr: &str) -> Option<&Value> {
        match self {
            RecordView::Single(record) => record.get(attr),
            RecordView::Collection(_) => None,
        }
    }

    /// Writes an attribute on every record in the view.
    pub fn set(&mut self, attr: &str, value: &Value) {
        for record in self.items_mut() {
            record.insert(attr.to_string(), value.clone());
        }
    }

    /// Removes an attribute from every record in the view, keeping the
    /// remaining fields in order.
    pub fn remove(&mut self, attr: &str) {
        for record in self.items_mut() {
            record.shift_remove(attr);
        }
    }

    /// Keeps only the attributes whose key satisfies `keep`, in every record.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        for record in self.items_mut() {
            record.retain(|key, _| keep(key));
        }
    }

    /// Converts the view into a plain value: a map or an array of maps.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            RecordView::Single(record) => Value::Map(record),
            RecordView::Collection(records) => {
                Value::Array(records.into_iter().map(Value::Map).collect())
            }
        }
    }
}

impl From<Record> for RecordView {
    fn from(record: Record) -> Self {
        RecordView::Single(record)
    }
}

impl From<Vec<Record>> for RecordView {
    fn from(records: Vec<Record>) -> Self {
        RecordView::Collection(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, i64)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn single_view_items_is_identity() {
        let view = RecordView::from(rec(&[("id", 1)]));
        assert!(!view.is_collection());
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn collection_preserves_order() {
        let view = RecordView::from(vec![rec(&[("id", 3)]), rec(&[("id", 1)]), rec(&[("id", 2)])]);
        assert!(view.is_collection());
        let ids: Vec<_> = view.items().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(view.get("id"), None);
    }

    #[test]
    fn remove_keeps_field_order() {
        let mut view = RecordView::from(vec![rec(&[("id", 1), ("thing_id", 9), ("x", 0)])]);
        view.remove("thing_id");
        let keys: Vec<_> = view.items()[0].keys().cloned().collect();
        assert_eq!(keys, vec!["id", "x"]);
    }

    #[test]
    fn retain_filters_every_record_in_order() {
        let mut view = RecordView::from(vec![
            rec(&[("id", 1), ("tmp", 9), ("x", 0)]),
            rec(&[("id", 2), ("tmp", 8)]),
        ]);
        view.retain(|key| key != "tmp");
        let keys: Vec<Vec<String>> = view.items().iter().map(|r| r.keys().cloned().collect()).collect();
        assert_eq!(keys, vec![vec!["id".to_string(), "x".to_string()], vec!["id".to_string()]]);
    }

    #[test]
    fn set_applies_to_all_records() {
        let mut view = RecordView::from(vec![rec(&[("id", 1)]), rec(&[("id", 2)])]);
        view.set("flag", &Value::Bool(true));
        assert!(view.items().iter().all(|r| r["flag"] == Value::Bool(true)));
    }

    #[test]
    fn into_value_shapes() {
        assert!(matches!(RecordView::from(rec(&[])).into_value(), Value::Map(_)));
        assert_eq!(
            RecordView::Collection(Vec::new()).into_value(),
            Value::Array(Vec::new())
        );
    }
}

//! Batch output
//!
//! One `OutputRecord` per processed item, in input order. A record is
//! either the handler's result or, when the batch isolates failures, the
//! error message tagged with the item's index.

use serde::Serialize;
use serde_json::Value;

/// Output for one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    /// `{"data": <result>}`
    Success { data: Value },
    /// `{"error": <message>, "itemIndex": <i>}`
    Isolated {
        error: String,
        #[serde(rename = "itemIndex")]
        item_index: usize,
    },
}

impl OutputRecord {
    pub fn is_success(&self) -> bool {
        matches!(self, OutputRecord::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            OutputRecord::Success { data } => Some(data),
            OutputRecord::Isolated { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OutputRecord::Success { .. } => None,
            OutputRecord::Isolated { error, .. } => Some(error),
        }
    }
}

/// Ordered output sequence of one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchOutput {
    records: Vec<OutputRecord>,
}

impl BatchOutput {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            records: Vec::with_capacity(n),
        }
    }

    /// Append the result for the next item
    pub fn push_success(&mut self, data: Value) {
        self.records.push(OutputRecord::Success { data });
    }

    /// Append an isolated failure for the next item
    pub fn push_isolated(&mut self, error: impl Into<String>) {
        let item_index = self.records.len();
        self.records.push(OutputRecord::Isolated {
            error: error.into(),
            item_index,
        });
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn isolated_count(&self) -> usize {
        self.records.len() - self.success_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_wire_shape() {
        let ok = OutputRecord::Success {
            data: json!({"token": "t"}),
        };
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"data": {"token": "t"}}));

        let isolated = OutputRecord::Isolated {
            error: "boom".into(),
            item_index: 3,
        };
        assert_eq!(
            serde_json::to_value(&isolated).unwrap(),
            json!({"error": "boom", "itemIndex": 3})
        );
    }

    #[test]
    fn test_counts_and_order() {
        let mut output = BatchOutput::with_capacity(3);
        output.push_success(json!(1));
        output.push_isolated("nope");
        output.push_success(json!(3));

        assert_eq!(output.len(), 3);
        assert_eq!(output.success_count(), 2);
        assert_eq!(output.isolated_count(), 1);
        assert_eq!(output.records()[1].error(), Some("nope"));
        assert_eq!(output.records()[2].data(), Some(&json!(3)));
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!([{"data": 1}, {"error": "nope", "itemIndex": 1}, {"data": 3}])
        );
    }

    #[test]
    fn test_isolated_index_follows_position() {
        let mut output = BatchOutput::default();
        output.push_isolated("first");
        output.push_success(json!(null));
        output.push_isolated("third");

        let indices: Vec<_> = output
            .records()
            .iter()
            .filter_map(|r| match r {
                OutputRecord::Isolated { item_index, .. } => Some(*item_index),
                OutputRecord::Success { .. } => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 2]);
    }
}

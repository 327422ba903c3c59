//! Response models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A quote returned by the random-quote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub author: String,
    #[serde(default)]
    pub category: String,
}

impl Quote {
    /// Decode a response body.
    ///
    /// Accepts a JSON object, or an array holding exactly one such object.
    /// Unknown fields are ignored.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;

        let value = match value {
            Value::Array(mut items) if items.len() == 1 => items.remove(0),
            other => other,
        };

        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_object() {
        let quote = Quote::from_json(
            r#"{"quote":"May the Force be with you.","author":"Star Wars","category":"Movies"}"#,
        )
        .unwrap();

        assert_eq!(quote.quote, "May the Force be with you.");
        assert_eq!(quote.author, "Star Wars");
        assert_eq!(quote.category, "Movies");
    }

    #[test]
    fn test_missing_category_defaults_to_empty() {
        let quote = Quote::from_json(r#"{"quote":"Q","author":"A","rating":5}"#).unwrap();
        assert_eq!(quote.category, "");
    }

    #[test]
    fn test_single_element_array_is_unwrapped() {
        let quote = Quote::from_json(r#"[{"quote":"Q","author":"A","category":"Famous"}]"#).unwrap();
        assert_eq!(quote.author, "A");
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(Quote::from_json("not json").is_err());
        assert!(Quote::from_json(r#"{"author":"A"}"#).is_err());
        assert!(Quote::from_json(r#"[]"#).is_err());
        assert!(Quote::from_json(r#"[{"quote":"Q","author":"A"},{"quote":"R","author":"B"}]"#).is_err());
    }
}

//! Custom scalars.

use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use serde::{Deserialize, Serialize};

/// Opaque JSON stored in a `jsonb` column.
///
/// Only round-trip equality is guaranteed: whatever a client writes is what it
/// reads back. `null` is rejected on input; nullable fields use
/// `Option<JsonObject>` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct JsonObject(pub serde_json::Value);

impl JsonObject {
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for JsonObject {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[Scalar(name = "JSONObject")]
impl ScalarType for JsonObject {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::Null => Err(InputValueError::custom(
                "JSONObject cannot represent a null value",
            )),
            other => Ok(Self(other.into_json()?)),
        }
    }

    fn to_value(&self) -> Value {
        Value::from_json(self.0.clone()).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_null() {
        assert!(<JsonObject as ScalarType>::parse(Value::Null).is_err());
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let original = json!([{ "reps": 10, "weight": 135 }, { "reps": 8, "rpe": 7.5 }]);
        let input = Value::from_json(original.clone()).unwrap();

        let parsed = <JsonObject as ScalarType>::parse(input).unwrap();
        assert_eq!(parsed.0, original);
        assert_eq!(parsed.to_value().into_json().unwrap(), original);
    }
}

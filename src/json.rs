use crate::value::{Context, Value};
pub use serde_json::Value as JsonValue;


impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Text(n.to_string()),
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(seq) => Value::List(
                seq.iter()
                    .map(Value::from)
                    .collect::<_>()
            ),
            JsonValue::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect::<Context>()
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from(&json)
    }
}

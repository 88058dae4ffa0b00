use crate::value::{Context, Value};
pub use serde_yaml::Value as YamlValue;


impl From<&YamlValue> for Value {
    fn from(yaml: &YamlValue) -> Self {
        match yaml {
            YamlValue::Null => Value::Null,
            YamlValue::Bool(b) => Value::Bool(*b),
            YamlValue::Number(n) => Value::Text(n.to_string()),
            YamlValue::String(s) => Value::Text(s.clone()),
            YamlValue::Sequence(seq) => Value::List(
                seq.iter()
                    .map(Value::from)
                    .collect::<_>()
            ),
            YamlValue::Mapping(obj) => Value::Map(
                obj.iter()
                    .filter_map(|(k, v)| key(k).map(|k| (k, Value::from(v))))
                    .collect::<Context>()
            ),
            YamlValue::Tagged(tagged) => Value::from(&tagged.value),
        }
    }
}

impl From<YamlValue> for Value {
    fn from(yaml: YamlValue) -> Self {
        Value::from(&yaml)
    }
}

// scalar keys only, mappings keyed by collections have no Mustache name
fn key(yaml: &YamlValue) -> Option<String> {
    match yaml {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None
    }
}

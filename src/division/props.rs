use serde_json::{Map, Value};
use shapefile::dbase::{FieldValue, Record};

/// Property keys tried, in order, for a division's display name.
pub const NAME_KEYS: [&str; 4] = ["gnd_name", "name", "GND_NAME", "shapeName"];

/// Property keys tried, in order, for a division's code.
pub const CODE_KEYS: [&str; 4] = ["gnd_code", "code", "GND_CODE", "shapeID"];

/// A feature's attribute table, as exposed by one dataset format.
pub(crate) trait Properties {
    /// Text value of `key`, or `None` if absent, null or blank.
    fn text(&self, key: &str) -> Option<String>;

    /// First usable value among `keys`, honoring their order.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }
}

impl Properties for Map<String, Value> {
    fn text(&self, key: &str) -> Option<String> {
        let text = match self.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

impl Properties for Record {
    fn text(&self, key: &str) -> Option<String> {
        let text = match self.get(key)? {
            FieldValue::Character(Some(s)) | FieldValue::Memo(s) => s.trim().to_string(),
            FieldValue::Numeric(Some(v)) | FieldValue::Double(v) => number_text(*v)?,
            FieldValue::Float(Some(v)) => number_text(*v as f64)?,
            FieldValue::Integer(v) => v.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Render a dBase number as a code string ("1234", not "1234.0").
fn number_text(v: f64) -> Option<String> {
    if !v.is_finite() { return None }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        Some(format!("{}", v as i64))
    } else {
        Some(v.to_string())
    }
}

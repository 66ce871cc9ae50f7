use crate::value::Value;
use std::rc::Rc;

pub fn json_to_value(json_val: serde_json::Value) -> Value {
    match json_val {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(json_number) => {
            Value::Number(json_number.as_f64().unwrap_or(f64::NAN))
        }
        serde_json::Value::String(s) => Value::String(Rc::from(s.as_str())),
        serde_json::Value::Array(array) => {
            Value::array(array.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(object) => {
            let mut map = indexmap::IndexMap::new();
            for (k, v) in object {
                map.insert(k, json_to_value(v));
            }
            Value::object(map)
        }
    }
}

/// A value that contains itself has no JSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularValue;

impl std::fmt::Display for CircularValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot convert a circular structure to JSON")
    }
}

impl std::error::Error for CircularValue {}

/// Values with no JSON counterpart (functions, scopes, `undefined`, the
/// discard marker, non-finite numbers) become `null`.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, CircularValue> {
    to_json(value, &mut Vec::new())
}

fn to_json(value: &Value, open: &mut Vec<usize>) -> Result<serde_json::Value, CircularValue> {
    let id = match value {
        Value::Array(array) => Rc::as_ptr(array) as *const () as usize,
        Value::Object(object) => Rc::as_ptr(object) as *const () as usize,
        _ => return Ok(scalar_to_json(value)),
    };
    if open.contains(&id) {
        return Err(CircularValue);
    }

    open.push(id);
    let json = match value {
        Value::Array(array) => serde_json::Value::Array(
            array.borrow().iter().map(|item| to_json(item, open)).collect::<Result<_, CircularValue>>()?,
        ),
        Value::Object(object) => serde_json::Value::Object(
            object.borrow()
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_json(v, open)?)))
                .collect::<Result<_, CircularValue>>()?,
        ),
        _ => serde_json::Value::Null,
    };
    open.pop();
    Ok(json)
}

fn scalar_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 9.0e15 {
                serde_json::Value::from(*n as i64)
            } else {
                serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Value::String(s) => serde_json::Value::String(s.to_string()),
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_objects_keep_key_order() {
        let value = json_to_value(json!({"b": 1, "a": [true, null, "x"]}));
        let keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        let round_trip = serde_json::to_string(&value_to_json(&value).unwrap()).unwrap();
        assert_eq!(round_trip, r#"{"b":1,"a":[true,null,"x"]}"#);
    }

    #[test]
    fn test_unrepresentable_values_become_null() {
        assert_eq!(value_to_json(&Value::Undefined), Ok(serde_json::Value::Null));
        assert_eq!(value_to_json(&Value::Number(f64::INFINITY)), Ok(serde_json::Value::Null));
        assert_eq!(value_to_json(&Value::Number(2.5)), Ok(json!(2.5)));
    }

    #[test]
    fn test_self_containing_value_is_rejected() {
        let outer = Value::array(vec![]);
        let inner = Value::array(vec![outer.clone()]);
        if let Value::Array(items) = &outer {
            items.borrow_mut().push(inner);
        }
        assert_eq!(value_to_json(&outer), Err(CircularValue));

        let shared = Value::array(vec![Value::Null]);
        let twice = Value::array(vec![shared.clone(), shared]);
        assert_eq!(value_to_json(&twice), Ok(json!([[null], [null]])));
    }
}

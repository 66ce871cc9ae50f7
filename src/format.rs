use std::rc::Rc;

use crate::value::Value;

/// Render a number the way the language prints it: integral values without
/// a fractional part, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Top-level rendering used by `println` and string concatenation.
/// Strings appear without quotes.
pub fn value_to_string(val: &Value) -> String {
    match val {
        Value::String(s) => s.to_string(),
        _ => value_to_display(val),
    }
}

/// Nested rendering: strings are quoted so container output stays readable.
/// A container met again inside itself prints as `[Circular]`.
pub fn value_to_display(val: &Value) -> String {
    let mut out = String::new();
    display_into(val, &mut Vec::new(), &mut out);
    out
}

/// `open` holds the containers currently being printed.
fn display_into(val: &Value, open: &mut Vec<usize>, out: &mut String) {
    let id = match val {
        Value::Array(arr) => Rc::as_ptr(arr) as *const () as usize,
        Value::Object(obj) => Rc::as_ptr(obj) as *const () as usize,
        _ => {
            out.push_str(&scalar_display(val));
            return;
        }
    };
    if open.contains(&id) {
        out.push_str("[Circular]");
        return;
    }

    open.push(id);
    match val {
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                display_into(item, open, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            out.push('{');
            for (i, (k, v)) in obj.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&format!("\"{}\": ", escape_string(k)));
                display_into(v, open, out);
            }
            out.push('}');
        }
        _ => {}
    }
    open.pop();
}

fn scalar_display(val: &Value) -> String {
    match val {
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        Value::Function(callable) => match callable.function.name() {
            Some(name) => format!("<function {}>", name),
            None => "<function>".to_string(),
        },
        Value::Scope(env) => format!("<scope {}>", env.depth()),
        Value::Discard => "<discard>".to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Object keys are strings; computed keys go through the unquoted rendering.
pub fn property_key(key: &Value) -> String {
    value_to_string(key)
}

pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_number_rendering() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_container_rendering_quotes_nested_strings() {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), Value::string("a\"b"));
        entries.insert("tags".to_string(), Value::array(vec![Value::Number(1.0), Value::Null]));
        let obj = Value::object(entries);
        assert_eq!(value_to_string(&obj), r#"{"name": "a\"b", "tags": [1, null]}"#);
        assert_eq!(value_to_string(&Value::string("plain")), "plain");
        assert_eq!(property_key(&Value::Bool(true)), "true");
    }

    #[test]
    fn test_self_containing_values_print_as_circular() {
        let arr = Value::array(vec![Value::Number(1.0)]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        assert_eq!(value_to_string(&arr), "[1, [Circular]]");

        // the same array twice side by side is not a cycle
        let shared = Value::array(vec![]);
        let pair = Value::array(vec![shared.clone(), shared]);
        assert_eq!(value_to_string(&pair), "[[], []]");

        let obj = Value::object(IndexMap::new());
        if let Value::Object(entries) = &obj {
            entries.borrow_mut().insert("me".to_string(), obj.clone());
        }
        assert_eq!(value_to_string(&obj), r#"{"me": [Circular]}"#);
    }
}

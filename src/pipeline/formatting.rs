use serde_json::Value;

/// `staff_training_complete` -> `Staff Training Complete`.
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Renders the stored yes/no answers the way people read them.
pub fn display_answer(value: &str) -> &str {
    match value {
        "yes" => "Yes",
        "no" => "No",
        other => other,
    }
}

/// Flattens a whole submission payload into one readable multi-line cell.
pub fn flatten_payload(payload: &Value) -> String {
    match payload {
        Value::Object(object) if !object.is_empty() => object
            .iter()
            .map(|(key, value)| format!("{}: {}", title_case(key), format_value(value, 0)))
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => "No data available".to_string(),
    }
}

fn format_value(value: &Value, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    match value {
        Value::Null => "N/A".to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::String(s) => display_answer(s).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("{indent}  - {}", format_value(item, depth + 1)))
                .collect();
            format!("[\n{}\n{indent}]", lines.join("\n"))
        }
        Value::Object(object) if object.is_empty() => "{}".to_string(),
        Value::Object(object) => {
            let lines: Vec<String> = object
                .iter()
                .map(|(key, val)| {
                    format!("{indent}  {}: {}", title_case(key), format_value(val, depth + 1))
                })
                .collect();
            format!("{{\n{}\n{indent}}}", lines.join("\n"))
        }
    }
}

use serde_json::Value;

/// Pull the first JSON object out of model output.
///
/// Text before the first `{` is dropped and parsing stops after the first
/// complete value. When that fails, a missing comma between a value and the
/// next key on the following line is repaired and parsing is retried.
pub fn extract_json(text: &str) -> Result<Value, String> {
    let start = text
        .find('{')
        .ok_or_else(|| "no JSON object in judge output".to_string())?;
    let segment = &text[start..];

    match first_value(segment) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = insert_missing_commas(segment);
            first_value(&repaired).map_err(|_| format!("invalid JSON: {}", first_err))
        }
    }
}

fn first_value(segment: &str) -> Result<Value, String> {
    serde_json::Deserializer::from_str(segment)
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| "no JSON value".to_string())?
        .map_err(|e| e.to_string())
}

fn insert_missing_commas(segment: &str) -> String {
    let lines: Vec<&str> = segment.lines().collect();
    let mut out = String::with_capacity(segment.len() + 8);
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        let next_opens_key = lines
            .get(i + 1)
            .map(|next| next.trim_start().starts_with('"'))
            .unwrap_or(false);
        if next_opens_key && ends_value(line.trim_end()) {
            out.push(',');
        }
        out.push('\n');
    }
    out
}

fn ends_value(line: &str) -> bool {
    if line.is_empty() || line.ends_with(',') || line.ends_with('{') || line.ends_with('[') {
        return false;
    }
    line.ends_with('"')
        || line.ends_with('}')
        || line.ends_with(']')
        || line.ends_with("true")
        || line.ends_with("false")
        || line.ends_with("null")
        || line.ends_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_preamble_and_trailing_text() {
        let text = "Sure, here is my review:\n```\n{\"Score\": 4, \"Rationale\": \"tidy\"}\n```\nThanks!";
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"Score": 4, "Rationale": "tidy"})
        );
    }

    #[test]
    fn repairs_missing_comma_between_fields() {
        let text = "{\n    \"Rationale\": \"labels overlap\"\n    \"Score\": 2\n}";
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"Rationale": "labels overlap", "Score": 2})
        );
    }

    #[test]
    fn repairs_after_boolean_value() {
        let text = "{\n  \"Appropriate\": false\n  \"Rationale\": \"inverted y axis\"\n}";
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"Appropriate": false, "Rationale": "inverted y axis"})
        );
    }

    #[test]
    fn no_object_is_an_error() {
        assert!(extract_json("I cannot see the image.").is_err());
        assert!(extract_json("{ \"Score\": ").is_err());
    }
}

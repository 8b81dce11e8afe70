use serde_json::Value;

/// Characters allowed into a prompt besides printable ASCII.
const EXTRA_SAFE_CHARS: &str = "§ßäöüÄÖÜ";

/// Drop everything outside printable ASCII and the German diacritics.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| {
            c.is_ascii_graphic()
                || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
                || EXTRA_SAFE_CHARS.contains(*c)
        })
        .collect()
}

/// Strip markdown code fences from a response.
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

/// First balanced `{...}` in the text, ignoring braces inside strings.
fn extract_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;
    let mut start_idx = None;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if c == '\\' && in_string {
            escape_next = true;
            continue;
        }
        if c == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        if c == '{' {
            if depth == 0 {
                start_idx = Some(i);
            }
            depth += 1;
        } else if c == '}' && depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(start) = start_idx {
                    return Some(&text[start..=i]);
                }
            }
        }
    }

    None
}

/// Repair the usual LLM JSON slips: smart quotes and trailing commas.
fn fix_json_issues(json: &str) -> String {
    let json = json
        .replace(['\u{201C}', '\u{201D}', '\u{201E}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let chars: Vec<char> = json.chars().collect();
    let mut fixed = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &c) in chars.iter().enumerate() {
        if escape_next {
            escape_next = false;
        } else if c == '\\' && in_string {
            escape_next = true;
        } else if c == '"' {
            in_string = !in_string;
        } else if c == ',' && !in_string {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        fixed.push(c);
    }

    fixed
}

/// Parse a model reply as a JSON object, tolerating fences and prose around it.
pub fn parse_reply(response: &str) -> Option<Value> {
    let clean = strip_markdown_fences(response);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(clean) {
        return Some(value);
    }
    let fragment = extract_json_object(clean)?;
    match serde_json::from_str::<Value>(&fix_json_issues(fragment)) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

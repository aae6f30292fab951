//! 引号修复状态机
//!
//! 字符串内部出现未转义的 `"` 时，只有后面紧跟 `: , } ]`、空白或输入结束才当作闭合引号，
//! 否则视为内容中的引号并转义

/// 单次线性扫描，输出修复后的文本
pub fn repair_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &c) in chars.iter().enumerate() {
        if escape_next {
            out.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' => {
                out.push(c);
                escape_next = true;
            }
            '"' if !in_string => {
                out.push(c);
                in_string = true;
            }
            '"' => {
                if closes_string(chars.get(i + 1).copied()) {
                    out.push(c);
                    in_string = false;
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn closes_string(next: Option<char>) -> bool {
    match next {
        None => true,
        Some(c) => matches!(c, ':' | ',' | '}' | ']') || c.is_whitespace(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_escapes_embedded_quotes() {
        let raw = r#"{"question":"What is "cache"?","answer":"x"}"#;
        let fixed = repair_quotes(raw);
        assert_eq!(fixed, r#"{"question":"What is \"cache\"?","answer":"x"}"#);

        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["question"], "What is \"cache\"?");
        assert_eq!(value["answer"], "x");
    }

    #[test]
    fn test_valid_json_is_untouched() {
        let raw = r#"{"a": "b", "c": ["d", "e\"f"]}"#;
        assert_eq!(repair_quotes(raw), raw);
    }

    #[test]
    fn test_quote_at_end_of_input_closes() {
        assert_eq!(repair_quotes(r#""abc""#), r#""abc""#);
    }
}

//! 文本层面的修补：去除 markdown / HTML 噪声、截取数组、补全结构

use regex::Regex;
use std::sync::OnceLock;

/// 固定正则按需编译并缓存；编译失败时对应的修补步骤不生效
macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> Option<&'static Regex> {
            static RE: OnceLock<Option<Regex>> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).ok()).as_ref()
        }
    };
}

cached_regex!(fence_json_re, r"(?i)```json\s*");
cached_regex!(fence_re, r"```\s*");
cached_regex!(html_tag_re, r"<[^>]+>");
cached_regex!(trailing_comma_re, r",\s*([}\]])");
cached_regex!(adjacent_objects_re, r"\}\s*\{");
cached_regex!(object_re, r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}");

fn replace_all(re: Option<&Regex>, text: &str, rep: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, rep).into_owned(),
        None => text.to_string(),
    }
}

/// 去掉代码块标记、解码 HTML 实体、去掉 HTML 标签
pub fn clean_markup(text: &str) -> String {
    let text = replace_all(fence_json_re(), text, "");
    let text = replace_all(fence_re(), &text, "");
    let text = text
        .trim()
        // 实体出现在 JSON 字符串内部，双引号需要转义
        .replace("&quot;", "\\\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&#39;", "'");
    replace_all(html_tag_re(), &text, "")
}

/// 截取第一个 `[` 到最后一个 `]`；没有 `]` 时截取到末尾，交给结构修复补全
pub fn slice_to_list(text: &str) -> &str {
    let Some(start) = text.find('[') else {
        return text;
    };
    match text.rfind(']') {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

/// 第二阶段使用的快速修复
pub fn quick_fix(text: &str) -> String {
    let cleaned = clean_markup(text);
    slice_to_list(&cleaned).to_string()
}

/// 在最后一个 `]` 处截断
pub fn truncate_at_last_bracket(text: &str) -> Option<&str> {
    text.rfind(']').map(|end| &text[..=end])
}

/// 去掉闭合符号前多余的逗号
pub fn strip_trailing_commas(text: &str) -> String {
    replace_all(trailing_comma_re(), text, "$1")
}

/// 结构修复：补全未闭合的字符串/括号，去掉多余逗号，补上对象之间缺失的逗号
pub fn fix_structure(text: &str) -> String {
    let balanced = balance_closers(text);
    let no_trailing = strip_trailing_commas(&balanced);
    replace_all(adjacent_objects_re(), &no_trailing, "},{")
}

/// 找出所有 `{...}` 片段（最多一层嵌套）
pub fn object_candidates(text: &str) -> Vec<&str> {
    match object_re() {
        Some(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
        None => Vec::new(),
    }
}

/// 按嵌套顺序补上缺失的 `"`、`}`、`]`
fn balance_closers(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for c in text.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '[' | '{' if !in_string => stack.push(c),
            ']' if !in_string && stack.last() == Some(&'[') => {
                stack.pop();
            }
            '}' if !in_string && stack.last() == Some(&'{') => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = String::with_capacity(text.len() + stack.len() + 1);
    out.push_str(text.trim_end());
    if in_string {
        out.push('"');
    }
    while let Some(open) = stack.pop() {
        out.push(if open == '[' { ']' } else { '}' });
    }
    out
}

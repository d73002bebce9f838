//! 报告文本规范化
//!
//! RIS存储的报告既可能是JSON包装，也可能是带少量行内标记的原始文本。
//! 这里只做尽力而为的清洗：固定标记集之外的内容原样保留，不做通用解析。

use serde_json::Value;

/// 固定的行内标记替换表
const MARKUP_TOKENS: [(&str, &str); 5] = [
    ("<p>", ""),
    ("</p>", "\n"),
    ("<strong>", ""),
    ("</strong>", ""),
    ("<br />", "\n"),
];

/// 将存储的报告文本规范化为纯文本
///
/// 优先按JSON解析：对象取`report`字段，其次`findings`字段，
/// 均不可用时整体转为文本；解析失败则按原始文本处理。
/// 随后去除固定标记并修剪首尾空白。无法解析的载荷从不视为错误。
pub fn normalize_report(raw: &str) -> String {
    let content = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => {
            if let Some(text) = fields.get("report").and_then(Value::as_str) {
                text.to_owned()
            } else if let Some(text) = fields.get("findings").and_then(Value::as_str) {
                text.to_owned()
            } else {
                // 未知结构：整体转为文本
                Value::Object(fields).to_string()
            }
        }
        Ok(Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(_) => raw.to_owned(),
    };

    strip_markup(&content)
}

/// 去除固定标记并压缩连续空行
fn strip_markup(text: &str) -> String {
    let mut cleaned = text.to_owned();
    for (token, replacement) in MARKUP_TOKENS {
        cleaned = cleaned.replace(token, replacement);
    }
    while cleaned.contains("\n\n") {
        cleaned = cleaned.replace("\n\n", "\n");
    }
    cleaned.trim().to_string()
}

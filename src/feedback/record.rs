//! 留言与回复的行格式
//!
//! 留言行 `#{id} {name}: {text}`，回复行 `{id}: {text}`。
//! 文本中的换行与反斜杠转义，保证一条记录占一行。

use crate::core::model::ANONYMOUS_AUTHOR;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage {
    pub id: u64,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackReply {
    pub message_id: u64,
    pub body: String,
}

impl FeedbackMessage {
    pub fn to_line(&self) -> String {
        format!("#{} {}: {}", self.id, self.author, escape(&self.body))
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('#')?;
        let (id, rest) = rest.split_once(' ')?;
        let (author, body) = rest.split_once(": ")?;
        Some(Self {
            id: id.parse().ok()?,
            author: author.to_string(),
            body: unescape(body),
        })
    }
}

impl FeedbackReply {
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.message_id, escape(&self.body))
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let (id, body) = line.split_once(": ")?;
        Some(Self {
            message_id: id.parse().ok()?,
            body: unescape(body),
        })
    }
}

/// 规范化留言者名称
///
/// 名称中的冒号与换行会破坏行格式，直接去除；空名称回退为匿名用户。
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, ':' | '：' | '\n' | '\r'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        ANONYMOUS_AUTHOR.to_string()
    } else {
        cleaned.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

use encoding_rs::Encoding;

/// 按指定编码宽松解码，无法识别的字节序列直接丢弃
pub fn decode_lossy(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect()
    } else {
        text.into_owned()
    }
}

/// 按字符截断字符串，超出部分以省略号表示
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gbk_bytes_decode_and_garbage_is_dropped() {
        let (encoded, _, _) = encoding_rs::GBK.encode("发表时间：2023");
        let mut bytes = encoded.into_owned();
        bytes.extend_from_slice(&[0x81, 0x20]);
        bytes.extend_from_slice(b"ok");

        let text = decode_lossy(encoding_rs::GBK, &bytes);
        assert!(text.starts_with("发表时间：2023"));
        assert!(text.ends_with("ok"));
        assert!(!text.contains(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_string("第1章 开端", 10), "第1章 开端");
        assert_eq!(truncate_string("一二三四五六七八", 6), "一二三...");
    }
}

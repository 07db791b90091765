/// 工具函数集合

use uuid::Uuid;

/// 生成唯一 ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// 从页面查询串中读取 token 参数
///
/// 与浏览器 `URLSearchParams.get("token")` 行为一致：允许前导 `?`，
/// `+` 视为空格，值做百分号解码；同名参数取第一个。
pub fn token_from_query(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if decode_component(key) == "token" {
                Some(decode_component(value))
            } else {
                None
            }
        })
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        // 非法 UTF-8 序列按原样保留
        Err(_) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36); // UUID v4 格式
    }

    #[test]
    fn test_token_from_query() {
        assert_eq!(token_from_query("?token=abc123"), Some("abc123".to_string()));
        assert_eq!(token_from_query("user=1&token=xyz"), Some("xyz".to_string()));
        assert_eq!(token_from_query("?token="), Some(String::new()));
        assert_eq!(token_from_query("?token"), Some(String::new()));
        assert_eq!(token_from_query("?user=1"), None);
        assert_eq!(token_from_query(""), None);
    }

    #[test]
    fn test_token_from_query_decodes() {
        assert_eq!(token_from_query("?token=a%2Bb%3Dc"), Some("a+b=c".to_string()));
        assert_eq!(token_from_query("?token=hello+world"), Some("hello world".to_string()));
        assert_eq!(token_from_query("?token=first&token=second"), Some("first".to_string()));
    }
}

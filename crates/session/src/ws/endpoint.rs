/// 连接地址构造

use crate::{Error, Result};
use std::fmt;

/// 默认服务端地址
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// 带 token 的 WebSocket 连接地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    /// 以查询参数形式附加 token
    ///
    /// token 不做校验，空字符串同样接受；除 URI 中不允许出现的字符
    /// （空格、引号、`#`、`<`、`>`、非 ASCII 等）按百分号编码外，原样保留。
    pub fn new(base: &str, token: &str) -> Result<Self> {
        let base = base.trim();
        if !(base.starts_with("ws://") || base.starts_with("wss://")) {
            return Err(Error::InvalidArgument(format!(
                "连接地址必须以 ws:// 或 wss:// 开头: {}",
                base
            )));
        }

        let separator = if base.contains('?') { '&' } else { '?' };
        Ok(Self {
            url: format!("{}{}token={}", base, separator, escape_query_value(token)),
        })
    }

    /// `ws://<host>:<port>/ws?token=<token>`
    pub fn local(host: &str, port: u16, token: &str) -> Result<Self> {
        Self::new(&format!("ws://{}:{}/ws", host, port), token)
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

/// 只编码 URI 中不合法的字符，合法字符（含 `%`、`&`、`=`）保持原样
fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut buf = [0u8; 4];
    for c in value.chars() {
        if is_uri_char(c) {
            escaped.push(c);
        } else {
            escaped.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    escaped
}

fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@/?%".contains(c)
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// 配置管理

use serde::Deserialize;
use session::utils::token_from_query;
use session::ws::endpoint::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub endpoint: String,
    pub token: String,
    pub log_level: String,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("WS_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        if endpoint.trim().is_empty() {
            return Err(session::Error::Config("WS_ENDPOINT 不能为空".to_string()).into());
        }

        let token = resolve_token(
            std::env::var("WS_TOKEN").ok(),
            std::env::var("WS_QUERY").ok(),
        );

        let log_level = std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            endpoint,
            token,
            log_level,
        })
    }
}

/// token 优先取 WS_TOKEN，其次取页面查询串中的 token 参数，都没有时为空
fn resolve_token(token: Option<String>, query: Option<String>) -> String {
    token
        .or_else(|| query.as_deref().and_then(token_from_query))
        .unwrap_or_default()
}

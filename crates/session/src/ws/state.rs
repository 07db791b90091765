/// 会话状态与可观察状态容器
///
/// 展示层通过 `SessionStore::subscribe` 订阅变化，或用 `snapshot` 轮询

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

/// 连接状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// 是否存在未关闭的连接
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 会话快照
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// 会话 ID
    pub session_id: String,

    /// 连接状态
    pub state: ConnectionState,

    /// 是否已连接（握手完成且未关闭）
    pub connected: bool,

    /// 当前连接地址（含 token）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// 已接收消息，按到达顺序
    pub messages: Vec<String>,

    /// 待发送输入
    pub pending_input: String,

    /// 最近一次传输错误（仅诊断）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// 本次连接发起时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            state: ConnectionState::Idle,
            connected: false,
            endpoint: None,
            messages: Vec::new(),
            pending_input: String::new(),
            last_error: None,
            opened_at: None,
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 可注入的会话状态容器
pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// 创建新的状态容器
    pub fn new(session_id: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::new(session_id.into()));
        Self { tx }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// 获取当前快照
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.tx.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.tx.borrow().connected
    }

    pub fn pending_input(&self) -> String {
        self.tx.borrow().pending_input.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.tx.borrow().messages.clone()
    }

    /// 修改快照并通知订阅者（无订阅者时同样生效）
    pub(crate) fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        self.tx.send_modify(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_idle() {
        let store = SessionStore::new("s-1");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.session_id, "s-1");
        assert_eq!(snapshot.state, ConnectionState::Idle);
        assert!(!snapshot.connected);
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_sees_update() {
        let store = SessionStore::new("s-2");
        let mut rx = store.subscribe();

        store.update(|s| {
            s.state = ConnectionState::Open;
            s.connected = true;
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().state, ConnectionState::Open);
        assert!(store.is_connected());
    }

    #[test]
    fn test_snapshot_json() {
        let store = SessionStore::new("s-3");
        store.update(|s| s.messages.push("hello".to_string()));
        let json = store.snapshot().to_json().unwrap();
        assert!(json.contains("\"state\": \"idle\""));
        assert!(json.contains("hello"));
        assert!(!json.contains("last_error"));
    }
}

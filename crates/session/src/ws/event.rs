/// 传输层事件

/// 传输层通知，按到达顺序投递给会话管理器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// 握手完成
    Opened,
    /// 收到文本帧（原样保留，不做解析）
    MessageReceived(String),
    /// 传输错误（仅用于诊断）
    Errored(String),
    /// 连接已关闭
    Closed,
}

impl TransportEvent {
    /// 事件名（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::MessageReceived(_) => "message",
            Self::Errored(_) => "error",
            Self::Closed => "closed",
        }
    }
}

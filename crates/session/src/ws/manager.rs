/// 会话管理器
///
/// 持有唯一的一条连接，串行处理用户操作与传输事件：
/// Idle → Connecting → Open → Closed（另有 Connecting → Closed），无回退、无重连

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::endpoint::Endpoint;
use super::state::{ConnectionState, SessionStore};
use super::transport::{Connector, TransportLink};
use super::TransportEvent;
use crate::{Error, Result};

/// 发送结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// 已交给传输层
    Sent,
    /// 连接未打开，未做任何发送尝试
    Dropped,
}

/// 单连接会话管理器
pub struct SessionManager {
    /// 传输连接器
    connector: Arc<dyn Connector>,

    /// 可观察状态
    store: SessionStore,

    /// 当前链路（至多一条）
    link: Option<Box<dyn TransportLink>>,

    /// 当前链路的事件接收端，每次 open 重新创建
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

impl SessionManager {
    /// 创建新的会话管理器
    pub fn new(connector: Arc<dyn Connector>, store: SessionStore) -> Self {
        Self {
            connector,
            store,
            link: None,
            events: None,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn state(&self) -> ConnectionState {
        self.store.state()
    }

    /// 发起连接
    ///
    /// 仅允许在 Idle 或 Closed 状态调用；新连接会清空消息记录。
    pub fn open(&mut self, endpoint: &str, token: &str) -> Result<()> {
        let state = self.state();
        if state.is_live() {
            return Err(Error::InvalidState(format!(
                "已存在活动连接，当前状态: {}",
                state
            )));
        }

        let endpoint = Endpoint::new(endpoint, token)?;

        // 上一条链路已由对端关闭但尚未释放
        if let Some(old) = self.link.take() {
            old.close();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        info!("连接 WebSocket 服务端: {}", endpoint);
        let link = self.connector.connect(endpoint.as_str(), tx);
        self.link = Some(link);
        self.events = Some(rx);

        self.store.update(|s| {
            s.state = ConnectionState::Connecting;
            s.connected = false;
            s.endpoint = Some(endpoint.to_string());
            s.messages.clear();
            s.last_error = None;
            s.opened_at = Some(chrono::Utc::now());
        });

        Ok(())
    }

    /// 等待当前链路的下一个事件
    ///
    /// 没有链路或链路事件已耗尽时返回 None。
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// 分发传输事件
    pub fn handle_event(&mut self, event: TransportEvent) {
        debug!("处理传输事件: {}", event.kind());
        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::MessageReceived(payload) => self.on_message(payload),
            TransportEvent::Errored(reason) => self.on_error(reason),
            TransportEvent::Closed => self.on_close(),
        }
    }

    /// 握手完成
    pub fn on_open(&mut self) {
        let state = self.state();
        if state != ConnectionState::Connecting {
            debug!("忽略 open 事件，当前状态: {}", state);
            return;
        }

        info!("✅ WebSocket 已连接");
        self.store.update(|s| {
            s.state = ConnectionState::Open;
            s.connected = true;
        });
    }

    /// 收到消息，按到达顺序追加
    ///
    /// 仅在 Open 状态记录；close 之后仍在队列中的消息直接丢弃。
    pub fn on_message(&mut self, payload: String) {
        let state = self.state();
        if state != ConnectionState::Open {
            debug!("忽略消息，当前状态: {}", state);
            return;
        }

        debug!("收到服务端消息: {}", payload);
        self.store.update(|s| s.messages.push(payload));
    }

    /// 传输错误：只记录，不改变状态
    pub fn on_error(&mut self, reason: String) {
        error!("WebSocket 错误: {}", reason);
        self.store.update(|s| s.last_error = Some(reason));
    }

    /// 连接关闭
    pub fn on_close(&mut self) {
        if self.state() == ConnectionState::Closed {
            return;
        }

        info!("WebSocket 已关闭");
        self.store.update(|s| {
            s.state = ConnectionState::Closed;
            s.connected = false;
        });
    }

    /// 设置待发送输入
    pub fn set_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.store.update(|s| s.pending_input = text);
    }

    /// 发送待发送输入
    pub fn send_pending(&mut self) -> SendOutcome {
        let text = self.store.pending_input();
        self.send(&text)
    }

    /// 发送文本
    ///
    /// 仅在 Open 状态下发送并清空待发送输入；其余状态不做任何尝试，
    /// 待发送输入保持不变，返回 `SendOutcome::Dropped`。
    pub fn send(&mut self, text: &str) -> SendOutcome {
        let state = self.state();
        let link = match (&self.link, state) {
            (Some(link), ConnectionState::Open) => link,
            _ => {
                debug!("连接未打开，丢弃消息，当前状态: {}", state);
                return SendOutcome::Dropped;
            }
        };

        if let Err(e) = link.send_text(text.to_string()) {
            // 驱动任务已退出，稍后会收到 Closed 事件
            warn!("发送消息失败: {}", e);
            return SendOutcome::Dropped;
        }

        self.store.update(|s| s.pending_input.clear());
        SendOutcome::Sent
    }

    /// 主动关闭
    ///
    /// 仅在 Open 状态生效；链路在此释放，不等待关闭握手，立即置为 Closed。
    pub fn close(&mut self) {
        if self.state() != ConnectionState::Open {
            debug!("连接未打开，忽略 close");
            return;
        }

        if let Some(link) = self.link.take() {
            info!("关闭 WebSocket 连接");
            link.close();
            self.store.update(|s| {
                s.state = ConnectionState::Closed;
                s.connected = false;
            });
        }
    }

    /// 释放链路
    ///
    /// 无论当前状态如何，只要存在链路就请求释放，且每条链路只释放一次。
    pub fn teardown(&mut self) {
        if let Some(link) = self.link.take() {
            info!("释放 WebSocket 链路");
            link.close();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

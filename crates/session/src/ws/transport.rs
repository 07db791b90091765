/// 传输抽象与 tokio-tungstenite 实现
///
/// `Connector::connect` 立即返回链路句柄，握手在后台任务中进行，
/// 结果通过事件通道回传给会话管理器

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::TransportEvent;
use crate::{Error, Result};

/// 事件发送端
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// 传输连接器
pub trait Connector: Send + Sync {
    /// 发起握手（不阻塞），返回链路句柄
    fn connect(&self, url: &str, events: EventSender) -> Box<dyn TransportLink>;
}

/// 一条已发起的传输链路
pub trait TransportLink: Send {
    /// 发送文本帧
    fn send_text(&self, text: String) -> Result<()>;

    /// 请求释放链路（不等待对端确认）
    fn close(&self);
}

/// 基于 tokio-tungstenite 的连接器
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &str, events: EventSender) -> Box<dyn TransportLink> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<String>();
        let cancel = CancellationToken::new();

        tokio::spawn(drive(url.to_string(), outgoing_rx, events, cancel.clone()));

        Box::new(WsLink {
            outgoing: outgoing_tx,
            cancel,
        })
    }
}

/// tokio-tungstenite 链路句柄
struct WsLink {
    outgoing: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl TransportLink for WsLink {
    fn send_text(&self, text: String) -> Result<()> {
        self.outgoing
            .send(text)
            .map_err(|_| Error::Transport("连接已关闭".to_string()))
    }

    fn close(&self) {
        self.cancel.cancel();
    }
}

/// 链路驱动任务：握手，然后转发收发帧直到关闭
async fn drive(
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: EventSender,
    cancel: CancellationToken,
) {
    debug!("开始握手: {}", url);

    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            info!("握手完成前链路已被释放");
            let _ = events.send(TransportEvent::Closed);
            return;
        }
        result = connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            error!("WebSocket 连接失败: {}", e);
            let _ = events.send(TransportEvent::Errored(e.to_string()));
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };

    info!("✅ WebSocket 连接成功");
    let _ = events.send(TransportEvent::Opened);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("请求关闭链路");
                if let Err(e) = ws_sender.send(Message::Close(None)).await {
                    debug!("发送关闭帧失败: {}", e);
                }
                break;
            }
            Some(text) = outgoing.recv() => {
                if let Err(e) = ws_sender.send(Message::Text(text)).await {
                    error!("发送消息失败: {}", e);
                    let _ = events.send(TransportEvent::Errored(e.to_string()));
                    break;
                }
            }
            frame = ws_receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    debug!("收到文本消息: {} 字节", text.len());
                    let _ = events.send(TransportEvent::MessageReceived(text));
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!("收到二进制消息，忽略: {} 字节", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("收到连接关闭消息: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("接收消息错误: {}", e);
                    let _ = events.send(TransportEvent::Errored(e.to_string()));
                    break;
                }
                None => {
                    debug!("接收流已结束");
                    break;
                }
            }
        }
    }

    let _ = events.send(TransportEvent::Closed);
    debug!("链路驱动任务结束");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// 启动只处理一条连接的回显服务端，返回监听地址
    async fn spawn_echo_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text("welcome".to_string())).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                match msg {
                    Message::Text(text) => {
                        ws.send(Message::Text(text)).await.unwrap();
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        format!("ws://{}/ws", addr)
    }

    #[tokio::test]
    async fn test_open_echo_close() {
        let url = spawn_echo_server().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let link = WsConnector::new().connect(&format!("{}?token=abc", url), tx);

        assert_eq!(rx.recv().await, Some(TransportEvent::Opened));
        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::MessageReceived("welcome".to_string()))
        );

        link.send_text("ping".to_string()).unwrap();
        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::MessageReceived("ping".to_string()))
        );

        link.close();
        assert_eq!(rx.recv().await, Some(TransportEvent::Closed));
    }

    #[tokio::test]
    async fn test_open_with_decoded_query_token() {
        let url = spawn_echo_server().await;
        let token = crate::utils::token_from_query("?token=hello+world").unwrap();
        let endpoint = crate::Endpoint::new(&url, &token).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let link = WsConnector::new().connect(endpoint.as_str(), tx);

        assert_eq!(rx.recv().await, Some(TransportEvent::Opened));
        link.close();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // 先占用再释放端口，得到一个无人监听的地址
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _link = WsConnector::new().connect(&format!("ws://{}/ws?token=", addr), tx);

        assert!(matches!(rx.recv().await, Some(TransportEvent::Errored(_))));
        assert_eq!(rx.recv().await, Some(TransportEvent::Closed));
    }

    #[tokio::test]
    async fn test_send_after_driver_finished() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = WsConnector::new().connect(&format!("ws://{}/ws", addr), tx);

        // 等待驱动任务退出
        while let Some(event) = rx.recv().await {
            if event == TransportEvent::Closed {
                break;
            }
        }
        tokio::task::yield_now().await;

        assert!(matches!(
            link.send_text("late".to_string()),
            Err(Error::Transport(_))
        ));
    }
}

/// Scale WebSocket - 会话库
/// 
/// 管理单条 WebSocket 连接的生命周期：建立、收发文本消息、关闭与释放

pub mod errors;
pub mod utils;
pub mod ws;

// 重新导出常用类型
pub use errors::{Error, Result};
pub use ws::{
    ConnectionState, Connector, Endpoint, SendOutcome, SessionManager, SessionSnapshot,
    SessionStore, TransportEvent, TransportLink, WsConnector,
};

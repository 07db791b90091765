/// WebSocket 会话模块
/// 
/// 单连接会话管理：状态机、可观察状态容器、传输抽象与 tokio-tungstenite 实现

pub mod endpoint;
pub mod event;
pub mod manager;
pub mod state;
pub mod transport;

pub use endpoint::Endpoint;
pub use event::TransportEvent;
pub use manager::{SendOutcome, SessionManager};
pub use state::{ConnectionState, SessionSnapshot, SessionStore};
pub use transport::{Connector, TransportLink, WsConnector};

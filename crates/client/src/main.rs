/// Scale WebSocket - Client
/// 
/// 终端 WebSocket 客户端：建立单条连接，收发文本消息

use std::sync::Arc;
use tracing::{info, Instrument};

mod config;
mod console;

use session::{utils::generate_id, SessionManager, SessionStore, WsConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 加载配置
    let cfg = config::Config::from_env()?;

    // 初始化日志
    // 可以通过环境变量 RUST_LOG 设置日志级别，例如：
    // RUST_LOG=session=debug cargo run
    tracing_subscriber::fmt()
        .with_target(false)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level))
        )
        .init();

    info!("🚀 启动 WebSocket Client...");

    let session_id = generate_id();
    let span = tracing::info_span!("session", %session_id);

    async move {
        // 创建状态容器并注入会话管理器
        let store = SessionStore::new(session_id.clone());
        let renderer = tokio::spawn(console::render(store.subscribe()));

        let mut session = SessionManager::new(Arc::new(WsConnector::new()), store);
        session.open(&cfg.endpoint, &cfg.token)?;

        let result = console::run(&mut session).await;

        // 无论以何种方式退出都释放链路
        session.teardown();
        drop(session);
        let _ = renderer.await;

        info!("客户端已退出");
        result
    }
    .instrument(span)
    .await
}

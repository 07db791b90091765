/// 终端界面
///
/// 从标准输入读取用户操作，订阅会话状态并打印连接状态与收到的消息

use session::{ConnectionState, SendOutcome, SessionManager, SessionSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

/// 用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 发送一行文本
    Send(String),
    /// 关闭连接
    Close,
    /// 打印当前会话快照
    Status,
    /// 退出
    Quit,
}

/// 解析一行输入
pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/close" => Command::Close,
        "/status" => Command::Status,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Send(line.to_string()),
    }
}

/// 运行交互循环，直到用户退出、标准输入结束或收到 Ctrl-C
pub async fn run(session: &mut SessionManager) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();

    loop {
        tokio::select! {
            Some(event) = session.next_event() => {
                session.handle_event(event);
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => {
                        debug!("标准输入已结束");
                        break;
                    }
                };

                match parse_command(&line) {
                    Command::Send(text) => {
                        session.set_input(text);
                        if session.send_pending() == SendOutcome::Dropped {
                            println!("[未发送] 连接未打开 ({})", session.state());
                        }
                    }
                    Command::Close => session.close(),
                    Command::Status => println!("{}", session.store().snapshot().to_json()?),
                    Command::Quit => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("收到中断信号");
                break;
            }
        }
    }

    Ok(())
}

/// 订阅会话状态并打印变化
pub async fn render(mut rx: watch::Receiver<SessionSnapshot>) {
    let mut last_state = ConnectionState::Idle;
    let mut seen = 0usize;

    loop {
        {
            let snapshot = rx.borrow_and_update();

            if snapshot.state != last_state {
                print_state(&snapshot);
                last_state = snapshot.state;
            }

            // 新连接会清空消息记录
            if snapshot.messages.len() < seen {
                seen = 0;
            }
            for message in &snapshot.messages[seen..] {
                println!("[{}] < {}", chrono::Local::now().format("%H:%M:%S"), message);
            }
            seen = snapshot.messages.len();
        }

        if rx.changed().await.is_err() {
            debug!("会话状态通道已关闭");
            break;
        }
    }
}

fn print_state(snapshot: &SessionSnapshot) {
    match snapshot.state {
        ConnectionState::Idle => {}
        ConnectionState::Connecting => {
            println!("... 正在连接 {}", snapshot.endpoint.as_deref().unwrap_or_default());
        }
        ConnectionState::Open => println!("● 已连接"),
        ConnectionState::Closed => println!("○ 连接已关闭，输入 /quit 退出"),
    }
}

fn print_help() {
    println!("输入文本回车发送；/close 关闭连接，/status 查看状态，/quit 退出");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/close"), Command::Close);
        assert_eq!(parse_command(" /status "), Command::Status);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("hello"), Command::Send("hello".to_string()));
        assert_eq!(parse_command(" hi "), Command::Send(" hi ".to_string()));
        assert_eq!(parse_command(""), Command::Send(String::new()));
    }
}

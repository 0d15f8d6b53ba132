//! 连接处理模块
//!
//! 每个客户端连接一个 tokio 任务：读取请求、分发命令、写回结果。
//! 唯一的挂起点是等待网络数据；命令执行期间持有的锁在写回之前就已释放。

use crate::error::{KvError, KvResult, ProtocolError};
use crate::reply::Reply;
use crate::resp::{RespParser, RespValue};
use crate::server::{Server, Session};
use crate::store::Storage;
use bytes::BytesMut;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 连接处理器
pub struct Connection {
    stream: TcpStream,
    /// 读取缓冲区，同一个缓冲区连续服务多个请求
    buffer: BytesMut,
    parser: RespParser,
    /// 客户端地址(用于日志)
    addr: String,
    idle_timeout: Duration,
}

impl Connection {
    pub fn new(stream: TcpStream, idle_timeout: Duration) -> Self {
        let addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            parser: RespParser::new(),
            addr,
            idle_timeout,
        }
    }

    /// 处理客户端连接直到对方断开、发送 QUIT 或出错
    ///
    /// 协议错误不会回复给客户端：帧边界已经不可信，直接关闭连接。
    pub async fn handle(&mut self, session: &mut Session) -> KvResult<()> {
        debug!(peer = %self.addr, "客户端已连接");

        while let Some(value) = self.read_request().await? {
            let mut parts = value.into_request()?;
            let args = parts.split_off(1);
            let name = parts[0].to_lowercase();

            let reply = session.process(&name, &args);
            let quit = matches!(reply, Reply::Quit);

            self.write_reply(RespValue::from(reply)).await?;

            if quit {
                debug!(peer = %self.addr, "客户端请求断开");
                return Ok(());
            }
        }

        debug!(peer = %self.addr, "客户端断开连接");
        Ok(())
    }

    /// 读取下一个完整的请求；对方正常关闭时返回 `None`
    async fn read_request(&mut self) -> KvResult<Option<RespValue>> {
        loop {
            if let Some(value) = self.parser.parse(&mut self.buffer)? {
                return Ok(Some(value));
            }

            let read = timeout(self.idle_timeout, self.stream.read_buf(&mut self.buffer));
            let bytes_read = read.await.map_err(|_| KvError::IdleTimeout)??;

            if bytes_read == 0 {
                // 请求读到一半连接就关闭了
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ProtocolError::UnexpectedEof.into())
                };
            }
        }
    }

    async fn write_reply(&mut self, value: RespValue) -> KvResult<()> {
        let data = value.serialize();
        self.stream.write_all(&data).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// 接受连接直到 `shutdown` 完成
pub async fn serve_until<F>(
    listener: TcpListener,
    server: Arc<Server>,
    idle_timeout: Duration,
    shutdown: F,
) -> KvResult<()>
where
    F: Future<Output = ()> + Send,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("服务器正在关闭");
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => spawn_connection(stream, peer, &server, idle_timeout),
                    Err(err) => warn!(error = %err, "接受连接失败"),
                }
            }
        }
    }
}

/// 一直接受连接
pub async fn serve(
    listener: TcpListener,
    server: Arc<Server>,
    idle_timeout: Duration,
) -> KvResult<()> {
    serve_until(listener, server, idle_timeout, std::future::pending()).await
}

fn spawn_connection(stream: TcpStream, peer: SocketAddr, server: &Arc<Server>, idle: Duration) {
    let mut session = Session::new(Arc::clone(server));

    tokio::spawn(async move {
        let mut connection = Connection::new(stream, idle);
        match connection.handle(&mut session).await {
            Ok(()) => {}
            Err(KvError::IdleTimeout) => info!(peer = %peer, "连接空闲超时，已关闭"),
            Err(err) => warn!(peer = %peer, error = %err, "连接异常关闭"),
        }
    });
}

/// 后台任务：定期执行主动过期扫描
pub fn spawn_expiration_task(storage: Storage, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = storage.run_expiration_cycle();
            if removed > 0 {
                debug!(removed, "主动过期清理");
            }
        }
    })
}

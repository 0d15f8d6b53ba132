use anyhow::Context;
use clap::Parser;
use kv_lib::connection::{serve_until, spawn_expiration_task};
use kv_lib::{CommandTable, Config, Server, Storage};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::parse();
    let addr = config.listen_addr();

    let storage = Storage::new();
    let expiration = spawn_expiration_task(storage.clone(), config.expire_interval());

    let server = Arc::new(Server::new(
        storage,
        CommandTable::new(),
        config.password.clone(),
    ));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        %addr,
        version = kv_lib::VERSION,
        auth = server.requires_auth(),
        "kv-server 已启动"
    );

    serve_until(listener, server, config.idle_timeout(), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "无法监听 ctrl-c 信号");
        }
    })
    .await?;

    expiration.abort();
    Ok(())
}

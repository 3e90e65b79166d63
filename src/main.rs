// ==========================================
// 停电抢修调度系统 - 服务主入口
// ==========================================
// 职责: 初始化日志与数据库,启动 HTTP 服务与可选的后台推进任务
// ==========================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crew_dispatch::app::{create_router, get_default_db_path, spawn_movement_loop, AppState};
use crew_dispatch::logging;

/// 监听地址环境变量
const LISTEN_ADDR_ENV: &str = "CREW_DISPATCH_LISTEN_ADDR";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 抢修班组派遣服务", crew_dispatch::APP_NAME);
    tracing::info!("系统版本: {}", crew_dispatch::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = tokio::task::spawn_blocking(move || AppState::new(db_path))
        .await
        .context("AppState 初始化任务中断")?
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;
    let state = Arc::new(state);

    // 后台推进任务（按配置启用）
    let movement_loop = if state.dispatch_config.movement_loop_enabled {
        Some(spawn_movement_loop(
            state.crew_api.clone(),
            Duration::from_secs(state.dispatch_config.movement_tick_secs),
        ))
    } else {
        tracing::info!("后台推进任务未启用");
        None
    };

    let addr_raw =
        std::env::var(LISTEN_ADDR_ENV).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    let addr: SocketAddr = addr_raw
        .trim()
        .parse()
        .with_context(|| format!("监听地址无效: {}", addr_raw))?;

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法监听 {}", addr))?;
    tracing::info!("HTTP 服务启动: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    if let Some(handle) = movement_loop {
        handle.shutdown().await;
    }

    tracing::info!("服务已退出");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "无法监听关闭信号");
        // 监听失败时不退出,保持服务
        std::future::pending::<()>().await;
    }
    tracing::info!("收到关闭信号,开始优雅退出");
}

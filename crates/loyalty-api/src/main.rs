//! 积分服务
//!
//! 加载配置、初始化可观测性、连接数据库并执行迁移，然后启动 HTTP 服务。

use std::sync::Arc;

use loyalty_api::{AppState, auth::JwtConfig, build_router};
use loyalty_core::PgLedgerStore;
use loyalty_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("loyalty-api")?;
    let _guard = observability::init(&config.observability, &config.service_name).await?;

    info!("Starting loyalty-api on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;

    match &config.accrual.address {
        Some(address) => info!(address = %address, "积分计算系统地址已配置"),
        None => warn!("未配置积分计算系统地址"),
    }
    if config.accrual.report_token.is_none() {
        warn!("未配置 accrual.report_token，积分回报入口关闭");
    }

    let store = Arc::new(PgLedgerStore::new(db.pool().clone()));
    let state = AppState::new(
        store,
        config.transaction.retry_policy(),
        JwtConfig::from(&config.auth),
    )
    .with_bcrypt_cost(config.auth.bcrypt_cost)
    .with_accrual_token(config.accrual.report_token.clone())
    .with_tx_timeout(config.transaction.timeout())
    .with_database(db.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = build_router(state).layer(cors);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 收到 SIGTERM 或 Ctrl+C 后停止接收新连接，等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

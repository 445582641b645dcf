//! Prometheus 指标
//!
//! 业务计数器通过 `metrics` 宏记录，由 metrics-exporter-prometheus 在独立端口的
//! `/metrics` 上导出。未安装 recorder 时记录函数为空操作。

use std::net::SocketAddr;

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ObservabilityConfig;

/// 指标导出服务，drop 时停止
pub struct MetricsHandle {
    server: JoinHandle<()>,
}

impl Drop for MetricsHandle {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// 安装全局 recorder 并启动导出服务
pub async fn init(config: &ObservabilityConfig, service_name: &str) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new()
        .add_global_label("service", service_name)
        .install_recorder()?;

    describe_metrics();
    metrics::counter!("service_starts_total").increment(1);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "指标导出服务已启动");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, exporter_router(handle)).await {
            error!(error = %e, "指标导出服务异常退出");
        }
    });

    Ok(MetricsHandle { server })
}

fn exporter_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}

fn describe_metrics() {
    metrics::describe_counter!("http_requests_total", "HTTP requests by route and status");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
    metrics::describe_counter!(
        "orders_admitted_total",
        "Order admissions by outcome (created, already_exists, conflict, invalid)"
    );
    metrics::describe_counter!(
        "accruals_applied_total",
        "Accrual reports that changed an order, by resulting status"
    );
    metrics::describe_counter!("withdrawals_total", "Withdrawals by outcome");
    metrics::describe_histogram!(
        "withdrawal_duration_seconds",
        metrics::Unit::Seconds,
        "Withdrawal unit-of-work latency"
    );
}

/// 记录 HTTP 请求，`route` 为路由模板而非原始路径
#[inline]
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status
    )
    .record(duration_secs);
}

/// 记录订单受理结果
#[inline]
pub fn record_order_admission(outcome: &'static str) {
    metrics::counter!("orders_admitted_total", "outcome" => outcome).increment(1);
}

/// 记录生效的积分回报
#[inline]
pub fn record_accrual(status: &'static str) {
    metrics::counter!("accruals_applied_total", "status" => status).increment(1);
}

/// 记录提现
#[inline]
pub fn record_withdrawal(outcome: &'static str, duration_secs: f64) {
    metrics::counter!("withdrawals_total", "outcome" => outcome).increment(1);
    metrics::histogram!("withdrawal_duration_seconds", "outcome" => outcome).record(duration_secs);
}

//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router, middleware,
    routing::{get, post},
};
use loyalty_shared::observability::middleware::http_tracing;

use crate::middleware::{accrual_token_middleware, auth_middleware};
use crate::{handlers, state::AppState};

/// 公开路由：注册与登录
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
}

/// 需要登录的用户路由
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::upload_order).get(handlers::orders::list_orders),
        )
        .route("/balance", get(handlers::balance::get_balance))
        .route("/balance/withdraw", post(handlers::balance::withdraw))
        .route("/withdrawals", get(handlers::balance::list_withdrawals))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// 积分计算系统使用的内部路由
fn accrual_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/accrual", post(handlers::accrual::report_accrual))
        .route("/accrual/pending", get(handlers::accrual::list_pending))
        .route_layer(middleware::from_fn_with_state(
            state,
            accrual_token_middleware,
        ))
}

/// 构建完整的应用路由
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/user",
            public_routes().merge(user_routes(state.clone())),
        )
        .nest("/api/internal", accrual_routes(state.clone()))
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn(http_tracing))
        .with_state(state)
}

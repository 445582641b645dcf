//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;
use std::time::Duration;

use loyalty_core::{
    BalanceAccount, Deadline, LedgerStore, OrderLedger, PaymentProcessor, UnitOfWork, UserService,
};
use loyalty_shared::database::Database;
use loyalty_shared::retry::RetryPolicy;

use crate::auth::{JwtConfig, JwtManager};

/// Axum 应用共享状态
///
/// 各业务服务共享同一存储，请求之间不共享任何可变内存状态
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub ledger: OrderLedger,
    pub account: BalanceAccount,
    pub payments: PaymentProcessor,
    pub jwt_manager: JwtManager,
    /// bcrypt 计算强度
    pub bcrypt_cost: u32,
    /// 积分回报入口的访问令牌，None 时入口关闭
    pub accrual_token: Option<Arc<str>>,
    /// 单个业务事务的超时时间
    pub tx_timeout: Option<Duration>,
    /// 用于健康检查，内存存储下为空
    pub database: Option<Database>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(store: Arc<dyn LedgerStore>, policy: RetryPolicy, jwt_config: JwtConfig) -> Self {
        let uow = UnitOfWork::new(store, policy);
        Self {
            users: UserService::new(uow.clone()),
            ledger: OrderLedger::new(uow.clone()),
            account: BalanceAccount::new(uow.clone()),
            payments: PaymentProcessor::new(uow),
            jwt_manager: JwtManager::new(jwt_config),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            accrual_token: None,
            tx_timeout: None,
            database: None,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_accrual_token(mut self, token: Option<String>) -> Self {
        self.accrual_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }

    pub fn with_tx_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tx_timeout = timeout;
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// 为本次请求生成截止时间
    pub fn deadline(&self) -> Deadline {
        Deadline::from_timeout(self.tx_timeout)
    }
}

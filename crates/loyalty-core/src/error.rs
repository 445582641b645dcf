//! 积分服务错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

use crate::models::OrderStatus;

/// PostgreSQL 错误码
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const LOCK_NOT_AVAILABLE: &str = "55P03";
}

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum LoyaltyError {
    // === 订单相关错误 ===
    #[error("订单号格式无效: {0:?}")]
    InvalidIdentifier(String),

    #[error("订单已被其他用户上传: {number}")]
    Conflict { number: String },

    #[error("订单已上传: {number}")]
    AlreadyExists { number: String },

    #[error("订单不存在: {0}")]
    OrderNotFound(String),

    #[error("订单状态不允许此变更: number={number}, {from} -> {to}")]
    InvalidTransition {
        number: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    // === 账户相关错误 ===
    #[error("积分余额不足: 需要 {required}, 可用 {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("用户不存在: {0}")]
    UserNotFound(i64),

    #[error("登录名已被占用: {0}")]
    LoginTaken(String),

    // === 系统错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("操作超时，事务已回滚")]
    DeadlineExceeded,

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分服务 Result 类型别名
pub type Result<T> = std::result::Result<T, LoyaltyError>;

impl LoyaltyError {
    /// 检查是否为可重试的错误
    ///
    /// 仅瞬时存储故障可重试，重试时整个原子单元从头执行
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(e) => is_transient(e),
            _ => false,
        }
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::DeadlineExceeded
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "INVALID_ORDER_NUMBER",
            Self::Conflict { .. } => "ORDER_CONFLICT",
            Self::AlreadyExists { .. } => "ORDER_ALREADY_EXISTS",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_ORDER_TRANSITION",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::LoginTaken(_) => "LOGIN_TAKEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// 取出数据库错误的 SQLSTATE
fn sql_state(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// 瞬时故障：连接问题、死锁、序列化冲突、锁不可用
pub(crate) fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(_) => matches!(
            sql_state(err).as_deref(),
            Some(sqlstate::SERIALIZATION_FAILURE)
                | Some(sqlstate::DEADLOCK_DETECTED)
                | Some(sqlstate::LOCK_NOT_AVAILABLE)
        ),
        _ => false,
    }
}

/// 服务端已确定回滚：序列化冲突与死锁
///
/// 其余提交失败（如连接中断）无法确定事务是否已生效
pub(crate) fn is_certain_rollback(err: &sqlx::Error) -> bool {
    matches!(
        sql_state(err).as_deref(),
        Some(sqlstate::SERIALIZATION_FAILURE) | Some(sqlstate::DEADLOCK_DETECTED)
    )
}

/// 是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    sql_state(err).as_deref() == Some(sqlstate::UNIQUE_VIOLATION)
}

/// 是否为外键约束冲突
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sql_state(err).as_deref() == Some(sqlstate::FOREIGN_KEY_VIOLATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error() -> sqlx::Error {
        sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ))
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(LoyaltyError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(LoyaltyError::Database(io_error()).is_retryable());
        assert!(!LoyaltyError::Database(sqlx::Error::RowNotFound).is_retryable());
        assert!(
            !LoyaltyError::InsufficientFunds {
                required: 300,
                available: 200
            }
            .is_retryable()
        );
        assert!(!LoyaltyError::DeadlineExceeded.is_retryable());
    }

    #[test]
    fn test_io_commit_failure_is_not_certain_rollback() {
        assert!(!is_certain_rollback(&io_error()));
        assert!(!is_certain_rollback(&sqlx::Error::PoolTimedOut));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(LoyaltyError::InvalidIdentifier("12a".to_string()).is_business_error());
        assert!(
            LoyaltyError::Conflict {
                number: "79927398713".to_string()
            }
            .is_business_error()
        );
        assert!(!LoyaltyError::Internal("panic".to_string()).is_business_error());
        assert!(!LoyaltyError::DeadlineExceeded.is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            LoyaltyError::InsufficientFunds {
                required: 1,
                available: 0
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            LoyaltyError::AlreadyExists {
                number: "0".to_string()
            }
            .error_code(),
            "ORDER_ALREADY_EXISTS"
        );
        assert_eq!(LoyaltyError::UserNotFound(7).error_code(), "USER_NOT_FOUND");
    }

    #[test]
    fn test_error_display() {
        let err = LoyaltyError::InvalidTransition {
            number: "79927398713".to_string(),
            from: OrderStatus::Processed,
            to: OrderStatus::Processing,
        };
        let msg = err.to_string();
        assert!(msg.contains("79927398713"));
        assert!(msg.contains("PROCESSED"));
        assert!(msg.contains("PROCESSING"));

        let err = LoyaltyError::InsufficientFunds {
            required: 300,
            available: 200,
        };
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("200"));
    }
}

//! 密码哈希
//!
//! bcrypt 是 CPU 密集运算，放到阻塞线程池执行，避免占住异步工作线程

use crate::error::ApiError;

/// 生成 bcrypt 哈希，`cost` 为计算强度
pub async fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("密码哈希任务失败: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("密码哈希失败: {}", e)))
}

/// 校验明文密码与存储的哈希
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("密码校验任务失败: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("密码校验失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("s3cret-pass", 4).await.unwrap();

        assert!(hashed.starts_with("$2"));
        assert!(verify_password("s3cret-pass", &hashed).await.unwrap());
        assert!(!verify_password("wrong", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_internal_error() {
        let err = verify_password("anything", "not-a-bcrypt-hash")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}

//! 用户服务
//!
//! 凭证材料由调用方生成与校验，本服务只负责存取

use chrono::Utc;
use tracing::{info, instrument};

use crate::deadline::Deadline;
use crate::error::{LoyaltyError, Result};
use crate::models::{NewUser, User};
use crate::service::UnitOfWork;

/// 用户服务
#[derive(Clone)]
pub struct UserService {
    uow: UnitOfWork,
}

impl UserService {
    pub fn new(uow: UnitOfWork) -> Self {
        Self { uow }
    }

    /// 注册用户，初始余额为 0
    #[instrument(skip(self, password_hash, deadline))]
    pub async fn register(
        &self,
        login: &str,
        password_hash: &str,
        deadline: Deadline,
    ) -> Result<User> {
        let login = login.trim();
        if login.is_empty() {
            return Err(LoyaltyError::Validation("登录名不能为空".to_string()));
        }
        if password_hash.is_empty() {
            return Err(LoyaltyError::Validation("凭证不能为空".to_string()));
        }

        let new_user = NewUser {
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let user = self
            .uow
            .run("user_register", deadline, |mut tx| {
                let new_user = new_user.clone();
                async move {
                    let user = tx.insert_user(&new_user).await?;
                    Ok((tx, user))
                }
            })
            .await?;

        info!(user_id = user.id, "用户注册成功");
        Ok(user)
    }

    /// 按登录名查找用户，由调用方校验凭证
    pub async fn authenticate(&self, login: &str) -> Result<Option<User>> {
        self.uow.store().find_user_by_login(login.trim()).await
    }

    pub async fn get(&self, user_id: i64) -> Result<User> {
        self.uow
            .store()
            .find_user(user_id)
            .await?
            .ok_or(LoyaltyError::UserNotFound(user_id))
    }
}

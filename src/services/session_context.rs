//! 会话上下文
//!
//! 登录成功时创建，登出时销毁；显式传给客户端和控制器

use crate::models::{AuthResponse, Role};
use std::fmt::Display;

/// 当前登录用户的凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: String,
    role: Role,
    name: String,
}

impl SessionContext {
    pub fn new(token: impl Into<String>, role: Role, name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            role,
            name: name.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// 用户名，同时作为成绩和本地缓存的键
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<AuthResponse> for SessionContext {
    fn from(resp: AuthResponse) -> Self {
        Self::new(resp.token, resp.role, resp.name)
    }
}

impl Display for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[用户 {} 角色 {:?}]", self.name, self.role)
    }
}

use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// 登录成功后的返回 `{token, role, name}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub role: Role,
    pub name: String,
}

/// 接口错误体 `{message}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_roles() {
        let admin: AuthResponse =
            serde_json::from_str(r#"{"token":"t","role":"ADMIN","name":"root"}"#).unwrap();
        assert_eq!(admin.role, Role::Admin);

        let user: AuthResponse = serde_json::from_str(r#"{"token":"t","name":"alice"}"#).unwrap();
        assert_eq!(user.role, Role::User);
    }
}

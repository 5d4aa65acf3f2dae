/// 身份认证协作方
///
/// 本程序不自己签发或刷新令牌，只向 `IdentityProvider` 要一个 bearer token
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// 服务账号凭据
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(alias = "client_email")]
    pub identity: String,
    pub private_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 读取服务账号 JSON 文件
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取凭据文件: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("无法解析凭据文件: {}", path.display()))
    }
}

/// 令牌提供方
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn access_token(&self, credentials: &Credentials) -> Result<String, StoreError>;
}

/// 使用预先签发的访问令牌（例如 `gcloud auth print-access-token` 的输出）
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn access_token(&self, credentials: &Credentials) -> Result<String, StoreError> {
        self.token.clone().ok_or_else(|| {
            StoreError::Auth(format!(
                "没有可用于 {} 的访问令牌 (GOOGLE_ACCESS_TOKEN)",
                credentials.identity
            ))
        })
    }
}

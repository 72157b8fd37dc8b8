// セッショントークン取得
//
// /secured呼び出し時にAuthorizationヘッダーへ付与するIDトークンを提供する。
// トークンは1回の呼び出しの間だけ保持し、永続化しない。

use async_trait::async_trait;
use thiserror::Error;

/// 環境変数名: IDトークン
pub const ENV_ID_TOKEN: &str = "API_ID_TOKEN";

/// セッション取得のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionTokenError {
    #[error("Failed to fetch auth session: {0}")]
    Unavailable(String),
}

/// IDトークン取得用トレイト
#[async_trait]
pub trait SessionTokenProvider: Send + Sync {
    /// 現在のセッションのIDトークンを取得
    ///
    /// サインインしていない場合は`Ok(None)`を返す。
    async fn fetch_id_token(&self) -> Result<Option<String>, SessionTokenError>;
}

/// 起動時に与えられたトークンを返すプロバイダー
#[derive(Clone, Default)]
pub struct StaticSessionTokenProvider {
    token: Option<String>,
}

impl std::fmt::Debug for StaticSessionTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSessionTokenProvider")
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl StaticSessionTokenProvider {
    /// 空文字・空白のみのトークンは未設定として扱う
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// 環境変数`API_ID_TOKEN`から作成
    pub fn from_env() -> Self {
        Self::new(std::env::var(ENV_ID_TOKEN).ok())
    }
}

#[async_trait]
impl SessionTokenProvider for StaticSessionTokenProvider {
    async fn fetch_id_token(&self) -> Result<Option<String>, SessionTokenError> {
        Ok(self.token.clone())
    }
}

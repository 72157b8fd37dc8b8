// API GatewayへのHTTPクライアント
//
// API Testパネルから/helloと/securedを呼び出す。
// 呼び出しは自動再試行しない（失敗はそのまま呼び出し元に返す）。

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// API呼び出しのエラー型
///
/// `Display`の文字列がそのままパネルに表示される。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiCallError {
    /// 2xx以外のレスポンス
    #[error("API request failed with status {status}")]
    HttpStatus {
        /// HTTPステータスコード
        status: u16,
        /// レスポンス本文（ログ用）
        body: String,
    },

    /// 接続失敗などの通信エラー（メッセージをそのまま表示）
    #[error("{0}")]
    Transport(String),

    /// レスポンス本文がJSONでない
    #[error("Invalid JSON response: {0}")]
    InvalidBody(String),

    /// セッショントークンが取得できない
    #[error("No authentication token available")]
    MissingToken,

    /// HTTPクライアントの構築に失敗
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// REST API呼び出し用トレイト
///
/// 実際のHTTPクライアントとテスト用モックを差し替え可能にする。
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// GETリクエストを送り、JSONレスポンスを返す
    ///
    /// # 引数
    /// * `url` - 呼び出すURL
    /// * `id_token` - `Some`の場合は`Authorization`ヘッダーにそのまま付与
    async fn get_json(&self, url: &Url, id_token: Option<&str>) -> Result<Value, ApiCallError>;
}

/// reqwestによるApiClient実装
#[derive(Debug, Clone)]
pub struct ReqwestApiClient {
    client: Client,
}

impl ReqwestApiClient {
    /// 新しいクライアントを作成
    ///
    /// タイムアウトは設定しない（ライブラリのデフォルトに従う）。
    pub fn new() -> Result<Self, ApiCallError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiCallError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }

    /// 事前設定されたクライアントで作成
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    #[instrument(skip(self, id_token), fields(url = %url, authenticated = id_token.is_some()))]
    async fn get_json(&self, url: &Url, id_token: Option<&str>) -> Result<Value, ApiCallError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = id_token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "API呼び出しに失敗");
            ApiCallError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "APIがエラーレスポンスを返却");
            return Err(ApiCallError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json = response
            .json::<Value>()
            .await
            .map_err(|e| ApiCallError::InvalidBody(e.to_string()))?;

        debug!(status = %status, "API呼び出し成功");
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{extract::Query, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    /// API Gatewayの代わりに応答するスタブサーバーを起動
    async fn spawn_stub_gateway() -> SocketAddr {
        let app = Router::new()
            .route(
                "/dev/hello",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    Json(json!({ "path": "/hello", "method": "GET", "queryParams": query }))
                }),
            )
            .route(
                "/dev/secured",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("valid-token") => {
                            Json(json!({ "path": "/secured", "method": "GET" })).into_response()
                        }
                        _ => (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "message": "Unauthorized" })),
                        )
                            .into_response(),
                    }
                }),
            )
            .route("/dev/text", get(|| async { "plain text" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn url(addr: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{addr}/dev/{path}")).unwrap()
    }

    #[test]
    fn test_error_display() {
        let error = ApiCallError::HttpStatus {
            status: 401,
            body: "{\"message\":\"Unauthorized\"}".to_string(),
        };
        assert_eq!(error.to_string(), "API request failed with status 401");
        assert_eq!(
            ApiCallError::MissingToken.to_string(),
            "No authentication token available"
        );
        assert_eq!(
            ApiCallError::Transport("connection refused".to_string()).to_string(),
            "connection refused"
        );
    }

    #[tokio::test]
    async fn test_public_call_returns_json_with_query() {
        let addr = spawn_stub_gateway().await;
        let client = ReqwestApiClient::new().unwrap();

        let mut target = url(addr, "hello");
        target.set_query(Some("x=1"));
        let json = client.get_json(&target, None).await.unwrap();

        assert_eq!(json["path"], "/hello");
        assert_eq!(json["queryParams"], json!({ "x": "1" }));
    }

    #[tokio::test]
    async fn test_secured_call_sends_raw_token() {
        let addr = spawn_stub_gateway().await;
        let client = ReqwestApiClient::new().unwrap();

        let json = client
            .get_json(&url(addr, "secured"), Some("valid-token"))
            .await
            .unwrap();

        assert_eq!(json["path"], "/secured");
    }

    #[tokio::test]
    async fn test_secured_call_with_bad_token_is_http_error() {
        let addr = spawn_stub_gateway().await;
        let client = ReqwestApiClient::new().unwrap();

        let error = client
            .get_json(&url(addr, "secured"), Some("expired-token"))
            .await
            .unwrap_err();

        match error {
            ApiCallError::HttpStatus { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Unauthorized"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_body() {
        let addr = spawn_stub_gateway().await;
        let client = ReqwestApiClient::new().unwrap();

        let error = client.get_json(&url(addr, "text"), None).await.unwrap_err();

        assert!(matches!(error, ApiCallError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // ポートを確保してすぐ解放し、接続先が存在しない状態を作る
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ReqwestApiClient::new().unwrap();
        let error = client.get_json(&url(addr, "hello"), None).await.unwrap_err();

        match error {
            ApiCallError::Transport(message) => assert!(!message.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

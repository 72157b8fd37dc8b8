// エコーレスポンス
//
// リクエストハンドラーが返すJSON本文の構造を定義する。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// レスポンスに含める固定メッセージ
pub const ECHO_MESSAGE: &str = "Hello from Amplify API Gateway and Lambda!";

/// ハンドラーが受け取るリクエスト
///
/// API Gatewayプロキシイベントから必要な項目だけを取り出したもの。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EchoRequest {
    /// リクエストパス（例: "/hello"）
    pub path: String,
    /// HTTPメソッド
    pub method: String,
    /// クエリ文字列パラメータ（クエリがなければ`None`）
    pub query_params: Option<BTreeMap<String, String>>,
    /// リクエストヘッダー
    pub headers: BTreeMap<String, String>,
}

/// レスポンス本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoBody {
    pub message: String,
    /// ISO-8601形式のUTCタイムスタンプ
    pub timestamp: String,
    pub path: String,
    pub method: String,
    /// クエリがない場合は`null`
    #[serde(rename = "queryParams")]
    pub query_params: Option<BTreeMap<String, String>>,
}

impl EchoBody {
    pub fn new(request: &EchoRequest, timestamp: String) -> Self {
        Self {
            message: ECHO_MESSAGE.to_string(),
            timestamp,
            path: request.path.clone(),
            method: request.method.clone(),
            query_params: request.query_params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_echo_body_serializes_null_query_params() {
        let request = EchoRequest {
            path: "/hello".to_string(),
            method: "GET".to_string(),
            ..Default::default()
        };

        let body = EchoBody::new(&request, "2024-01-01T00:00:00.000Z".to_string());

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "message": "Hello from Amplify API Gateway and Lambda!",
                "timestamp": "2024-01-01T00:00:00.000Z",
                "path": "/hello",
                "method": "GET",
                "queryParams": null
            })
        );
    }
}

// エコーハンドラー
//
// API Gatewayプロキシ統合で受け取ったリクエストを、パスやメソッドによる分岐なしに
// 常にHTTP 200とエコーJSONで返す。状態を持たない。

use crate::domain::{EchoBody, EchoRequest};
use chrono::{DateTime, SecondsFormat, Utc};
use lambda_http::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Request, RequestExt, Response};
use std::collections::BTreeMap;
use tracing::info;

/// エコーハンドラー
pub struct EchoHandler;

impl EchoHandler {
    /// 現在時刻でリクエストを処理
    pub fn handle(request: &EchoRequest) -> Result<Response<Body>, serde_json::Error> {
        Self::handle_at(request, Utc::now())
    }

    /// 指定時刻でリクエストを処理
    ///
    /// 受信イベントは診断用にログ出力する。
    ///
    /// # Returns
    /// CORSヘッダー付きのHTTP 200レスポンス
    pub fn handle_at(
        request: &EchoRequest,
        now: DateTime<Utc>,
    ) -> Result<Response<Body>, serde_json::Error> {
        info!(
            path = %request.path,
            method = %request.method,
            query_params = ?request.query_params,
            headers = ?request.headers,
            "event"
        );

        let body = EchoBody::new(request, Self::timestamp(now));
        let json = serde_json::to_string(&body)?;

        let mut response = Response::new(Body::Text(json));
        *response.status_mut() = StatusCode::OK;
        *response.headers_mut() = Self::build_cors_headers();

        Ok(response)
    }

    /// ISO-8601形式（ミリ秒、`Z`サフィックス）のタイムスタンプ
    pub fn timestamp(now: DateTime<Utc>) -> String {
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// CORSヘッダーを生成
    ///
    /// - Access-Control-Allow-Origin: *
    /// - Access-Control-Allow-Headers: *
    pub fn build_cors_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        headers
    }
}

/// lambda_httpのリクエストからEchoRequestを作成
///
/// クエリ文字列がない場合は`query_params`を`None`にする（プロキシイベントの`null`に相当）。
/// パスはステージ名を含まない元のパスを優先する。
pub fn to_echo_request(request: &Request) -> EchoRequest {
    let query = request.query_string_parameters();
    let query_params = if query.is_empty() {
        None
    } else {
        Some(
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<String, String>>(),
        )
    };

    let headers = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let path = match request.raw_http_path() {
        "" => request.uri().path(),
        raw => raw,
    };

    EchoRequest {
        path: path.to_string(),
        method: request.method().as_str().to_string(),
        query_params,
        headers,
    }
}

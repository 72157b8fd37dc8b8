/// REST API統合Lambdaエントリポイント
///
/// API Gatewayのプロキシ統合から呼び出され、パスやメソッドに関わらず
/// リクエスト内容をエコーしたJSONをHTTP 200で返す。
use backend::application::{to_echo_request, EchoHandler};
use backend::infrastructure::init_logging;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    info!("API Lambda関数を初期化");

    // Lambda関数を実行
    run(service_fn(handler)).await
}

/// HTTPリクエストハンドラー
///
/// # Returns
/// エコーJSONとCORSヘッダーを持つHTTP 200レスポンス
async fn handler(request: Request) -> Result<Response<Body>, Error> {
    let echo_request = to_echo_request(&request);
    let response = EchoHandler::handle(&echo_request)?;
    Ok(response)
}

// API Testパネル
//
// デプロイ出力から/helloと/securedのURLを組み立て、呼び出し結果を共有表示スロットに反映する。
// 2つの呼び出しは独立しており、同時に実行できる。

use crate::domain::{
    AmplifyOutputs, ApiOutputRecord, ApiRoute, PanelState, RouteUrlError, API_NAME, HELLO_PATH,
    SECURED_PATH,
};
use crate::infrastructure::{ApiCallError, ApiClient, SessionTokenProvider};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// パネル初期化のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PanelError {
    /// 出力ファイルにAPIのエントリーがない
    #[error("API '{0}' not found in outputs")]
    MissingApi(String),

    #[error(transparent)]
    Route(#[from] RouteUrlError),
}

/// API Testパネル
pub struct ApiTestPanel<C, S> {
    client: C,
    session: S,
    public_url: Url,
    secured_url: Url,
    state: Mutex<PanelState>,
}

impl<C, S> ApiTestPanel<C, S>
where
    C: ApiClient,
    S: SessionTokenProvider,
{
    /// 出力レコードからパネルを作成
    pub fn new(client: C, session: S, record: &ApiOutputRecord) -> Result<Self, PanelError> {
        let public_url = record.route_url(HELLO_PATH)?;
        let secured_url = record.route_url(SECURED_PATH)?;

        info!(
            public_url = %public_url,
            secured_url = %secured_url,
            "API URLを構築"
        );

        Ok(Self {
            client,
            session,
            public_url,
            secured_url,
            state: Mutex::new(PanelState::new()),
        })
    }

    /// amplify_outputs.jsonの`custom.API.myRestApi`からパネルを作成
    pub fn from_outputs(client: C, session: S, outputs: &AmplifyOutputs) -> Result<Self, PanelError> {
        let record = outputs
            .api(API_NAME)
            .ok_or_else(|| PanelError::MissingApi(API_NAME.to_string()))?;
        Self::new(client, session, record)
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    pub fn secured_url(&self) -> &Url {
        &self.secured_url
    }

    /// /helloを認証なしで呼び出す
    pub async fn call_public(&self) {
        if !self.begin(ApiRoute::Public) {
            return;
        }

        let outcome = self
            .client
            .get_json(&self.public_url, None)
            .await
            .map_err(|e| e.to_string());

        self.complete(ApiRoute::Public, outcome);
    }

    /// /securedをIDトークン付きで呼び出す
    ///
    /// トークンが取得できない場合はネットワーク呼び出しを行わずにエラーを表示する。
    pub async fn call_secured(&self) {
        if !self.begin(ApiRoute::Secured) {
            return;
        }

        let token = match self.session.fetch_id_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("IDトークンが取得できないため/securedを呼び出さない");
                self.complete(ApiRoute::Secured, Err(ApiCallError::MissingToken.to_string()));
                return;
            }
            Err(e) => {
                warn!(error = %e, "セッションの取得に失敗");
                self.complete(ApiRoute::Secured, Err(e.to_string()));
                return;
            }
        };

        let outcome = self
            .client
            .get_json(&self.secured_url, Some(&token))
            .await
            .map_err(|e| e.to_string());

        self.complete(ApiRoute::Secured, outcome);
    }

    /// 現在の状態のコピー
    pub fn snapshot(&self) -> PanelState {
        self.lock().clone()
    }

    fn begin(&self, route: ApiRoute) -> bool {
        let started = self.lock().begin(route);
        if !started {
            debug!(route = ?route, "呼び出し中のため無視");
        }
        started
    }

    fn complete(&self, route: ApiRoute, outcome: Result<serde_json::Value, String>) {
        match &outcome {
            Ok(_) => info!(route = ?route, "API呼び出し成功"),
            Err(message) => warn!(route = ?route, error = %message, "API呼び出し失敗"),
        }
        self.lock().complete(route, outcome);
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

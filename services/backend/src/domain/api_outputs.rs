// デプロイ出力（amplify_outputs.json）
//
// デプロイ完了時に書き出され、クライアントが起動時に読み込む静的な成果物。
// 形式: { "version": "1.3", "custom": { "API": { <apiName>: { endpoint, region, apiName } } } }

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// 出力ファイルのスキーマバージョン
pub const OUTPUTS_VERSION: &str = "1.3";

/// ルートURLの組み立てエラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteUrlError {
    #[error("Invalid endpoint URL '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// REST API 1件分の出力
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOutputRecord {
    /// ステージのベースURL（末尾スラッシュ付き）
    pub endpoint: String,
    /// デプロイ先リージョン
    pub region: String,
    /// REST API名
    #[serde(rename = "apiName")]
    pub api_name: String,
}

impl ApiOutputRecord {
    /// デプロイ済みREST APIの情報から出力を作成
    ///
    /// endpointは`https://<rest-api-id>.execute-api.<region>.amazonaws.com/<stage>/`
    pub fn for_deployment(
        api_name: impl Into<String>,
        rest_api_id: &str,
        region: impl Into<String>,
        stage: &str,
    ) -> Self {
        let region = region.into();
        Self {
            endpoint: format!(
                "https://{}.execute-api.{}.amazonaws.com/{}/",
                rest_api_id, region, stage
            ),
            region,
            api_name: api_name.into(),
        }
    }

    /// エンドポイント配下のルートURLを構築
    ///
    /// endpointの末尾スラッシュの有無に関わらず`<endpoint>/<path_part>`になる。
    pub fn route_url(&self, path_part: &str) -> Result<Url, RouteUrlError> {
        let raw = format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path_part.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| RouteUrlError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }
}

/// `custom`セクション
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOutputs {
    #[serde(rename = "API", default, skip_serializing_if = "Option::is_none")]
    pub api: Option<BTreeMap<String, ApiOutputRecord>>,
}

/// amplify_outputs.json全体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmplifyOutputs {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomOutputs>,
}

impl Default for AmplifyOutputs {
    fn default() -> Self {
        Self {
            version: OUTPUTS_VERSION.to_string(),
            custom: None,
        }
    }
}

impl AmplifyOutputs {
    /// REST APIの出力を追加
    ///
    /// キーは常にレコードの`api_name`になる。
    pub fn with_api(mut self, record: ApiOutputRecord) -> Self {
        self.custom
            .get_or_insert_with(CustomOutputs::default)
            .api
            .get_or_insert_with(BTreeMap::new)
            .insert(record.api_name.clone(), record);
        self
    }

    /// API名で出力を検索
    pub fn api(&self, api_name: &str) -> Option<&ApiOutputRecord> {
        self.custom.as_ref()?.api.as_ref()?.get(api_name)
    }
}

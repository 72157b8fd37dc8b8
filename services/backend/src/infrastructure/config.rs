// バックエンド参照設定
//
// 関数コードの格納場所、実行ロール、Cognitoユーザープール、Identity Poolロールなど、
// このテンプレートの外で管理されるリソースへの参照を環境変数から読み込む。

use crate::domain::{FunctionCode, IdentityPoolRoles};

/// 環境変数名: 関数コードのS3バケット
pub const ENV_FUNCTION_CODE_BUCKET: &str = "API_FUNCTION_CODE_BUCKET";
/// 環境変数名: 関数コードのS3キー
pub const ENV_FUNCTION_CODE_KEY: &str = "API_FUNCTION_CODE_KEY";
/// 環境変数名: 実行ロールARN
pub const ENV_FUNCTION_ROLE_ARN: &str = "API_FUNCTION_ROLE_ARN";
/// 環境変数名: 実行ロール名
pub const ENV_FUNCTION_ROLE_NAME: &str = "API_FUNCTION_ROLE_NAME";
/// 環境変数名: ユーザープールARN
pub const ENV_USER_POOL_ARN: &str = "USER_POOL_ARN";
/// 環境変数名: 認証済みロール名
pub const ENV_AUTH_ROLE_NAME: &str = "AUTH_ROLE_NAME";
/// 環境変数名: 未認証ロール名
pub const ENV_UNAUTH_ROLE_NAME: &str = "UNAUTH_ROLE_NAME";

const DEFAULT_FUNCTION_CODE_BUCKET: &str = "api-function-artifacts";
const DEFAULT_FUNCTION_CODE_KEY: &str = "api_function/bootstrap.zip";
const DEFAULT_FUNCTION_ROLE_ARN: &str = "arn:aws:iam::000000000000:role/api-function-role";
const DEFAULT_FUNCTION_ROLE_NAME: &str = "api-function-role";
const DEFAULT_USER_POOL_ARN: &str =
    "arn:aws:cognito-idp:us-west-2:000000000000:userpool/us-west-2_xxxxxxxxx";
const DEFAULT_AUTH_ROLE_NAME: &str = "amplify-auth-authenticated-role";
const DEFAULT_UNAUTH_ROLE_NAME: &str = "amplify-auth-unauthenticated-role";

/// 外部リソースへの参照
///
/// 未設定・空文字の環境変数はダミー値で補完する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReferences {
    pub function_code: FunctionCode,
    pub function_role_arn: String,
    pub function_role_name: String,
    pub user_pool_arn: String,
    pub identity_pool_roles: IdentityPoolRoles,
}

impl BackendReferences {
    /// 環境変数から読み込み
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のルックアップ関数から読み込み
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, fallback: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            function_code: FunctionCode {
                s3_bucket: get(ENV_FUNCTION_CODE_BUCKET, DEFAULT_FUNCTION_CODE_BUCKET),
                s3_key: get(ENV_FUNCTION_CODE_KEY, DEFAULT_FUNCTION_CODE_KEY),
            },
            function_role_arn: get(ENV_FUNCTION_ROLE_ARN, DEFAULT_FUNCTION_ROLE_ARN),
            function_role_name: get(ENV_FUNCTION_ROLE_NAME, DEFAULT_FUNCTION_ROLE_NAME),
            user_pool_arn: get(ENV_USER_POOL_ARN, DEFAULT_USER_POOL_ARN),
            identity_pool_roles: IdentityPoolRoles {
                authenticated: get(ENV_AUTH_ROLE_NAME, DEFAULT_AUTH_ROLE_NAME),
                unauthenticated: get(ENV_UNAUTH_ROLE_NAME, DEFAULT_UNAUTH_ROLE_NAME),
            },
        }
    }
}

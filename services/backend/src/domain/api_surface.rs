// REST API定義
//
// API Gateway REST API（/hello: 認可なし、/secured: Cognitoオーソライザー）と、
// Identity Poolロールに付与するexecute-api:Invokeポリシーを組み立てる。

use super::cfn::{CfnResource, CfnValue};
use super::iam_policy::{PolicyDocument, PolicyStatement};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// REST API名（amplify_outputs.jsonのキーにもなる）
pub const API_NAME: &str = "myRestApi";

/// デプロイステージ名
pub const STAGE_NAME: &str = "dev";

/// 公開エンドポイントのパス
pub const HELLO_PATH: &str = "hello";

/// Cognito認可付きエンドポイントのパス
pub const SECURED_PATH: &str = "secured";

/// REST APIの論理ID
pub const REST_API_LOGICAL_ID: &str = "RestApi";

/// Cognitoオーソライザーの論理ID
pub const AUTHORIZER_LOGICAL_ID: &str = "CognitoAuth";

/// Invokeポリシーの論理ID
pub const INVOKE_POLICY_LOGICAL_ID: &str = "RestApiPolicy";

/// Authorizationヘッダーをトークンの取得元とする
pub const AUTHORIZATION_IDENTITY_SOURCE: &str = "method.request.header.Authorization";

/// CORSで許可する全メソッド
pub const ALL_METHODS: &[&str] = &["OPTIONS", "GET", "PUT", "POST", "DELETE", "PATCH", "HEAD"];

/// CORSで許可するデフォルトヘッダー
pub const DEFAULT_HEADERS: &[&str] = &[
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
    "X-Amz-User-Agent",
];

/// Lambdaプロキシ統合のURIテンプレート
const LAMBDA_INVOCATION_URI: &str =
    "arn:${AWS::Partition}:apigateway:${AWS::Region}:lambda:path/2015-03-31/functions/${FunctionArn}/invocations";

/// メソッドの認可種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationType {
    /// 認可なし（公開）
    None,
    /// Cognitoユーザープールのトークンで認可
    CognitoUserPools,
}

impl AuthorizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::CognitoUserPools => "COGNITO_USER_POOLS",
        }
    }
}

/// CORSプリフライト設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsOptions {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl CorsOptions {
    /// 全オリジン・全メソッド・デフォルトヘッダーを許可
    pub fn permissive() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: ALL_METHODS.iter().map(|s| s.to_string()).collect(),
            allow_headers: DEFAULT_HEADERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// OPTIONSメソッドの統合レスポンスヘッダー
    fn response_parameters(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert(
            "method.response.header.Access-Control-Allow-Headers".to_string(),
            Value::String(format!("'{}'", self.allow_headers.join(","))),
        );
        params.insert(
            "method.response.header.Access-Control-Allow-Origin".to_string(),
            Value::String(format!("'{}'", self.allow_origins.join(","))),
        );
        params.insert(
            "method.response.header.Access-Control-Allow-Methods".to_string(),
            Value::String(format!("'{}'", self.allow_methods.join(","))),
        );
        params
    }
}

/// Cognitoユーザープールオーソライザー
///
/// 1つのユーザープールにのみ紐付く。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoAuthorizer {
    pub logical_id: String,
    pub user_pool_arn: String,
}

impl CognitoAuthorizer {
    pub fn new(user_pool_arn: impl Into<String>) -> Self {
        Self {
            logical_id: AUTHORIZER_LOGICAL_ID.to_string(),
            user_pool_arn: user_pool_arn.into(),
        }
    }
}

/// リソースに追加されたメソッド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiMethod {
    pub http_method: String,
    pub authorization: AuthorizationType,
}

/// REST APIのリソース（ルート直下のパス）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResource {
    pub path_part: String,
    /// リソース単位の認可設定（配下の全メソッドに適用）
    pub default_authorization: Option<AuthorizationType>,
    pub methods: Vec<ApiMethod>,
}

impl ApiResource {
    /// メソッドを追加
    ///
    /// `authorization`が`None`の場合はリソース単位の設定、それもなければ認可なし。
    pub fn add_method(
        &mut self,
        http_method: impl Into<String>,
        authorization: Option<AuthorizationType>,
    ) -> &mut Self {
        let authorization = authorization
            .or(self.default_authorization)
            .unwrap_or(AuthorizationType::None);
        self.methods.push(ApiMethod {
            http_method: http_method.into(),
            authorization,
        });
        self
    }

    /// `/hello`形式のパス
    pub fn path(&self) -> String {
        format!("/{}", self.path_part)
    }

    fn logical_id(&self) -> String {
        format!("{}{}", REST_API_LOGICAL_ID, pascal_case(&self.path_part))
    }
}

/// REST API定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApi {
    name: String,
    stage: String,
    cors: CorsOptions,
    integration_function_arn: CfnValue,
    authorizer: Option<CognitoAuthorizer>,
    resources: Vec<ApiResource>,
}

impl RestApi {
    /// 新しいREST APIを作成
    ///
    /// # Arguments
    /// * `name` - REST API名
    /// * `stage` - デプロイステージ名
    /// * `cors` - 全リソースに適用するCORSプリフライト設定
    /// * `integration_function_arn` - 全メソッド共通のプロキシ統合先Lambda ARN
    pub fn new(
        name: impl Into<String>,
        stage: impl Into<String>,
        cors: CorsOptions,
        integration_function_arn: CfnValue,
    ) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            cors,
            integration_function_arn,
            authorizer: None,
            resources: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn resources(&self) -> &[ApiResource] {
        &self.resources
    }

    pub fn authorizer(&self) -> Option<&CognitoAuthorizer> {
        self.authorizer.as_ref()
    }

    /// オーソライザーを設定
    pub fn set_authorizer(&mut self, authorizer: CognitoAuthorizer) {
        self.authorizer = Some(authorizer);
    }

    /// ルート直下にリソースを追加
    pub fn add_resource(
        &mut self,
        path_part: impl Into<String>,
        default_authorization: Option<AuthorizationType>,
    ) -> &mut ApiResource {
        self.resources.push(ApiResource {
            path_part: path_part.into(),
            default_authorization,
            methods: Vec::new(),
        });
        let last = self.resources.len() - 1;
        &mut self.resources[last]
    }

    /// execute-api ARNを構築
    ///
    /// 形式: `arn:<partition>:execute-api:<region>:<account>:<api-id>/<stage>/<method><path>`
    pub fn arn_for_execute_api(&self, method: &str, path: &str, stage: &str) -> CfnValue {
        CfnValue::sub(format!(
            "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}/{}/{}{}",
            REST_API_LOGICAL_ID, stage, method, path
        ))
    }

    /// ステージのベースURL（末尾スラッシュ付き）
    pub fn url(&self) -> CfnValue {
        CfnValue::sub(format!(
            "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/{}/",
            REST_API_LOGICAL_ID, self.stage
        ))
    }

    /// テンプレートリソースに変換
    pub fn to_resources(&self) -> Vec<(String, CfnResource)> {
        let mut resources = Vec::new();
        let mut method_ids = Vec::new();
        let rest_api_id = CfnValue::reference(REST_API_LOGICAL_ID).to_json();

        resources.push((
            REST_API_LOGICAL_ID.to_string(),
            CfnResource::new("AWS::ApiGateway::RestApi", json!({ "Name": self.name })),
        ));

        // ルートのCORSプリフライト
        let root_id = CfnValue::get_att(REST_API_LOGICAL_ID, "RootResourceId").to_json();
        let root_options_id = format!("{}OPTIONS", REST_API_LOGICAL_ID);
        resources.push((root_options_id.clone(), self.options_method(root_id)));
        method_ids.push(root_options_id);

        if let Some(authorizer) = &self.authorizer {
            resources.push((
                authorizer.logical_id.clone(),
                CfnResource::new(
                    "AWS::ApiGateway::Authorizer",
                    json!({
                        "Name": authorizer.logical_id,
                        "Type": "COGNITO_USER_POOLS",
                        "IdentitySource": AUTHORIZATION_IDENTITY_SOURCE,
                        "ProviderARNs": [authorizer.user_pool_arn],
                        "RestApiId": rest_api_id,
                    }),
                ),
            ));
        }

        for resource in &self.resources {
            let resource_id = resource.logical_id();
            resources.push((
                resource_id.clone(),
                CfnResource::new(
                    "AWS::ApiGateway::Resource",
                    json!({
                        "ParentId": CfnValue::get_att(REST_API_LOGICAL_ID, "RootResourceId"),
                        "PathPart": resource.path_part,
                        "RestApiId": rest_api_id,
                    }),
                ),
            ));

            let resource_ref = CfnValue::reference(resource_id.as_str()).to_json();
            let options_id = format!("{}OPTIONS", resource_id);
            resources.push((options_id.clone(), self.options_method(resource_ref.clone())));
            method_ids.push(options_id);

            for method in &resource.methods {
                let method_id = format!("{}{}", resource_id, method.http_method);
                resources.push((
                    method_id.clone(),
                    self.proxy_method(method, resource_ref.clone()),
                ));
                resources.push((
                    format!("{}Permission", method_id),
                    self.invoke_permission(&method.http_method, &resource.path()),
                ));
                method_ids.push(method_id);
            }
        }

        let deployment_id = format!("{}Deployment", REST_API_LOGICAL_ID);
        resources.push((
            deployment_id.clone(),
            CfnResource::new(
                "AWS::ApiGateway::Deployment",
                json!({
                    "RestApiId": rest_api_id,
                    "Description": format!("{} deployment", self.name),
                }),
            )
            .depends_on(method_ids),
        ));

        resources.push((
            format!("{}Stage", REST_API_LOGICAL_ID),
            CfnResource::new(
                "AWS::ApiGateway::Stage",
                json!({
                    "RestApiId": rest_api_id,
                    "DeploymentId": CfnValue::reference(deployment_id.as_str()),
                    "StageName": self.stage,
                }),
            ),
        ));

        resources
    }

    /// Lambdaプロキシ統合メソッド
    fn proxy_method(&self, method: &ApiMethod, resource_ref: Value) -> CfnResource {
        let mut vars = BTreeMap::new();
        vars.insert("FunctionArn".to_string(), self.integration_function_arn.clone());

        let mut properties = json!({
            "HttpMethod": method.http_method,
            "ResourceId": resource_ref,
            "RestApiId": CfnValue::reference(REST_API_LOGICAL_ID),
            "AuthorizationType": method.authorization.as_str(),
            "Integration": {
                "Type": "AWS_PROXY",
                "IntegrationHttpMethod": "POST",
                "Uri": CfnValue::SubWith(LAMBDA_INVOCATION_URI.to_string(), vars),
            },
        });

        if method.authorization == AuthorizationType::CognitoUserPools {
            if let Some(authorizer) = &self.authorizer {
                properties["AuthorizerId"] =
                    CfnValue::reference(authorizer.logical_id.as_str()).to_json();
            }
        }

        CfnResource::new("AWS::ApiGateway::Method", properties)
    }

    /// CORSプリフライト用のOPTIONSメソッド（MOCK統合）
    fn options_method(&self, resource_ref: Value) -> CfnResource {
        let response_parameters = self.cors.response_parameters();
        let method_response_parameters: Map<String, Value> = response_parameters
            .keys()
            .map(|k| (k.clone(), Value::Bool(true)))
            .collect();

        CfnResource::new(
            "AWS::ApiGateway::Method",
            json!({
                "HttpMethod": "OPTIONS",
                "ResourceId": resource_ref,
                "RestApiId": CfnValue::reference(REST_API_LOGICAL_ID),
                "AuthorizationType": AuthorizationType::None.as_str(),
                "Integration": {
                    "Type": "MOCK",
                    "RequestTemplates": { "application/json": "{ statusCode: 200 }" },
                    "IntegrationResponses": [{
                        "StatusCode": "204",
                        "ResponseParameters": response_parameters,
                    }],
                },
                "MethodResponses": [{
                    "StatusCode": "204",
                    "ResponseParameters": method_response_parameters,
                }],
            }),
        )
    }

    /// API GatewayからLambdaを呼び出す権限
    fn invoke_permission(&self, http_method: &str, path: &str) -> CfnResource {
        CfnResource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": self.integration_function_arn,
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": self.arn_for_execute_api(http_method, path, "*"),
            }),
        )
    }
}

/// Identity Poolロールに付与するexecute-api:Invokeポリシー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokePolicy {
    document: PolicyDocument,
    roles: Vec<String>,
}

impl InvokePolicy {
    /// 指定したパスのみを対象とするポリシーを作成
    ///
    /// メソッドはワイルドカード、ステージはAPIのステージ。
    /// API側に他のルートが追加されても対象は増えない。
    pub fn for_paths(api: &RestApi, paths: &[&str]) -> Self {
        let resources: Vec<CfnValue> = paths
            .iter()
            .map(|path| api.arn_for_execute_api("*", path, api.stage()))
            .collect();

        Self {
            document: PolicyDocument::new(vec![PolicyStatement::allow(
                ["execute-api:Invoke"],
                resources,
            )]),
            roles: Vec::new(),
        }
    }

    /// ロールにインラインポリシーとしてアタッチ
    pub fn attach_to_role(&mut self, role_name: impl Into<String>) {
        self.roles.push(role_name.into());
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn to_resource(&self) -> (String, CfnResource) {
        (
            INVOKE_POLICY_LOGICAL_ID.to_string(),
            CfnResource::new(
                "AWS::IAM::Policy",
                json!({
                    "PolicyName": INVOKE_POLICY_LOGICAL_ID,
                    "PolicyDocument": self.document,
                    "Roles": self.roles,
                }),
            ),
        )
    }
}

/// Identity Poolのロール名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPoolRoles {
    pub authenticated: String,
    pub unauthenticated: String,
}

/// API全体（REST API + Invokeポリシー）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSurface {
    pub rest_api: RestApi,
    pub invoke_policy: InvokePolicy,
}

impl ApiSurface {
    /// /helloと/securedを持つREST APIを組み立てる
    ///
    /// # Arguments
    /// * `function_arn` - 両メソッド共通の統合先Lambda ARN
    /// * `user_pool_arn` - /securedのオーソライザーに紐付けるユーザープールARN
    /// * `roles` - Invokeポリシーをアタッチするロール
    pub fn build(function_arn: CfnValue, user_pool_arn: &str, roles: &IdentityPoolRoles) -> Self {
        let mut rest_api = RestApi::new(
            API_NAME,
            STAGE_NAME,
            CorsOptions::permissive(),
            function_arn,
        );

        rest_api
            .add_resource(HELLO_PATH, None)
            .add_method("GET", Some(AuthorizationType::None));

        rest_api.set_authorizer(CognitoAuthorizer::new(user_pool_arn));
        rest_api
            .add_resource(SECURED_PATH, None)
            .add_method("GET", Some(AuthorizationType::CognitoUserPools));

        let hello = format!("/{}", HELLO_PATH);
        let secured = format!("/{}", SECURED_PATH);
        let mut invoke_policy = InvokePolicy::for_paths(&rest_api, &[hello.as_str(), secured.as_str()]);

        // /securedの認可はオーソライザーが行う。未認証ロールへの付与はIAM上の許可のみ
        invoke_policy.attach_to_role(roles.authenticated.clone());
        invoke_policy.attach_to_role(roles.unauthenticated.clone());

        Self {
            rest_api,
            invoke_policy,
        }
    }
}

/// `hello` -> `Hello`
fn pascal_case(path_part: &str) -> String {
    path_part
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

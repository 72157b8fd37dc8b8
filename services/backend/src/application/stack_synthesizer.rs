// スタック合成
//
// 解決済みネットワーク設定とバックエンド参照から、2つのCloudFormationテンプレートを組み立てる。
// - api-function-vpc-stack: Lambda関数、VPC接続、実行ロールへの追加ポリシー
// - api-stack: REST API、オーソライザー、Invokeポリシー、出力
//
// 組み立ては決まった順序で逐次に行う。リソース間の依存解決はCloudFormationに任せる。

use crate::domain::{
    AmplifyOutputs, ApiOutputRecord, ApiSurface, CfnExport, CfnOutput, CfnTemplate, CfnValue,
    FunctionDefinition, NetworkAttachment, ResolvedNetworkConfig, API_NAME, STAGE_NAME,
};
use crate::infrastructure::{write_outputs, write_template, ArtifactError, BackendReferences};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// 関数スタック名
pub const FUNCTION_STACK_NAME: &str = "api-function-vpc-stack";

/// APIスタック名
pub const API_STACK_NAME: &str = "api-stack";

/// 関数ARNのエクスポート名
pub const FUNCTION_ARN_EXPORT: &str = "api-function-vpc-stack-ApiFunctionArn";

/// APIスタックの出力名
pub const OUTPUT_API_ENDPOINT: &str = "ApiEndpoint";
pub const OUTPUT_API_REGION: &str = "ApiRegion";
pub const OUTPUT_API_NAME: &str = "ApiName";

/// 合成・出力のエラー型
#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// デプロイ情報の必須値が空
    #[error("{0} must not be empty")]
    MissingDeploymentValue(&'static str),
}

/// 合成結果
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedBackend {
    pub function_stack: CfnTemplate,
    pub api_stack: CfnTemplate,
}

impl SynthesizedBackend {
    /// (スタック名, テンプレート)の組を列挙
    pub fn stacks(&self) -> [(&'static str, &CfnTemplate); 2] {
        [
            (FUNCTION_STACK_NAME, &self.function_stack),
            (API_STACK_NAME, &self.api_stack),
        ]
    }
}

/// スタック合成器
///
/// 設定は起動時に一度だけ構築し、参照で受け取る。
pub struct StackSynthesizer<'a> {
    network: &'a ResolvedNetworkConfig,
    references: &'a BackendReferences,
}

impl<'a> StackSynthesizer<'a> {
    pub fn new(network: &'a ResolvedNetworkConfig, references: &'a BackendReferences) -> Self {
        Self {
            network,
            references,
        }
    }

    /// 両スタックを合成
    pub fn synthesize(&self) -> SynthesizedBackend {
        let function_stack = self.function_stack();
        let api_stack = self.api_stack();

        info!(
            function_stack_resources = function_stack.resources.len(),
            api_stack_resources = api_stack.resources.len(),
            "スタックを合成"
        );

        SynthesizedBackend {
            function_stack,
            api_stack,
        }
    }

    /// Lambda関数とVPC接続のスタック
    pub fn function_stack(&self) -> CfnTemplate {
        let mut function = FunctionDefinition::new(
            self.references.function_code.clone(),
            self.references.function_role_arn.clone(),
            self.references.function_role_name.clone(),
        );

        let attachment = NetworkAttachment::from_config(self.network);
        attachment.attach_to(&mut function);

        let mut template = CfnTemplate::new("API function attached to an existing VPC");
        for (logical_id, resource) in function.to_resources() {
            template.add_resource(logical_id, resource);
        }

        template.add_output(
            "ApiFunctionArn",
            CfnOutput {
                value: CfnValue::get_att(function.logical_id(), "Arn"),
                description: Some("ARN of the API integration function".to_string()),
                export: Some(CfnExport {
                    name: FUNCTION_ARN_EXPORT.to_string(),
                }),
            },
        );

        template
    }

    /// REST APIのスタック
    pub fn api_stack(&self) -> CfnTemplate {
        let surface = ApiSurface::build(
            CfnValue::ImportValue(FUNCTION_ARN_EXPORT.to_string()),
            &self.references.user_pool_arn,
            &self.references.identity_pool_roles,
        );

        let mut template = CfnTemplate::new("REST API with public and Cognito-secured routes");
        for (logical_id, resource) in surface.rest_api.to_resources() {
            template.add_resource(logical_id, resource);
        }
        let (policy_id, policy) = surface.invoke_policy.to_resource();
        template.add_resource(policy_id, policy);

        template.add_output(
            OUTPUT_API_ENDPOINT,
            CfnOutput {
                value: surface.rest_api.url(),
                description: Some("Base URL of the deployed stage".to_string()),
                export: None,
            },
        );
        template.add_output(
            OUTPUT_API_REGION,
            CfnOutput {
                value: CfnValue::reference("AWS::Region"),
                description: None,
                export: None,
            },
        );
        template.add_output(
            OUTPUT_API_NAME,
            CfnOutput {
                value: CfnValue::literal(surface.rest_api.name()),
                description: None,
                export: None,
            },
        );

        template
    }
}

/// 両スタックのテンプレートを`out_dir`に書き出す
pub fn write_stacks(backend: &SynthesizedBackend, out_dir: &Path) -> Result<Vec<PathBuf>, SynthError> {
    let mut paths = Vec::new();
    for (stack_name, template) in backend.stacks() {
        paths.push(write_template(out_dir, stack_name, template)?);
    }
    Ok(paths)
}

/// デプロイ済みREST APIの出力レコードを作成
///
/// キーとapiNameはREST API名と一致する。
pub fn deployment_output_record(api_name: &str, rest_api_id: &str, region: &str) -> ApiOutputRecord {
    ApiOutputRecord::for_deployment(api_name, rest_api_id, region, STAGE_NAME)
}

/// デプロイ結果からamplify_outputs.jsonを書き出す
pub fn write_deployment_outputs(
    path: &Path,
    rest_api_id: &str,
    region: &str,
) -> Result<AmplifyOutputs, SynthError> {
    if rest_api_id.trim().is_empty() {
        return Err(SynthError::MissingDeploymentValue("rest-api-id"));
    }
    if region.trim().is_empty() {
        return Err(SynthError::MissingDeploymentValue("region"));
    }

    let outputs = AmplifyOutputs::default().with_api(deployment_output_record(
        API_NAME,
        rest_api_id.trim(),
        region.trim(),
    ));
    write_outputs(path, &outputs)?;
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::load_outputs;
    use serde_json::json;
    use tempfile::TempDir;

    fn synthesize(network: &ResolvedNetworkConfig) -> SynthesizedBackend {
        let references = BackendReferences::from_lookup(|_| None);
        StackSynthesizer::new(network, &references).synthesize()
    }

    #[test]
    fn test_function_stack_uses_fallback_subnets_when_unset() {
        let network = ResolvedNetworkConfig::from_lookup(|_| None);
        let backend = synthesize(&network);

        let function = backend.function_stack.resource("ApiFunction").unwrap();
        assert_eq!(
            function.properties["VpcConfig"]["SubnetIds"],
            json!(["subnet-xxxxxxxxxxxxxxxx", "subnet-yyyyyyyyyyyyyyyy"])
        );
        assert_eq!(
            function.properties["VpcConfig"]["SecurityGroupIds"],
            json!(["sg-xxxxxxxx"])
        );
    }

    #[test]
    fn test_function_stack_creates_no_network_resources() {
        let backend = synthesize(&ResolvedNetworkConfig::default());

        assert!(backend
            .function_stack
            .resources
            .values()
            .all(|r| !r.resource_type.starts_with("AWS::EC2::")));
    }

    #[test]
    fn test_function_role_policy_has_five_eni_actions() {
        let backend = synthesize(&ResolvedNetworkConfig::default());

        let policy = backend
            .function_stack
            .resource("ApiFunctionRoleDefaultPolicy")
            .unwrap();
        let statement = &policy.properties["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Action"].as_array().unwrap().len(), 5);
        assert_eq!(statement["Resource"], json!(["*"]));
        assert_eq!(policy.properties["Roles"], json!(["api-function-role"]));
    }

    #[test]
    fn test_api_stack_integrates_imported_function() {
        let backend = synthesize(&ResolvedNetworkConfig::default());

        let method = backend.api_stack.resource("RestApiHelloGET").unwrap();
        assert_eq!(
            method.properties["Integration"]["Uri"]["Fn::Sub"][1]["FunctionArn"],
            json!({ "Fn::ImportValue": FUNCTION_ARN_EXPORT })
        );
        assert_eq!(
            backend.function_stack.outputs["ApiFunctionArn"]
                .export
                .as_ref()
                .unwrap()
                .name,
            FUNCTION_ARN_EXPORT
        );
    }

    #[test]
    fn test_api_stack_invoke_policy_on_identity_pool_roles() {
        let backend = synthesize(&ResolvedNetworkConfig::default());

        let policy = backend.api_stack.resource("RestApiPolicy").unwrap();
        let resources = policy.properties["PolicyDocument"]["Statement"][0]["Resource"]
            .as_array()
            .unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(
            policy.properties["Roles"],
            json!([
                "amplify-auth-authenticated-role",
                "amplify-auth-unauthenticated-role"
            ])
        );
    }

    #[test]
    fn test_api_stack_outputs() {
        let backend = synthesize(&ResolvedNetworkConfig::default());
        let outputs = &backend.api_stack.outputs;

        assert_eq!(outputs[OUTPUT_API_NAME].value, CfnValue::literal(API_NAME));
        assert_eq!(outputs[OUTPUT_API_REGION].value, CfnValue::reference("AWS::Region"));
        assert_eq!(
            outputs[OUTPUT_API_ENDPOINT].value,
            CfnValue::sub("https://${RestApi}.execute-api.${AWS::Region}.${AWS::URLSuffix}/dev/")
        );
    }

    #[test]
    fn test_stacks_are_named() {
        let backend = synthesize(&ResolvedNetworkConfig::default());
        let names: Vec<&str> = backend.stacks().iter().map(|(name, _)| *name).collect();

        assert_eq!(names, vec!["api-function-vpc-stack", "api-stack"]);
    }

    #[test]
    fn test_deployment_output_record_key_matches_api_name() {
        let record = deployment_output_record(API_NAME, "r4nd0m", "eu-west-1");

        assert_eq!(record.api_name, API_NAME);
        assert_eq!(
            record.endpoint,
            "https://r4nd0m.execute-api.eu-west-1.amazonaws.com/dev/"
        );
    }

    #[test]
    fn test_write_stacks_writes_both_templates() {
        let dir = TempDir::new().unwrap();
        let backend = synthesize(&ResolvedNetworkConfig::default());

        let paths = write_stacks(&backend, dir.path()).unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("api-function-vpc-stack.template.json"),
                dir.path().join("api-stack.template.json"),
            ]
        );
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths[1]).unwrap()).unwrap();
        assert_eq!(written["Resources"]["RestApi"]["Properties"]["Name"], API_NAME);
    }

    #[test]
    fn test_write_deployment_outputs_readable_by_client() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("amplify_outputs.json");

        write_deployment_outputs(&path, "abc123", "us-west-2").unwrap();
        let loaded = load_outputs(&path).unwrap();

        let record = loaded.api(API_NAME).unwrap();
        assert_eq!(record.region, "us-west-2");
        assert_eq!(
            record.route_url("hello").unwrap().as_str(),
            "https://abc123.execute-api.us-west-2.amazonaws.com/dev/hello"
        );
    }

    #[test]
    fn test_write_deployment_outputs_rejects_empty_id() {
        let dir = TempDir::new().unwrap();

        let result = write_deployment_outputs(&dir.path().join("out.json"), " ", "us-west-2");

        assert!(matches!(
            result,
            Err(SynthError::MissingDeploymentValue("rest-api-id"))
        ));
        assert!(!dir.path().join("out.json").exists());
    }
}

// Lambda関数定義
//
// API統合先となるLambda関数と、その実行ロールに追加するポリシーを保持する。

use super::cfn::CfnResource;
use super::iam_policy::{PolicyDocument, PolicyStatement};
use serde::Serialize;
use serde_json::json;

/// Lambda関数の論理ID
pub const API_FUNCTION_LOGICAL_ID: &str = "ApiFunction";

/// 実行ロールへの追加ポリシーの論理ID
pub const API_FUNCTION_ROLE_POLICY_LOGICAL_ID: &str = "ApiFunctionRoleDefaultPolicy";

/// カスタムランタイムのハンドラー名
pub const BOOTSTRAP_HANDLER: &str = "bootstrap";

/// Rustバイナリ用のランタイム
pub const PROVIDED_RUNTIME: &str = "provided.al2023";

/// デプロイパッケージの格納場所
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCode {
    pub s3_bucket: String,
    pub s3_key: String,
}

/// Lambda関数のVPC設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpcConfig {
    #[serde(rename = "SecurityGroupIds")]
    pub security_group_ids: Vec<String>,
    #[serde(rename = "SubnetIds")]
    pub subnet_ids: Vec<String>,
}

/// Lambda関数定義
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    logical_id: String,
    code: FunctionCode,
    role_arn: String,
    role_name: String,
    role_policy: Vec<PolicyStatement>,
    vpc_config: Option<VpcConfig>,
}

impl FunctionDefinition {
    /// 新しい関数定義を作成
    ///
    /// # Arguments
    /// * `code` - デプロイパッケージの格納場所
    /// * `role_arn` - 実行ロールのARN
    /// * `role_name` - 実行ロール名（追加ポリシーのアタッチ先）
    pub fn new(code: FunctionCode, role_arn: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            logical_id: API_FUNCTION_LOGICAL_ID.to_string(),
            code,
            role_arn: role_arn.into(),
            role_name: role_name.into(),
            role_policy: Vec::new(),
            vpc_config: None,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// 実行ロールにステートメントを追加（既存のステートメントは保持）
    pub fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        self.role_policy.push(statement);
    }

    /// VPC設定を上書き
    pub fn override_vpc_config(&mut self, vpc_config: VpcConfig) {
        self.vpc_config = Some(vpc_config);
    }

    pub fn role_policy(&self) -> &[PolicyStatement] {
        &self.role_policy
    }

    pub fn vpc_config(&self) -> Option<&VpcConfig> {
        self.vpc_config.as_ref()
    }

    /// テンプレートリソースに変換
    ///
    /// 関数本体と、追加ステートメントがある場合はロールポリシーを返す。
    pub fn to_resources(&self) -> Vec<(String, CfnResource)> {
        let mut properties = json!({
            "Code": {
                "S3Bucket": self.code.s3_bucket,
                "S3Key": self.code.s3_key,
            },
            "Handler": BOOTSTRAP_HANDLER,
            "Runtime": PROVIDED_RUNTIME,
            "Role": self.role_arn,
        });
        if let Some(vpc_config) = &self.vpc_config {
            properties["VpcConfig"] = json!(vpc_config);
        }

        let mut resources = Vec::new();

        if self.role_policy.is_empty() {
            resources.push((
                self.logical_id.clone(),
                CfnResource::new("AWS::Lambda::Function", properties),
            ));
            return resources;
        }

        // ENI作成権限がないとVPC内で関数を作成できないため、ポリシーを先に作る
        let policy = json!({
            "PolicyName": API_FUNCTION_ROLE_POLICY_LOGICAL_ID,
            "PolicyDocument": PolicyDocument::new(self.role_policy.clone()),
            "Roles": [self.role_name],
        });
        resources.push((
            API_FUNCTION_ROLE_POLICY_LOGICAL_ID.to_string(),
            CfnResource::new("AWS::IAM::Policy", policy),
        ));
        resources.push((
            self.logical_id.clone(),
            CfnResource::new("AWS::Lambda::Function", properties)
                .depends_on(vec![API_FUNCTION_ROLE_POLICY_LOGICAL_ID.to_string()]),
        ));

        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_function() -> FunctionDefinition {
        FunctionDefinition::new(
            FunctionCode {
                s3_bucket: "code-bucket".to_string(),
                s3_key: "api_function.zip".to_string(),
            },
            "arn:aws:iam::123456789012:role/api-function-role",
            "api-function-role",
        )
    }

    #[test]
    fn test_plain_function_has_no_policy_or_vpc() {
        let function = sample_function();
        let resources = function.to_resources();

        assert_eq!(resources.len(), 1);
        let (id, resource) = &resources[0];
        assert_eq!(id, API_FUNCTION_LOGICAL_ID);
        assert_eq!(resource.resource_type, "AWS::Lambda::Function");
        assert_eq!(resource.properties["Runtime"], "provided.al2023");
        assert_eq!(resource.properties["Handler"], "bootstrap");
        assert!(resource.properties.get("VpcConfig").is_none());
    }

    #[test]
    fn test_add_to_role_policy_is_additive() {
        let mut function = sample_function();
        function.add_to_role_policy(PolicyStatement::allow(["logs:PutLogEvents"], ["*"]));
        function.add_to_role_policy(PolicyStatement::allow(["ec2:DescribeNetworkInterfaces"], ["*"]));

        assert_eq!(function.role_policy().len(), 2);
        assert_eq!(function.role_policy()[0].actions, vec!["logs:PutLogEvents"]);
    }

    #[test]
    fn test_vpc_config_and_policy_rendered() {
        let mut function = sample_function();
        function.add_to_role_policy(PolicyStatement::allow(["ec2:CreateNetworkInterface"], ["*"]));
        function.override_vpc_config(VpcConfig {
            security_group_ids: vec!["sg-1".to_string()],
            subnet_ids: vec!["subnet-1".to_string(), "subnet-2".to_string()],
        });

        let resources = function.to_resources();
        assert_eq!(resources.len(), 2);

        let (policy_id, policy) = &resources[0];
        assert_eq!(policy_id, API_FUNCTION_ROLE_POLICY_LOGICAL_ID);
        assert_eq!(policy.resource_type, "AWS::IAM::Policy");
        assert_eq!(policy.properties["Roles"], json!(["api-function-role"]));

        let (_, lambda) = &resources[1];
        assert_eq!(
            lambda.properties["VpcConfig"],
            json!({ "SecurityGroupIds": ["sg-1"], "SubnetIds": ["subnet-1", "subnet-2"] })
        );
        assert_eq!(lambda.depends_on, vec![API_FUNCTION_ROLE_POLICY_LOGICAL_ID]);
    }
}

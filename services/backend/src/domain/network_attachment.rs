// ネットワークアタッチメント
//
// 既存のVPC・サブネット・セキュリティグループをIDで参照し、
// Lambda関数をVPC内に配置する。新しいネットワークリソースは作成しない。

use super::function::{FunctionDefinition, VpcConfig};
use super::iam_policy::PolicyStatement;
use super::network_config::ResolvedNetworkConfig;
use tracing::debug;

/// VPC内Lambdaが必要とするENIライフサイクル権限
pub const NETWORK_INTERFACE_ACTIONS: [&str; 5] = [
    "ec2:CreateNetworkInterface",
    "ec2:DescribeNetworkInterfaces",
    "ec2:DeleteNetworkInterface",
    "ec2:AssignPrivateIpAddresses",
    "ec2:UnassignPrivateIpAddresses",
];

/// 既存VPCの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedVpc {
    pub logical_id: String,
    pub vpc_id: String,
    pub availability_zones: Vec<String>,
    pub private_subnet_ids: Vec<String>,
}

/// 既存サブネットの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSubnet {
    pub logical_id: String,
    pub subnet_id: String,
}

/// 既存セキュリティグループの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSecurityGroup {
    pub logical_id: String,
    pub security_group_id: String,
    pub allow_all_outbound: bool,
}

/// Lambda関数のVPC接続定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    vpc: ImportedVpc,
    subnets: Vec<ImportedSubnet>,
    security_group: ImportedSecurityGroup,
}

impl NetworkAttachment {
    /// 解決済みネットワーク設定から参照を組み立てる
    ///
    /// サブネットはIDごとに`ExistingSubnet1..N`として参照する。
    /// IDの存在確認は行わない。
    pub fn from_config(config: &ResolvedNetworkConfig) -> Self {
        let vpc = ImportedVpc {
            logical_id: "ExistingVPC".to_string(),
            vpc_id: config.vpc_id.clone(),
            availability_zones: config.availability_zones.clone(),
            private_subnet_ids: config.subnet_ids.clone(),
        };

        let subnets = config
            .subnet_ids
            .iter()
            .enumerate()
            .map(|(index, subnet_id)| ImportedSubnet {
                logical_id: format!("ExistingSubnet{}", index + 1),
                subnet_id: subnet_id.clone(),
            })
            .collect();

        let security_group = ImportedSecurityGroup {
            logical_id: "ExistingSecurityGroup".to_string(),
            security_group_id: config.security_group_id.clone(),
            allow_all_outbound: config.allow_all_outbound,
        };

        Self {
            vpc,
            subnets,
            security_group,
        }
    }

    pub fn vpc(&self) -> &ImportedVpc {
        &self.vpc
    }

    pub fn subnets(&self) -> &[ImportedSubnet] {
        &self.subnets
    }

    pub fn security_group(&self) -> &ImportedSecurityGroup {
        &self.security_group
    }

    /// 実行ロールに追加するENI権限ステートメント（リソースは`*`）
    pub fn role_policy_statement(&self) -> PolicyStatement {
        PolicyStatement::allow(NETWORK_INTERFACE_ACTIONS, ["*"])
    }

    /// 関数に設定するVPC設定
    pub fn vpc_config(&self) -> VpcConfig {
        VpcConfig {
            security_group_ids: vec![self.security_group.security_group_id.clone()],
            subnet_ids: self.subnets.iter().map(|s| s.subnet_id.clone()).collect(),
        }
    }

    /// 関数にVPC接続を適用
    ///
    /// ロールポリシーへの追加はステートメントの追記であり、既存ポリシーを置き換えない。
    pub fn attach_to(&self, function: &mut FunctionDefinition) {
        debug!(
            function = function.logical_id(),
            vpc_id = %self.vpc.vpc_id,
            subnet_count = self.subnets.len(),
            security_group_id = %self.security_group.security_group_id,
            "LambdaをVPCに接続"
        );

        function.add_to_role_policy(self.role_policy_statement());
        function.override_vpc_config(self.vpc_config());
    }
}

// IAMポリシードキュメント
//
// ロールにアタッチするポリシーステートメントを型安全に組み立てる。

use super::cfn::CfnValue;
use serde::Serialize;

/// ポリシー言語のバージョン（固定値）
pub const POLICY_VERSION: &str = "2012-10-17";

/// ステートメントの効果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// ポリシーステートメント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<CfnValue>,
}

impl PolicyStatement {
    /// Allowステートメントを作成
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<CfnValue>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

/// ポリシードキュメント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements,
        }
    }

    /// 全ステートメントのリソースを列挙
    pub fn resources(&self) -> impl Iterator<Item = &CfnValue> {
        self.statements.iter().flat_map(|s| s.resources.iter())
    }
}

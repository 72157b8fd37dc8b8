// CloudFormationテンプレートモデル
//
// synthが出力するテンプレートJSONの構造を定義する。
// リソースのプロパティはserde_json::Valueで保持し、
// 組み込み関数（Ref / Fn::Sub / Fn::GetAtt / Fn::ImportValue）はCfnValueで表現する。

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// テンプレートのフォーマットバージョン（固定値）
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// テンプレート内の値
///
/// リテラル文字列、または組み込み関数呼び出し。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfnValue {
    /// リテラル文字列
    Literal(String),
    /// `{"Ref": "<logical id or pseudo parameter>"}`
    Ref(String),
    /// `{"Fn::Sub": "<template>"}`
    Sub(String),
    /// `{"Fn::Sub": ["<template>", {<変数>}]}`
    SubWith(String, BTreeMap<String, CfnValue>),
    /// `{"Fn::GetAtt": ["<logical id>", "<attribute>"]}`
    GetAtt(String, String),
    /// `{"Fn::ImportValue": "<export name>"}`
    ImportValue(String),
}

impl CfnValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Self::Sub(template.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt(logical_id.into(), attribute.into())
    }

    /// JSON値に変換（プロパティ組み立て用）
    pub fn to_json(&self) -> Value {
        serde_json::json!(self)
    }
}

impl From<&str> for CfnValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for CfnValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl Serialize for CfnValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(s) => serializer.serialize_str(s),
            Self::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Self::Sub(template) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Sub", template)?;
                map.end()
            }
            Self::SubWith(template, vars) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Sub", &SubArgs(template, vars))?;
                map.end()
            }
            Self::GetAtt(id, attr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id, attr])?;
                map.end()
            }
            Self::ImportValue(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::ImportValue", name)?;
                map.end()
            }
        }
    }
}

/// `Fn::Sub`の2要素配列形式
struct SubArgs<'a>(&'a String, &'a BTreeMap<String, CfnValue>);

impl Serialize for SubArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(self.0)?;
        seq.serialize_element(self.1)?;
        seq.end()
    }
}

/// テンプレートのリソース
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnResource {
    /// リソース型（例: "AWS::ApiGateway::RestApi"）
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// プロパティ
    #[serde(rename = "Properties")]
    pub properties: Value,
    /// 依存リソースの論理ID
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl CfnResource {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on(mut self, logical_ids: Vec<String>) -> Self {
        self.depends_on = logical_ids;
        self
    }
}

/// テンプレートの出力
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnOutput {
    #[serde(rename = "Value")]
    pub value: CfnValue,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Export", skip_serializing_if = "Option::is_none")]
    pub export: Option<CfnExport>,
}

/// スタック間参照用のエクスポート
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnExport {
    #[serde(rename = "Name")]
    pub name: String,
}

/// CloudFormationテンプレート
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnTemplate {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, CfnResource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, CfnOutput>,
}

impl CfnTemplate {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: description.into(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// リソースを追加（同じ論理IDは上書き）
    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: CfnResource) {
        self.resources.insert(logical_id.into(), resource);
    }

    /// 出力を追加
    pub fn add_output(&mut self, name: impl Into<String>, output: CfnOutput) {
        self.outputs.insert(name.into(), output);
    }

    /// 論理IDでリソースを取得
    pub fn resource(&self, logical_id: &str) -> Option<&CfnResource> {
        self.resources.get(logical_id)
    }

    /// 指定した型のリソースを論理ID付きで列挙
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a CfnResource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }
}

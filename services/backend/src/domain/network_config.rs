// ネットワーク設定
//
// Lambda関数を既存VPCに接続するためのネットワーク識別子を
// 環境変数から読み込み、デフォルト値を補完するドメイン層コンポーネント。

use tracing::info;

// ===========================================
// デフォルト値定義（ダミー値）
// ===========================================

/// VPC IDのデフォルト値
pub const DEFAULT_VPC_ID: &str = "vpc-xxxxxxxx";

/// アベイラビリティゾーンのデフォルト値
pub const DEFAULT_AVAILABILITY_ZONES: &[&str] = &["us-west-2a", "us-west-2b"];

/// プライベートサブネットIDのデフォルト値
pub const DEFAULT_SUBNET_IDS: &[&str] = &["subnet-xxxxxxxxxxxxxxxx", "subnet-yyyyyyyyyyyyyyyy"];

/// Lambda用セキュリティグループIDのデフォルト値
pub const DEFAULT_SECURITY_GROUP_ID: &str = "sg-xxxxxxxx";

/// セキュリティグループの全アウトバウンド許可のデフォルト値
pub const DEFAULT_ALLOW_ALL_OUTBOUND: bool = true;

// ===========================================
// 環境変数名定義
// ===========================================

/// 環境変数名: VPC ID
pub const ENV_VPC_ID: &str = "VPC_ID";

/// 環境変数名: アベイラビリティゾーン（カンマ区切り）
pub const ENV_VPC_AVAILABILITY_ZONES: &str = "VPC_AVAILABILITY_ZONES";

/// 環境変数名: サブネットID（カンマ区切り）
pub const ENV_SUBNET_IDS: &str = "SUBNET_IDS";

/// 環境変数名: セキュリティグループID
pub const ENV_SECURITY_GROUP_ID: &str = "SECURITY_GROUP_ID";

/// 環境変数名: 全アウトバウンド許可フラグ
pub const ENV_SECURITY_GROUP_ALLOW_OUTBOUND: &str = "SECURITY_GROUP_ALLOW_OUTBOUND";

/// 解決済みネットワーク設定
///
/// デプロイ時に一度だけ構築され、以降は変更されない。
/// 識別子の書式検証は行わない（不正な値はデプロイ時にAWS側で拒否される）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNetworkConfig {
    /// 既存VPCのID
    pub vpc_id: String,
    /// VPCのアベイラビリティゾーン
    pub availability_zones: Vec<String>,
    /// Lambdaを配置するプライベートサブネットID
    pub subnet_ids: Vec<String>,
    /// Lambdaに割り当てるセキュリティグループID
    pub security_group_id: String,
    /// セキュリティグループが全アウトバウンド通信を許可するか
    pub allow_all_outbound: bool,
}

impl Default for ResolvedNetworkConfig {
    fn default() -> Self {
        Self {
            vpc_id: DEFAULT_VPC_ID.to_string(),
            availability_zones: to_owned_list(DEFAULT_AVAILABILITY_ZONES),
            subnet_ids: to_owned_list(DEFAULT_SUBNET_IDS),
            security_group_id: DEFAULT_SECURITY_GROUP_ID.to_string(),
            allow_all_outbound: DEFAULT_ALLOW_ALL_OUTBOUND,
        }
    }
}

impl ResolvedNetworkConfig {
    /// 環境変数から設定を読み込み
    ///
    /// 未設定または空文字の環境変数はデフォルト値で補完する。
    /// 解決した値は診断用にログ出力する。
    pub fn from_env() -> Self {
        let config = Self::from_lookup(|key| std::env::var(key).ok());

        info!(
            vpc_id = %config.vpc_id,
            availability_zones = ?config.availability_zones,
            subnet_ids = ?config.subnet_ids,
            security_group_id = %config.security_group_id,
            allow_all_outbound = config.allow_all_outbound,
            "ネットワーク設定を解決"
        );

        config
    }

    /// 任意のルックアップ関数から設定を読み込み
    ///
    /// # Arguments
    /// * `lookup` - 環境変数名から値を返す関数（未設定は`None`）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            vpc_id: get(ENV_VPC_ID).unwrap_or(defaults.vpc_id),
            availability_zones: get(ENV_VPC_AVAILABILITY_ZONES)
                .map(|v| split_list(&v))
                .unwrap_or(defaults.availability_zones),
            subnet_ids: get(ENV_SUBNET_IDS)
                .map(|v| split_list(&v))
                .unwrap_or(defaults.subnet_ids),
            security_group_id: get(ENV_SECURITY_GROUP_ID).unwrap_or(defaults.security_group_id),
            allow_all_outbound: get(ENV_SECURITY_GROUP_ALLOW_OUTBOUND)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.allow_all_outbound),
        }
    }
}

/// カンマ区切り文字列を分割し、各要素の前後の空白をトリムする
///
/// 空要素は除外しない（`"a,,b"`は3要素になる）。
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

/// 小文字化した値が`"true"`と一致する場合のみ`true`
pub fn parse_bool(value: &str) -> bool {
    value.to_lowercase() == "true"
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_all_unset_yields_defaults() {
        let config = ResolvedNetworkConfig::from_lookup(|_| None);

        assert_eq!(config.vpc_id, "vpc-xxxxxxxx");
        assert_eq!(config.availability_zones, vec!["us-west-2a", "us-west-2b"]);
        assert_eq!(
            config.subnet_ids,
            vec!["subnet-xxxxxxxxxxxxxxxx", "subnet-yyyyyyyyyyyyyyyy"]
        );
        assert_eq!(config.security_group_id, "sg-xxxxxxxx");
        assert!(config.allow_all_outbound);
    }

    #[test]
    fn test_empty_values_yield_defaults() {
        let config = ResolvedNetworkConfig::from_lookup(lookup_from(&[
            (ENV_VPC_ID, ""),
            (ENV_VPC_AVAILABILITY_ZONES, ""),
            (ENV_SUBNET_IDS, ""),
            (ENV_SECURITY_GROUP_ID, ""),
            (ENV_SECURITY_GROUP_ALLOW_OUTBOUND, ""),
        ]));

        assert_eq!(config, ResolvedNetworkConfig::default());
    }

    #[test]
    fn test_present_values_override_defaults() {
        let config = ResolvedNetworkConfig::from_lookup(lookup_from(&[
            (ENV_VPC_ID, "vpc-0123abcd"),
            (ENV_VPC_AVAILABILITY_ZONES, "ap-northeast-1a, ap-northeast-1c"),
            (ENV_SUBNET_IDS, " subnet-aaa ,subnet-bbb,subnet-ccc "),
            (ENV_SECURITY_GROUP_ID, "sg-0999"),
            (ENV_SECURITY_GROUP_ALLOW_OUTBOUND, "false"),
        ]));

        assert_eq!(config.vpc_id, "vpc-0123abcd");
        assert_eq!(
            config.availability_zones,
            vec!["ap-northeast-1a", "ap-northeast-1c"]
        );
        assert_eq!(config.subnet_ids, vec!["subnet-aaa", "subnet-bbb", "subnet-ccc"]);
        assert_eq!(config.security_group_id, "sg-0999");
        assert!(!config.allow_all_outbound);
    }

    #[test]
    fn test_subnet_ids_unset_keeps_dummy_subnets() {
        let config =
            ResolvedNetworkConfig::from_lookup(lookup_from(&[(ENV_VPC_ID, "vpc-real")]));

        assert_eq!(config.vpc_id, "vpc-real");
        assert_eq!(config.subnet_ids, to_owned_list(DEFAULT_SUBNET_IDS));
    }

    #[test]
    fn test_allow_outbound_uppercase_false_is_false() {
        let config = ResolvedNetworkConfig::from_lookup(lookup_from(&[(
            ENV_SECURITY_GROUP_ALLOW_OUTBOUND,
            "FALSE",
        )]));

        assert!(!config.allow_all_outbound);
    }

    #[test]
    fn test_parse_bool_is_case_insensitive_true_only() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("True"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("yes"));
        assert!(!parse_bool("1"));
        assert!(!parse_bool(" true"));
    }

    #[test]
    fn test_split_list_trims_each_element() {
        assert_eq!(split_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_list("single"), vec!["single"]);
        assert_eq!(split_list("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_malformed_identifiers_pass_through() {
        let config = ResolvedNetworkConfig::from_lookup(lookup_from(&[
            (ENV_VPC_ID, "not-a-vpc"),
            (ENV_SECURITY_GROUP_ID, "???"),
        ]));

        assert_eq!(config.vpc_id, "not-a-vpc");
        assert_eq!(config.security_group_id, "???");
    }

    // テストで環境変数を安全に設定/削除するヘルパー
    // 注: Rust 2024エディションでset_var/remove_varはunsafe
    unsafe fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    unsafe fn cleanup_network_env() {
        unsafe {
            remove_env(ENV_VPC_ID);
            remove_env(ENV_VPC_AVAILABILITY_ZONES);
            remove_env(ENV_SUBNET_IDS);
            remove_env(ENV_SECURITY_GROUP_ID);
            remove_env(ENV_SECURITY_GROUP_ALLOW_OUTBOUND);
        }
    }

    #[test]
    #[serial_test::serial(network_env)]
    fn test_from_env_reads_process_environment() {
        unsafe {
            cleanup_network_env();
            set_env(ENV_VPC_ID, "vpc-from-env");
            set_env(ENV_SUBNET_IDS, "subnet-1, subnet-2");
            set_env(ENV_SECURITY_GROUP_ALLOW_OUTBOUND, "TRUE");
        }

        let config = ResolvedNetworkConfig::from_env();

        assert_eq!(config.vpc_id, "vpc-from-env");
        assert_eq!(config.subnet_ids, vec!["subnet-1", "subnet-2"]);
        assert_eq!(config.security_group_id, DEFAULT_SECURITY_GROUP_ID);
        assert!(config.allow_all_outbound);

        unsafe { cleanup_network_env(); }
    }
}

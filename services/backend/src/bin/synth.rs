/// バックエンドのテンプレート合成CLI
///
/// 環境変数から既存VPCとバックエンド参照を解決し、CloudFormationテンプレートを出力する。
/// デプロイ後は、REST API IDとリージョンからクライアント用の出力ファイルを書き出す。
///
/// # 環境変数
/// - VPC_ID, VPC_AVAILABILITY_ZONES, SUBNET_IDS, SECURITY_GROUP_ID,
///   SECURITY_GROUP_ALLOW_OUTBOUND: 既存ネットワーク（未設定時はダミー値）
/// - API_FUNCTION_CODE_BUCKET, API_FUNCTION_CODE_KEY, API_FUNCTION_ROLE_ARN,
///   API_FUNCTION_ROLE_NAME, USER_POOL_ARN, AUTH_ROLE_NAME, UNAUTH_ROLE_NAME:
///   他スタックが所有するリソースへの参照
///
/// # ローカル実行
/// ```bash
/// export SUBNET_IDS=subnet-aaa,subnet-bbb
/// export SECURITY_GROUP_ID=sg-ccc
///
/// # テンプレート出力
/// cargo run --bin synth -- template --out-dir cdk.out
///
/// # デプロイ後の出力ファイル
/// cargo run --bin synth -- outputs --rest-api-id abc123 --region us-west-2
/// ```
use backend::application::{write_deployment_outputs, write_stacks, StackSynthesizer};
use backend::domain::ResolvedNetworkConfig;
use backend::infrastructure::{init_cli_logging, BackendReferences, DEFAULT_OUTPUTS_PATH};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(about = "REST APIバックエンドのテンプレートと出力ファイルを生成")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// CloudFormationテンプレートを出力
    Template {
        /// 出力ディレクトリ
        #[arg(long, short = 'o', default_value = "cdk.out")]
        out_dir: PathBuf,
    },

    /// デプロイ済みREST APIからamplify_outputs.jsonを出力
    Outputs {
        /// REST API ID
        #[arg(long)]
        rest_api_id: String,

        /// デプロイ先リージョン
        #[arg(long, env = "AWS_REGION")]
        region: String,

        /// 出力ファイルパス
        #[arg(long, default_value = DEFAULT_OUTPUTS_PATH)]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_cli_logging();

    let args = CliArgs::parse();

    match args.command {
        Command::Template { out_dir } => {
            // 設定は起動時に一度だけ解決する
            let network = ResolvedNetworkConfig::from_env();
            let references = BackendReferences::from_env();

            let backend = StackSynthesizer::new(&network, &references).synthesize();
            let paths = write_stacks(&backend, &out_dir).inspect_err(|e| {
                error!(error = %e, "テンプレートの出力に失敗");
            })?;

            for path in paths {
                println!("{}", path.display());
            }
        }
        Command::Outputs {
            rest_api_id,
            region,
            out,
        } => {
            write_deployment_outputs(&out, &rest_api_id, &region).inspect_err(|e| {
                error!(error = %e, "出力ファイルの書き出しに失敗");
            })?;

            info!(rest_api_id = %rest_api_id, region = %region, "出力ファイルを生成");
            println!("{}", out.display());
        }
    }

    Ok(())
}

// デプロイ成果物の読み書き
//
// synthが生成するテンプレートJSONと、クライアントが起動時に読み込む
// amplify_outputs.jsonをファイルシステム上で扱う。

use crate::domain::{AmplifyOutputs, CfnTemplate};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 出力ファイルのデフォルトパス
pub const DEFAULT_OUTPUTS_PATH: &str = "amplify_outputs.json";

/// 成果物操作のエラー型
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// ファイルの読み書きに失敗
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSONのパース・シリアライズに失敗
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// テンプレートを`<dir>/<stack_name>.template.json`に書き出す
///
/// # Returns
/// 書き出したファイルのパス
pub fn write_template(
    dir: &Path,
    stack_name: &str,
    template: &CfnTemplate,
) -> Result<PathBuf, ArtifactError> {
    std::fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{}.template.json", stack_name));
    write_json(&path, template)?;

    info!(
        path = %path.display(),
        resources = template.resources.len(),
        "テンプレートを出力"
    );
    Ok(path)
}

/// amplify_outputs.jsonを読み込む
pub fn load_outputs(path: &Path) -> Result<AmplifyOutputs, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let outputs = serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "出力ファイルを読み込み");
    Ok(outputs)
}

/// amplify_outputs.jsonを書き出す
pub fn write_outputs(path: &Path, outputs: &AmplifyOutputs) -> Result<(), ArtifactError> {
    write_json(path, outputs)?;
    info!(path = %path.display(), "出力ファイルを書き出し");
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(path, json + "\n").map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

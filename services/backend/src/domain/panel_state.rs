// API Testパネルの状態
//
// 呼び出しボタンごとに idle → loading → (success | error) → idle を遷移する。
// ローディングフラグはボタンごとに独立し、表示スロットは1つを共有する
// （最後に完了した呼び出しの結果が表示される）。

use serde_json::Value;

/// 呼び出し対象のルート
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiRoute {
    /// 認可なしの/hello
    Public,
    /// Cognito認可付きの/secured
    Secured,
}

impl ApiRoute {
    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "Call Public API",
            Self::Secured => "Call Secured API",
        }
    }
}

/// 共有表示スロットの内容
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelDisplay {
    /// 何も表示していない
    #[default]
    Empty,
    /// 整形済みJSONレスポンス
    Response(String),
    /// エラーメッセージ
    Error(String),
}

/// パネル全体の状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelState {
    public_loading: bool,
    secured_loading: bool,
    display: PanelDisplay,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 呼び出し中かどうか（呼び出し中のボタンは無効化される）
    pub fn is_loading(&self, route: ApiRoute) -> bool {
        match route {
            ApiRoute::Public => self.public_loading,
            ApiRoute::Secured => self.secured_loading,
        }
    }

    pub fn display(&self) -> &PanelDisplay {
        &self.display
    }

    /// 呼び出しを開始
    ///
    /// 既に同じルートを呼び出し中なら何もせず`false`を返す。
    /// 開始時に表示中のエラーは消去する（表示中のレスポンスは残す）。
    pub fn begin(&mut self, route: ApiRoute) -> bool {
        if self.is_loading(route) {
            return false;
        }
        self.set_loading(route, true);
        if matches!(self.display, PanelDisplay::Error(_)) {
            self.display = PanelDisplay::Empty;
        }
        true
    }

    /// 呼び出しを完了
    ///
    /// 成功時はJSONを整形して、失敗時はメッセージをそのまま表示スロットに書き込む。
    pub fn complete(&mut self, route: ApiRoute, outcome: Result<Value, String>) {
        self.display = match outcome {
            Ok(json) => PanelDisplay::Response(
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()),
            ),
            Err(message) => PanelDisplay::Error(message),
        };
        self.set_loading(route, false);
    }

    /// テキスト表示
    pub fn render(&self, username: Option<&str>) -> String {
        let mut lines = vec![
            "API Gateway / Lambda Test".to_string(),
            format!("Signed in as: {}", username.unwrap_or("User")),
        ];

        for route in [ApiRoute::Public, ApiRoute::Secured] {
            let status = if self.is_loading(route) { "loading..." } else { "ready" };
            lines.push(format!("[{}] {}", route.label(), status));
        }

        match &self.display {
            PanelDisplay::Empty => {}
            PanelDisplay::Response(body) => {
                lines.push("Response:".to_string());
                lines.push(body.clone());
            }
            PanelDisplay::Error(message) => {
                lines.push(format!("Error: {}", message));
            }
        }

        lines.join("\n")
    }

    fn set_loading(&mut self, route: ApiRoute, loading: bool) {
        match route {
            ApiRoute::Public => self.public_loading = loading,
            ApiRoute::Secured => self.secured_loading = loading,
        }
    }
}

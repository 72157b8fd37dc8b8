// アプリケーション層モジュール
pub mod api_test_panel;
pub mod echo_handler;
pub mod stack_synthesizer;

// 再エクスポート
pub use api_test_panel::{ApiTestPanel, PanelError};
pub use echo_handler::{to_echo_request, EchoHandler};
pub use stack_synthesizer::{
    deployment_output_record, write_deployment_outputs, write_stacks, StackSynthesizer,
    SynthError, SynthesizedBackend, API_STACK_NAME, FUNCTION_ARN_EXPORT, FUNCTION_STACK_NAME,
};

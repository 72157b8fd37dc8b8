// Infrastructure layer modules
pub mod api_client;
pub mod artifacts;
pub mod config;
pub mod logging;
pub mod session_token;

// Re-exports
pub use api_client::{ApiCallError, ApiClient, ReqwestApiClient};
pub use artifacts::{
    load_outputs, write_outputs, write_template, ArtifactError, DEFAULT_OUTPUTS_PATH,
};
pub use config::BackendReferences;
pub use logging::{init_cli_logging, init_logging};
pub use session_token::{SessionTokenError, SessionTokenProvider, StaticSessionTokenProvider};

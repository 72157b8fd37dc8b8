// Domain layer modules
pub mod api_outputs;
pub mod api_surface;
pub mod cfn;
pub mod echo;
pub mod function;
pub mod iam_policy;
pub mod network_attachment;
pub mod network_config;
pub mod panel_state;

// Re-exports
pub use api_outputs::{AmplifyOutputs, ApiOutputRecord, RouteUrlError};
pub use api_surface::{
    ApiSurface, AuthorizationType, CorsOptions, IdentityPoolRoles, InvokePolicy, RestApi,
    API_NAME, HELLO_PATH, SECURED_PATH, STAGE_NAME,
};
pub use cfn::{CfnExport, CfnOutput, CfnResource, CfnTemplate, CfnValue};
pub use echo::{EchoBody, EchoRequest, ECHO_MESSAGE};
pub use function::{FunctionCode, FunctionDefinition, VpcConfig};
pub use iam_policy::{Effect, PolicyDocument, PolicyStatement};
pub use network_attachment::{NetworkAttachment, NETWORK_INTERFACE_ACTIONS};
pub use network_config::ResolvedNetworkConfig;
pub use panel_state::{ApiRoute, PanelDisplay, PanelState};

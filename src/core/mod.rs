//! Core modules for the dialer

pub mod api;
pub mod bootstrap;
pub mod discovery;
pub mod feed;
pub mod host;
pub mod progress;
pub mod registry;
pub mod session;

pub use api::{create_router, create_router_with_pace, demo_cycle, run_server};
pub use bootstrap::{DialerApp, Registration};
pub use discovery::{Discovery, DiscoveryPhase, DiscoveryState};
pub use feed::{apply_message, consume_lines, consume_websocket, decode_event};
pub use host::{
    ApplicationApi, ComponentsApi, CrmApi, CrmSdk, HostCapabilities, InteractionApi,
    LifecycleCallbacks, LogNavigator, Navigator, PresenceApi,
};
pub use progress::{contact_url, ProgressSynchronizer};
pub use registry::{CallbackTable, ComponentBundle, ComponentTemplate};
pub use session::{
    sanitize_dial_number, KeyDisposition, SessionController, SessionHandle, SessionInput,
};

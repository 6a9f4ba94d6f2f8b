//! Device access: the bridge to phones and the discovery loop.

mod bridge;
mod discovery;

pub use bridge::{
    parse_device_list, AdbBridge, BoxFuture, BridgeError, DeviceBridge, DEFAULT_SERVICE_COMPONENT,
};
pub use discovery::{DiscoveryLoop, DEFAULT_DISCOVERY_INTERVAL};

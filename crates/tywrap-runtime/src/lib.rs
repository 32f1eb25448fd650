//! Dispatch, instance lifecycle, and capability reporting for the
//! `tywrap/1` bridge: the part of the system that decides what a validated
//! request *does*, as opposed to how it's framed (`tywrap-io`) or encoded
//! (`tywrap-codec`).

mod capability;
mod dispatcher;
mod instance;
mod registry;

pub use capability::{CapabilityReport, BRIDGE_NAME};
pub use dispatcher::Dispatcher;
pub use instance::{Instance, InstanceRegistry};
pub use registry::{Constructor, FunctionHandler, Registry};

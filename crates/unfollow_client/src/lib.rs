//! Unfollow client: HTTP access to the unfollow service and effect execution.
mod api;
mod engine;
mod persist;
mod types;

pub use api::{ClientSettings, ReqwestApi, UnfollowApi};
pub use engine::{EngineHandle, EngineTiming};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use types::{
    ApiError, BatchRequest, EngineError, EngineEvent, WireBatchAccepted, WireCompletion,
    WireCurrent, WireEnvelope, WireOperation, WireOperationDetails, WireOperationList,
    WireProgress, WireQuota, WireRateLimitWindow, WireRateLimits, WireStatus, WireTiming,
};

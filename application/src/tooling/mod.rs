//! Tool runtime: the registry and the guarded execution path under it.
//!
//! ```text
//! ToolRegistry ──▶ ResultCache ─ hit ──▶ ToolOutput
//!      │ miss
//!      ▼
//! RegisteredTool::execute ──▶ validate ──▶ timeout(handle) ──▶ metrics + observers
//! ```

pub mod cache;
pub mod observers;
pub mod registered;
pub mod registry;

pub use cache::{ResultCache, cache_key};
pub use observers::ObserverSet;
pub use registered::RegisteredTool;
pub use registry::{
    BatchCall, BatchResult, RankedTool, RegistryError, RegistryStats, SelectOptions,
    ToolRegistry,
};

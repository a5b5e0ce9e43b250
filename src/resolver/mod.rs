pub mod protocol;
pub mod resolve;

pub use protocol::{ErrorCode, ResolveRequest, ResolveResponse, SYSTEM_ERROR_KEY};
pub use resolve::{resolve_request, run};

//! HTTP-agnostic API layer
//!
//! This module provides typed request/response structures and handlers that
//! can be used by any HTTP server implementation or directly by clients.
//!
//! ## Design
//!
//! - **Handlers are thin**: Take the engine, an identity and typed input,
//!   return `Result<T, ApiError>`
//! - **Types are framework-agnostic**: No HTTP types leak into this module
//! - **Errors carry HTTP semantics**: `ApiError` knows its status code for
//!   translation, and every `EngineError` variant has its own code

mod error;
mod handlers;
mod types;

pub use error::{ApiError, ApiErrorData, ErrorCode};
pub use handlers::{
    get_contribution, get_history, get_record, invalidate_issue, list_issues, list_pending,
    review, submit,
};
pub use types::{
    ApiResponse, HistoryData, InvalidateIssueRequest, RecordData, ReviewData, ReviewRequest,
    SubmitRequest,
};

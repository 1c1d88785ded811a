//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod watch_dto;

pub use common_dto::*;
pub use watch_dto::*;

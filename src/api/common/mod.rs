//! Response helpers shared by the API handlers.

mod non_streaming;
mod streaming;

pub(crate) use non_streaming::{aggregate_response, ok_json_response};
pub(crate) use streaming::stream_response;

// Domain models: inbound status form, stored snapshots, response envelope

mod parse;
mod response;
mod status;

pub use parse::{parse_float, parse_int, sanitize_text};
pub use response::ApiResponse;
pub use status::{
    Client, DEFAULT_LOCATION, DEFAULT_NAME, IngestReceipt, LatestStatus, Metrics, StatusForm,
    StatusReport,
};

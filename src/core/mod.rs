pub mod correlator;
pub mod diagnostics;
pub mod dup_group;
pub mod exchange;
pub mod filter;
pub mod log_model;
pub mod recency_map;

pub use diagnostics::Diagnostic;
pub use exchange::{HttpExchange, HttpResponse};
pub use log_model::{parse_log, LogEntry, LogModel, PipelineOptions};

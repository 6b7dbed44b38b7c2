//! Result file ingestion
//!
//! [`record`] decodes single lines into typed records and [`parser`] drives a
//! chunked byte stream through decoding and into staging.

pub mod parser;
pub mod record;

pub use parser::{IngestStats, ProgressFn, StreamIngestor};
pub use record::{decode_line, ChildRecord, NamedQuantity, StreamRecord};

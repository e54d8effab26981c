//! Structured extraction: parsing model output and merging partial results

mod aggregator;
pub mod parser;
mod result;

pub use aggregator::ResultAggregator;
pub use parser::{parse_array, parse_object};
pub use result::{
    Concept, ExtractionResult, MAX_LIST_ENTRIES, ProcessingStatus, is_placeholder,
};

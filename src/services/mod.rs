//! Service layer for the extraction pipeline.
//!
//! This module contains domain logic separated from UI concerns.
//! Services are driven by the CLI but do not print; they report
//! through return values, events and tracing.

pub mod anonymize;
pub mod merge;
pub mod process;

#[allow(unused_imports)]
pub use anonymize::{anonymize_batch, anonymize_name, AnonymizeOutcome};
#[allow(unused_imports)]
pub use merge::{merge_directory, MergeOutcome};
#[allow(unused_imports)]
pub use process::{
    PipelineEvent, PipelineService, PipelineSummary, ProcessMode, ProcessOptions,
};

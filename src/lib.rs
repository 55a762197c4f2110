//! ecgslice - ECG exam PDF extraction and anonymization pipeline.
//!
//! Core library exposing the pipeline modules behind the `ecgs` binary.

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod services;
pub mod tables;

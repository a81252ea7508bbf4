//! # Quartile Core
//!
//! Pipeline library for scraping per-year journal quartiles from a search
//! page that has no structured API.
//!
//! ## Overview
//!
//! Identifiers (journal numbers) flow through one pipeline regardless of how
//! they are distributed:
//!
//! - **Work source**: [`source::PoolSource`] reads an input list into memory,
//!   [`source::QueueSource`] pulls deliveries from a durable queue that a
//!   [`source::Producer`] filled.
//! - **Dispatcher**: [`dispatcher::Dispatcher`] runs a fixed number of slots,
//!   each with at most one item in flight.
//! - **Fetch worker**: [`worker::FetchWorker`] opens one headless browser
//!   session per identifier, loads the search page and always tears the
//!   session down.
//! - **Extraction**: [`extract::ExtractionRule`] clicks the journal link,
//!   waits for the table and scans its cells in fixed strides.
//! - **Result sink**: [`sink::ResultSink`] writes `output_<identifier>.json`.
//!
//! ## Examples
//!
//! ```no_run
//! use std::path::Path;
//!
//! use quartile_core::{
//!     config::PipelineConfig, pipeline::run_pool, render::ChromiumEngine, worker::FetchWorker,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! async fn scrape(config: &PipelineConfig) -> quartile_core::error::Result<()> {
//!     let engine = ChromiumEngine::new(&config.browser);
//!     let worker = FetchWorker::from_config(engine, config);
//!     run_pool(worker, Path::new("journals.txt"), 4, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Binary path resolution for the headless browser
pub mod browser;

/// Pipeline configuration model and defaults
pub mod config;

pub mod dispatcher;

/// Error types and error handling utilities
pub mod error;

pub mod extract;

/// Input list parsing
pub mod input;

pub mod pipeline;

pub mod queue;

/// Rendering engine seam and the Chromium implementation
pub mod render;

pub mod sink;

pub mod source;

/// Identifiers, extraction results and delivery bookkeeping
pub mod types;

pub mod worker;

pub use error::{PipelineError, Result};
pub use types::{Disposition, ExtractionResult, Identifier, OutputRecord, WorkItem};

//! # Stockroom
//!
//! A flat-file inventory reconciler for lab electronics.
//!
//! An append-only log of OCR'd part photos goes in; a searchable store of
//! slotted part records comes out. New capture blocks are extracted into
//! structured records by a configurable provider, assigned storage-box slots
//! from a bounded per-prefix namespace, and duplicate part numbers are
//! reconciled onto shared slots. The store is plain text and syncs through a
//! bucket so the whole lab reads one copy.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────────┐   ┌────────────┐
//! │  raw log  │──▶│  reconcile  │──▶│ flat store │
//! │ (OCR'd)   │   │ diff+slot   │   │  + labels  │
//! └───────────┘   └──────┬──────┘   └─────┬──────┘
//!                        │                │
//!                        ▼                ▼
//!                 ┌────────────┐    ┌──────────┐
//!                 │ extractor  │    │  bucket  │
//!                 │ (OpenAI)   │    │(Firebase)│
//!                 └────────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! stock init                        # create data files and starter config
//! stock reconcile                   # extract new captures, assign slots
//! stock search "0.1uF 0603"
//! stock labels --output labels.txt
//! stock push                        # publish the store to the bucket
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`blockfile`] | Block text format: parsing and rendering |
//! | [`chunk`] | Raw-block batching for extraction |
//! | [`extract`] | Field-extraction provider abstraction |
//! | [`heuristics`] | Offline rules-based extractor |
//! | [`slots`] | Slot namespace and identity tracking |
//! | [`dedup`] | Duplicate reconciliation |
//! | [`store`] | Flat-file store persistence |
//! | [`bucket`] | Blob-store abstraction (Firebase, local) |
//! | [`reconcile`] | The reconciliation pipeline |
//!
//! ## Concurrency
//!
//! One run at a time. The store file has no locking, so concurrent runs
//! against the same store can interleave appends and corrupt it. If you need
//! concurrent invocation, serialize it externally (a lock file or a
//! single-writer wrapper).

pub mod blockfile;
pub mod bucket;
pub mod check;
pub mod chunk;
pub mod config;
pub mod dedup;
pub mod extract;
pub mod heuristics;
pub mod init;
pub mod labels;
pub mod models;
pub mod progress;
pub mod reconcile;
pub mod reorder;
pub mod retry;
pub mod search;
pub mod slots;
pub mod stats;
pub mod store;
pub mod sync;

#![doc = "leethub: core pipeline for archiving accepted LeetCode submissions into a linked GitHub repository."]

//! This crate contains the submission-to-commit pipeline and its supporting
//! logic: capability contracts for the browser surfaces, the GitHub client,
//! the README topic index, the stats ledger and the orchestration glue.
//! The browser-facing surfaces themselves (DOM observation, OAuth redirect
//! handling, popup UI, the storage engine) live with the embedder and reach
//! this crate through the traits in [`contract`].

pub mod archive;
pub mod contract;
pub mod detect;
pub mod error;
pub mod extract;
pub mod github;
pub mod link;
pub mod readme;
pub mod stats;
pub mod store;

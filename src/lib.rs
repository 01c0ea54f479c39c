//! youtube-transcript-mcp: MCP server for YouTube transcripts
//!
//! This library provides the building blocks of a stdio MCP server that lets
//! AI assistants fetch, cache and summarise YouTube video transcripts.
//!
//! # Architecture
//!
//! - **Transport**: newline-delimited JSON-RPC 2.0 over stdin/stdout. Stdout
//!   carries protocol frames only; diagnostics go to stderr.
//! - **Tool registry**: tool name to handler, populated once at start-up.
//! - **Cache**: JSON files under the user's home directory, created lazily on
//!   first use.
//! - **Retry**: every YouTube request is wrapped in jittered, bounded retry.
//!
//! # Modules
//!
//! - [`cache`] — On-disk transcript cache
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration and start-up errors
//! - [`lazy`] — Fallible lazy initialisation
//! - [`mcp`] — MCP protocol implementation
//! - [`retry`] — Retry policy with randomised backoff
//! - [`service`] — Transcript retrieval backed by the cache
//! - [`summary`] — Extractive transcript summaries
//! - [`youtube`] — Video ids, caption tracks and transcript fetching

use std::future::Future;
use std::pin::Pin;

pub mod cache;
pub mod config;
pub mod error;
pub mod lazy;
pub mod mcp;
pub mod retry;
pub mod service;
pub mod summary;
pub mod youtube;

/// A boxed, sendable future used at the async trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

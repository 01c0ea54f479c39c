//! Model Context Protocol (MCP) server implementation.
//!
//! The server exposes YouTube transcript tools to AI assistants over the
//! stdio transport using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│   Server    │───▶│ ToolRegistry │     │
//! │   │   (stdio)   │    │ (lifecycle) │    │   (tools)    │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │                                                │             │
//! │                                                ▼             │
//! │                                      ┌───────────────────┐   │
//! │                                      │ TranscriptService │   │
//! │                                      └───────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use registry::{Tool, ToolCallResult, ToolDefinition, ToolError, ToolRegistry};
pub use server::{McpServer, ServerState};
pub use tools::default_registry;
pub use transport::{StdioTransport, Transport};

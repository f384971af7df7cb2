//! Interactive client core for remote MCP servers: one session per transport
//! kind (SSE and streamable HTTP), tool discovery, schema-driven parameter
//! binding and tool invocation.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infra;
pub mod shared;

// MCP (Model Context Protocol) server exposing read-only YouTube tools
// to agent clients over stdio.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;

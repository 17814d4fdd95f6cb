mod registry;
pub mod youtube;

pub use registry::{json_schema_integer, json_schema_object, json_schema_string, Tool, ToolRegistry};
pub use youtube::{register_youtube_tools, ToolKind, ToolRequest, ToolResponse, YouTubeTool};

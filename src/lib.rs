// Library exports for codeloom components

pub mod api;
pub mod config;
pub mod materialize;
pub mod output;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, ApiResponse, ChatMessage, Provider, Usage};
pub use config::{Config, GeneratorConfig};
pub use materialize::{
    extract_structure_dirs, parse_code_blocks, sanitize_path, CodeBlock, MaterializeReport,
    Materializer,
};
pub use output::OutputHandler;
pub use registry::{FileEntry, FileRegistry};
pub use session::{RoundOutcome, Session};

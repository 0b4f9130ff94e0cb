//! Retrieval tools available to the workers

pub mod function_factory;
pub mod page_fetch;
pub mod tool;
pub mod web_search;

pub use function_factory::{FunctionFactory, ToolAttempt};
pub use page_fetch::FetchPage;
pub use tool::{Tool, ToolRegistry};
pub use web_search::{SearchDepth, SearchResult, WebSearchTool};

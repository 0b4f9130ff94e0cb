pub mod model;
pub mod openai_client;
pub(crate) mod tool_call_utils;

pub mod console;
pub mod rmcp_client;

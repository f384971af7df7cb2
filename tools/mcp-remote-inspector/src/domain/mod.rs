pub mod catalog;
pub mod invocation;
pub mod session;
pub mod transport;

pub mod inspector_service;
pub mod protocol;
pub mod registry;

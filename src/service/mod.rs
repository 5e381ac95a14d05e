pub mod account_service;
pub mod application_service;
pub mod chat_service;
pub mod deliverable_service;
pub mod error;
pub mod file_storage;
pub mod guard;
pub mod mission_service;
pub mod moderation_service;
pub mod profile_service;

pub mod admin;
pub mod applications;
pub mod auth;
pub mod chat;
pub mod deliverables;
pub mod freelancers;
pub mod missions;
pub mod users;

pub mod directory;
pub mod post_service;

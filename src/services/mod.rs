pub mod analyzer_service;
pub mod auth_service;
pub mod classifier_service;
pub mod match_service;
pub mod requirements_service;
pub mod user_repository;

#[cfg(test)]
pub mod testing;

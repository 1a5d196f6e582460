// Library for tests to access modules

pub mod config;
pub mod error;
pub mod models;
pub mod rate_limiter;
pub mod routes;
pub mod status_repo;
pub mod status_service;

//! Infrastructure layer - storage backends, directory, notifications and services

pub mod auth;
pub mod logging;
pub mod notification;
pub mod review;
pub mod services;
pub mod storage;
pub mod user;

//! Infrastructure services

mod review_service;

pub use review_service::{
    NewWorkflow, QueueQuery, ReviewService, ReviewServiceConfig, ReviewServiceTrait,
};

//! Content-based movie recommendations over precomputed feature vectors.
//!
//! [`engine`] holds the similarity core: the immutable artifact bundle, title
//! resolution and cosine ranking. The remaining modules host it over HTTP and
//! attach third-party metadata to the titles it returns.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

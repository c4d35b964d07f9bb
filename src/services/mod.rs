//! Services own the record logic and talk to the store.

pub mod movie_service;

//! Core data models for the movie service.
//!
//! `Movie` maps cleanly to the `movies` table via `sqlx::FromRow` and
//! serializes naturally as JSON via `serde`. The request shapes carry their
//! constraints as `validator` attributes.

pub mod movie;

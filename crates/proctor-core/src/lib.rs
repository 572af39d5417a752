//! proctor-core — Timed evaluation sessions, draft persistence, and grading.
//!
//! This crate defines the evaluation data model, the session lifecycle,
//! the grading engine, and the façade service that composes them. Storage
//! and catalogue collaborators are injected through the traits in
//! [`traits`], [`store`], and [`draft`].

pub mod clock;
pub mod draft;
pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod report;
pub mod service;
pub mod session;
pub mod store;
pub mod traits;

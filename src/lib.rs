//! Canastra content service.
//!
//! Ingests blog posts produced by an external generation service, normalizes
//! their loosely-shaped payloads into the fixed persisted schema, and serves
//! typed read APIs for the marketing site. Layout follows a conventional
//! split: `domain` holds pure types and predicates, `application` holds
//! services and the repository seam, `infra` holds the HTTP surface and the
//! managed-store client.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

//! Infrastructure adapters: HTTP surface, managed-store client, upstream
//! generator client, and telemetry.

pub mod error;
pub mod generators;
pub mod http;
pub mod store;
pub mod telemetry;

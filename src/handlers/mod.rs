// handlers/mod.rs - HTTP handlers, one module per resource
//
// Every handler that touches videos takes a `Viewer` extractor, so the content
// policy is resolved once per request before any service runs.

pub mod auth;
pub mod children;
pub mod favorites;
pub mod health;
pub mod profile;
pub mod quiz;
pub mod shorts;
pub mod videos;

//! `warden-api` — HTTP surface for the RBAC administration service.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;

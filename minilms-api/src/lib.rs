//! # Mini-LMS API Server Library
//!
//! This library provides the HTTP surface for the Mini-LMS authentication
//! service.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `cookie`: Session-cookie parsing and construction
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod cookie;
pub mod error;
pub mod middleware;
pub mod routes;

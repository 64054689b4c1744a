/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: CSRF issue, registration, login, logout
/// - `profile`: Session-gated profile view
/// - `users`: User listing

pub mod auth;
pub mod health;
pub mod profile;
pub mod users;

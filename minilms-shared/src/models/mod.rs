/// Database models
///
/// - `user`: user accounts and their stored credentials

pub mod user;

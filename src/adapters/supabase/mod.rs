pub mod auth;
pub mod client;
pub mod errors;
pub mod project;
pub mod wire;

pub use auth::SupabaseAuthRepository;
pub use client::SupabaseClient;
pub use project::SupabaseProjectRepository;

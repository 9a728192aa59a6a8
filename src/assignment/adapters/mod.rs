//! Adapter implementations for the assignment ports.

pub mod github;
pub mod http;
pub mod memory;
pub mod supabase;

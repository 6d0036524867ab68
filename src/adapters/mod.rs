// Adapters layer: concrete implementations of the domain ports against
// external systems. Supabase (PostgREST + GoTrue) is the only backend.

pub mod supabase;

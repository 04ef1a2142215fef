//! Identity infrastructure adapters

mod supabase;

pub use supabase::SupabaseIdentity;

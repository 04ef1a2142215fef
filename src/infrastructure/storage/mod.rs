//! Object storage infrastructure adapters

mod supabase;

pub use supabase::SupabaseStorage;

//! Comment gateway infrastructure adapters

mod supabase;

pub use supabase::SupabaseComments;

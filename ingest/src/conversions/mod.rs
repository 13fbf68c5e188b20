//! Conversions from raw dump records to cleaned, store-ready records.

pub mod record;
pub mod text;

//! URL handling for canonical record identity
//!
//! Every URL that reaches the store goes through [`normalize_url`] first;
//! the normalized form is the identity key for deduplication.

mod normalize;

pub use normalize::{clean_candidate_url, normalize_url, resolve_and_normalize};

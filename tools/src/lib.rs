//! Tools the shoe brand agent can call.

pub mod faq;

pub use faq::{lookup_faq_tool, FaqLookup, LookupFailure};

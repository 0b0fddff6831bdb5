//! Approval-mark identifier recognition and canonicalization

pub mod canonical;
pub mod recognizer;

pub use canonical::{
    canonical_prefix, canonical_prefixes, canonicalize, extract_identifiers, try_canonicalize, CanonicalIdentifier,
    MalformedCandidate,
};
pub use recognizer::{recognize, recognize_partial, Confidence, IdentifierCandidate, PartialIdentifier};

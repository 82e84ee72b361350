//! Replication (`spec.md` §4.9-§4.11): metadata fetch, content push, content
//! pull, each over the transport abstraction in `crate::transport`.

pub mod fetch;
pub mod pull;
pub mod push;

/// Returns `true` if `digest` looks like a well-formed 128-bit hex digest —
/// matching `original_source/huge/repo/fetch.py::_verify_file_hashes`, which
/// refuses to trust a peer's listing blindly.
pub(crate) fn looks_like_digest(digest: &str) -> bool {
    digest.len() == 32 && digest.chars().all(|c| c.is_ascii_hexdigit())
}

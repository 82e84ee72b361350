//! Peer address parsing (`spec.md` §6 "Address forms").
//!
//! Grounded on `original_source/huge/repo/address.py`. Three forms on the
//! wire: a bare local path, `host:path`, and `user@host:path`.

use crate::Error;

/// A parsed peer address: either a directory on the local filesystem or a
/// remote reachable over a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// A path on the local filesystem.
    Path(String),
    /// A peer reached over `ssh login@server`, rooted at `path`.
    RemoteShell { login: String, server: String, path: String },
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Path(path) => write!(f, "{path}"),
            Address::RemoteShell { login, server, path } => write!(f, "{login}@{server}:{path}"),
        }
    }
}

/// Parse a peer address string. A `host:path` or `user@host:path` shape is
/// treated as remote-shell; anything else is a local path, taken verbatim.
///
/// A Windows-style drive letter (`C:\foo`) is intentionally not special-cased
/// here; the original never ran on Windows and `spec.md` doesn't ask us to.
pub fn parse_address(address: &str) -> Address {
    let trimmed = address.trim();
    if let Some((server_part, path)) = split_remote_shell(trimmed) {
        let (login, server) = match server_part.split_once('@') {
            Some((login, server)) => (login.trim().to_string(), server.trim().to_string()),
            None => (inferred_login(), server_part.trim().to_string()),
        };
        return Address::RemoteShell { login, server, path: path.trim().to_string() };
    }
    Address::Path(trimmed.to_string())
}

/// The login to assume for a bare `host:path` address: `$HUGE_LOGIN` if set
/// and non-empty, otherwise the current OS login.
fn inferred_login() -> String {
    std::env::var("HUGE_LOGIN").ok().filter(|s| !s.is_empty()).unwrap_or_else(whoami::username)
}

/// Split `host:path` (or `user@host:path`) into `(server_part, path)`, or
/// `None` if `address` doesn't contain a colon at all — a plain local path.
fn split_remote_shell(address: &str) -> Option<(&str, &str)> {
    address.split_once(':')
}

/// Validate that a string looks like an address `huge` can act on, returning
/// the typed `Error::InvalidAddress` used at command boundaries when it
/// doesn't. Currently every non-empty string parses, so this only rejects
/// the empty address; kept as a named checkpoint for command handlers.
pub fn require_valid(address: &str) -> Result<Address, Error> {
    if address.trim().is_empty() {
        return Err(Error::InvalidAddress { address: address.to_string() });
    }
    Ok(parse_address(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_has_no_colon() {
        assert_eq!(parse_address("/tmp/repo"), Address::Path("/tmp/repo".to_string()));
    }

    #[test]
    fn host_path_infers_login() {
        std::env::remove_var("HUGE_LOGIN");
        let address = parse_address("server:/home/login/repository");
        match address {
            Address::RemoteShell { login, server, path } => {
                assert_eq!(login, whoami::username());
                assert_eq!(server, "server");
                assert_eq!(path, "/home/login/repository");
            }
            Address::Path(_) => panic!("expected a remote-shell address"),
        }
    }

    #[test]
    fn huge_login_overrides_the_os_login_for_bare_host_addresses() {
        std::env::set_var("HUGE_LOGIN", "override-login");
        let address = parse_address("server:/home/login/repository");
        std::env::remove_var("HUGE_LOGIN");
        match address {
            Address::RemoteShell { login, .. } => assert_eq!(login, "override-login"),
            Address::Path(_) => panic!("expected a remote-shell address"),
        }
    }

    #[test]
    fn user_at_host_path_keeps_explicit_login() {
        let address = parse_address("mylogin@server:/home/login/repository");
        assert_eq!(
            address,
            Address::RemoteShell {
                login: "mylogin".to_string(),
                server: "server".to_string(),
                path: "/home/login/repository".to_string(),
            }
        );
    }
}

//! Mapping connections onto player identities
//!
//! A player keeps their marks across reconnects as long as the resolver maps
//! the new connection onto the same [`Identity`].

use std::fmt;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy for attributing a freshly joined connection to a player
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, peer: SocketAddr) -> Identity;
}

/// One identity per remote host, so a player reconnecting from the same
/// machine reclaims their earlier marks
#[derive(Debug, Default, Clone, Copy)]
pub struct HostAddressResolver;

impl IdentityResolver for HostAddressResolver {
    fn resolve(&self, peer: SocketAddr) -> Identity {
        Identity::new(peer.ip().to_string())
    }
}

/// One identity per socket; lets several players share a host
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketAddressResolver;

impl IdentityResolver for SocketAddressResolver {
    fn resolve(&self, peer: SocketAddr) -> Identity {
        Identity::new(peer.to_string())
    }
}

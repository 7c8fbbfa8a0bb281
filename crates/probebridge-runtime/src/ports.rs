//! Free TCP port allocation.
//!
//! The OS picks the port: we bind a listener on port 0 and read back what it
//! chose. Holding the listener in a [`PortReservation`] keeps the port out of
//! other allocations until the caller is ready to hand it to the bridge.

use std::io;
use std::net::{Ipv4Addr, TcpListener};
use tracing::debug;

/// A bound listener on an OS-assigned port.
#[derive(Debug)]
pub struct PortReservation {
    listener: TcpListener,
    port: u16,
}

impl PortReservation {
    /// Reserve a fresh port on the loopback interface.
    pub fn reserve() -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        if port == 0 {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "OS returned port 0 for an ephemeral bind",
            ));
        }
        debug!(port = %port, "Reserved ephemeral port");
        Ok(Self { listener, port })
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Close the listener and return the port.
    pub fn release(self) -> u16 {
        drop(self.listener);
        self.port
    }
}

/// Obtain a free TCP port by binding a transient listener and releasing it.
///
/// Bind failures are returned to the caller; there is no silent retry.
pub fn allocate_free_port() -> io::Result<u16> {
    Ok(PortReservation::reserve()?.release())
}

/// Check if a port is available by attempting to bind to it.
/// This method binds and immediately drops the listener, which releases the port.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .and_then(|listener| listener.local_addr())
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_port_is_never_zero() {
        for _ in 0..16 {
            assert_ne!(allocate_free_port().unwrap(), 0);
        }
    }

    #[test]
    fn concurrent_reservations_get_distinct_ports() {
        let first = PortReservation::reserve().unwrap();
        let second = PortReservation::reserve().unwrap();
        assert_ne!(first.port(), second.port());
        assert!(!is_port_available(first.port()));
    }

    #[test]
    fn released_port_can_be_bound_again() {
        let port = allocate_free_port().unwrap();
        assert!(is_port_available(port));
    }
}

//! ISO-TP endpoint addressing.
//!
//! An endpoint is identified by the CAN ID it receives on (`local`) and the
//! CAN ID it transmits to (`peer`). The remote side of a connection is the
//! same pair with the two IDs swapped, so no extra state is needed to report
//! it.

use std::borrow::Cow;
use std::fmt;

/// Network family tag for ISO-TP addresses.
pub const NETWORK_ISOTP: &str = "can_isotp";

/// Flag bit marking a 29-bit (extended frame format) CAN identifier.
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;

/// Everything the kernel needs to bind an ISO-TP socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindTarget {
    pub ifindex: u32,
    pub rx_id: u32,
    pub tx_id: u32,
}

/// Capability trait for anything that can be handed to a bus dial.
///
/// `network` must return [`NETWORK_ISOTP`] for addresses a bus can bind.
/// Addresses in that family that cannot produce a [`BindTarget`] (for
/// example composite duplex addresses) keep the default `bind_target`.
pub trait NetAddr: fmt::Display + fmt::Debug + Send + Sync {
    /// Network family name.
    fn network(&self) -> Cow<'_, str>;

    /// Socket bind target on the given interface, if this address has one.
    fn bind_target(&self, _ifindex: u32) -> Option<BindTarget> {
        None
    }
}

/// A single ISO-TP CAN ID pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IsoTpAddr {
    local: u32,
    peer: u32,
}

impl IsoTpAddr {
    /// Address that receives on `local` and transmits to `peer`.
    pub const fn new(local: u32, peer: u32) -> Self {
        Self { local, peer }
    }

    /// Same as [`IsoTpAddr::new`] with both IDs marked as 29-bit identifiers.
    pub const fn extended(local: u32, peer: u32) -> Self {
        Self {
            local: local | CAN_EFF_FLAG,
            peer: peer | CAN_EFF_FLAG,
        }
    }

    /// CAN ID this endpoint receives on.
    pub const fn local(&self) -> u32 {
        self.local
    }

    /// CAN ID this endpoint transmits to.
    pub const fn peer(&self) -> u32 {
        self.peer
    }

    pub const fn is_extended(&self) -> bool {
        self.local & CAN_EFF_FLAG != 0 || self.peer & CAN_EFF_FLAG != 0
    }

    /// The address as seen from the other end of the link.
    pub const fn remote(&self) -> Self {
        Self {
            local: self.peer,
            peer: self.local,
        }
    }
}

impl fmt::Display for IsoTpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{NETWORK_ISOTP}{{local:{:#x},peer:{:#x}}}",
            self.local, self.peer
        )
    }
}

impl NetAddr for IsoTpAddr {
    fn network(&self) -> Cow<'_, str> {
        Cow::Borrowed(NETWORK_ISOTP)
    }

    fn bind_target(&self, ifindex: u32) -> Option<BindTarget> {
        Some(BindTarget {
            ifindex,
            rx_id: self.local,
            tx_id: self.peer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_swaps_ids() {
        let addr = IsoTpAddr::new(0x7E0, 0x7E8);
        let remote = addr.remote();
        assert_eq!(remote.local(), 0x7E8);
        assert_eq!(remote.peer(), 0x7E0);
    }

    #[test]
    fn remote_is_its_own_inverse() {
        for (local, peer) in [(0, 0), (1, 2), (0x7DF, 0x7E8), (u32::MAX, 0)] {
            let addr = IsoTpAddr::new(local, peer);
            assert_eq!(addr.remote().remote(), addr);
        }
        let ext = IsoTpAddr::extended(0x18DA_F110, 0x18DA_10F1);
        assert_eq!(ext.remote().remote(), ext);
    }

    #[test]
    fn display_includes_both_ids() {
        let addr = IsoTpAddr::new(1, 2);
        assert_eq!(addr.to_string(), "can_isotp{local:0x1,peer:0x2}");
    }

    #[test]
    fn extended_sets_eff_flag() {
        let addr = IsoTpAddr::extended(0x18DA_F110, 0x18DA_10F1);
        assert!(addr.is_extended());
        assert_eq!(addr.local(), 0x98DA_F110);
        assert!(!IsoTpAddr::new(0x7E0, 0x7E8).is_extended());
    }

    #[test]
    fn bind_target_uses_local_as_rx() {
        let target = IsoTpAddr::new(1, 2).bind_target(7).unwrap();
        assert_eq!(
            target,
            BindTarget {
                ifindex: 7,
                rx_id: 1,
                tx_id: 2
            }
        );
        assert_eq!(IsoTpAddr::new(1, 2).network(), NETWORK_ISOTP);
    }
}

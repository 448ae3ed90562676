//! Per-port data model.

use std::fmt;

/// Administrative state of a port, as configured on the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminState {
    Enabled,
    Disabled,
}

impl AdminState {
    /// Every administrative state, in exposition order.
    pub const ALL: [AdminState; 2] = [AdminState::Enabled, AdminState::Disabled];

    /// Map a raw `state` code. The switch uses 0 for disabled.
    pub fn from_code(code: u64) -> Self {
        if code == 0 {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Negotiated link speed and duplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Down,
    Auto,
    Half10,
    Full10,
    Half100,
    Full100,
    Full1000,
    /// A `link_status` code outside the known table.
    Unknown,
}

impl LinkState {
    /// Every link state, in exposition order.
    pub const ALL: [LinkState; 8] = [
        LinkState::Down,
        LinkState::Auto,
        LinkState::Half10,
        LinkState::Full10,
        LinkState::Half100,
        LinkState::Full100,
        LinkState::Full1000,
        LinkState::Unknown,
    ];

    /// Map a raw `link_status` code.
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Down,
            1 => Self::Auto,
            2 => Self::Half10,
            3 => Self::Full10,
            4 => Self::Half100,
            5 => Self::Full100,
            6 => Self::Full1000,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Auto => "auto",
            Self::Half10 => "10Mbps/half",
            Self::Full10 => "10Mbps/full",
            Self::Half100 => "100Mbps/half",
            Self::Full100 => "100Mbps/full",
            Self::Full1000 => "1000Mbps/full",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four packet counters the switch keeps per port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    TxGood,
    TxBad,
    RxGood,
    RxBad,
}

impl PacketKind {
    /// Order in which the counters appear in the `pkts` array.
    pub const ALL: [PacketKind; 4] = [
        PacketKind::TxGood,
        PacketKind::TxBad,
        PacketKind::RxGood,
        PacketKind::RxBad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TxGood => "txGoodPkt",
            Self::TxBad => "txBadPkt",
            Self::RxGood => "rxGoodPkt",
            Self::RxBad => "rxBadPkt",
        }
    }
}

/// Packet counters of one port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketCounters {
    pub tx_good: u64,
    pub tx_bad: u64,
    pub rx_good: u64,
    pub rx_bad: u64,
}

impl PacketCounters {
    /// Build from a group of four values in `pkts` order.
    pub fn from_group(group: [u64; 4]) -> Self {
        let [tx_good, tx_bad, rx_good, rx_bad] = group;
        Self {
            tx_good,
            tx_bad,
            rx_good,
            rx_bad,
        }
    }

    pub fn get(&self, kind: PacketKind) -> u64 {
        match kind {
            PacketKind::TxGood => self.tx_good,
            PacketKind::TxBad => self.tx_bad,
            PacketKind::RxGood => self.rx_good,
            PacketKind::RxBad => self.rx_bad,
        }
    }

    /// Iterate `(kind, value)` pairs in `pkts` order.
    pub fn iter(&self) -> impl Iterator<Item = (PacketKind, u64)> + '_ {
        PacketKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Point-in-time state of one switch port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSnapshot {
    /// 1-based port number.
    pub port: u32,
    /// Configured description, empty if none.
    pub description: String,
    pub admin_state: AdminState,
    pub link_state: LinkState,
    pub counters: PacketCounters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_state_codes() {
        assert_eq!(LinkState::from_code(0), LinkState::Down);
        assert_eq!(LinkState::from_code(1), LinkState::Auto);
        assert_eq!(LinkState::from_code(2).as_str(), "10Mbps/half");
        assert_eq!(LinkState::from_code(3).as_str(), "10Mbps/full");
        assert_eq!(LinkState::from_code(4).as_str(), "100Mbps/half");
        assert_eq!(LinkState::from_code(5).as_str(), "100Mbps/full");
        assert_eq!(LinkState::from_code(6).as_str(), "1000Mbps/full");
        assert_eq!(LinkState::from_code(7), LinkState::Unknown);
        assert_eq!(LinkState::from_code(u64::MAX), LinkState::Unknown);
    }

    #[test]
    fn test_link_state_all_is_distinct() {
        for (i, a) in LinkState::ALL.iter().enumerate() {
            for b in &LinkState::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn test_admin_state_codes() {
        assert_eq!(AdminState::from_code(0), AdminState::Disabled);
        assert_eq!(AdminState::from_code(1), AdminState::Enabled);
        assert_eq!(AdminState::from_code(2), AdminState::Enabled);
    }

    #[test]
    fn test_packet_counters_order() {
        let counters = PacketCounters::from_group([1, 2, 3, 4]);
        let pairs: Vec<_> = counters.iter().collect();

        assert_eq!(
            pairs,
            vec![
                (PacketKind::TxGood, 1),
                (PacketKind::TxBad, 2),
                (PacketKind::RxGood, 3),
                (PacketKind::RxBad, 4),
            ]
        );
    }
}

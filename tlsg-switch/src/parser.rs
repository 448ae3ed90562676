//! Extraction of port data from the `PortStatisticsRpm.htm` status page.
//!
//! The page is HTML with an inline script that assigns three integer arrays:
//!
//! ```text
//! state:[1,1,1,0,1,1,1,1,0,0],
//! link_status:[6,5,6,0,0,0,6,6,0,0],
//! pkts:[156660032,0,73463961,0, ... ,0,0]
//! ```
//!
//! - `state`: administrative state per port (1 enabled, 0 disabled)
//! - `link_status`: link speed code per port (see [`LinkState::from_code`])
//! - `pkts`: four counters per port, `txGoodPkt, txBadPkt, rxGoodPkt, rxBadPkt`
//!
//! The firmware appends two entries to each array that are not physical
//! ports. The port count is the length of `state` without them; the other
//! two arrays only have to cover that many ports. The script is not valid JSON, so each array is located on its own
//! by its textual prefix.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::port::{AdminState, LinkState, PacketCounters, PortSnapshot};

/// Number of trailing non-port entries in the `state` array.
pub const SENTINEL_ENTRIES: usize = 2;

/// Counters per port in the `pkts` array.
pub const COUNTERS_PER_PORT: usize = 4;

static STATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bstate:\s*\[([^\]]*)\]").unwrap());

static LINK_STATUS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\blink_status:\s*\[([^\]]*)\]").unwrap());

static PKTS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpkts:\s*\[([^\]]*)\]").unwrap());

/// The three arrays embedded in the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    State,
    LinkStatus,
    Pkts,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::LinkStatus => "link_status",
            Self::Pkts => "pkts",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            Self::State => &STATE_REGEX,
            Self::LinkStatus => &LINK_STATUS_REGEX,
            Self::Pkts => &PKTS_REGEX,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status page did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("'{marker}' array not found")]
    Missing { marker: Marker },

    #[error("'{marker}' array has {found} entries, expected at least {expected}")]
    Inconsistent {
        marker: Marker,
        expected: usize,
        found: usize,
    },

    #[error("'{marker}' array contains a non-numeric entry: {value:?}")]
    Malformed { marker: Marker, value: String },
}

/// Extract one array from the page.
///
/// Returns `Ok(None)` if the marker does not occur. An empty array
/// (`state:[]`) yields `Ok(Some(vec![]))`.
pub fn extract_array(body: &str, marker: Marker) -> Result<Option<Vec<u64>>, ParseError> {
    let Some(captures) = marker.regex().captures(body) else {
        return Ok(None);
    };

    let raw = captures.get(1).map_or("", |m| m.as_str()).trim();
    if raw.is_empty() {
        return Ok(Some(Vec::new()));
    }

    raw.split(',')
        .map(|entry| {
            let entry = entry.trim();
            entry.parse::<u64>().map_err(|_| ParseError::Malformed {
                marker,
                value: entry.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Drop the trailing non-port entries.
fn strip_sentinels(values: &[u64]) -> &[u64] {
    &values[..values.len().saturating_sub(SENTINEL_ENTRIES)]
}

/// Extract an array that must hold at least `expected` entries.
///
/// Only the first `expected` entries belong to ports; anything after them
/// (normally the trailing sentinels) is ignored.
fn extract_port_array(body: &str, marker: Marker, expected: usize) -> Result<Vec<u64>, ParseError> {
    let mut values = extract_array(body, marker)?.ok_or(ParseError::Missing { marker })?;

    if values.len() < expected {
        return Err(ParseError::Inconsistent {
            marker,
            expected,
            found: values.len(),
        });
    }

    values.truncate(expected);
    Ok(values)
}

/// Parse the status page into one snapshot per physical port.
///
/// The port count comes from the `state` array. If that array is missing
/// the page carries no data (usually the login page after the session
/// expired) and an empty list is returned. Once ports exist, the other two
/// arrays must cover all of them; otherwise no snapshots are produced at all.
pub fn parse_status_page(
    body: &str,
    descriptions: &BTreeMap<u32, String>,
) -> Result<Vec<PortSnapshot>, ParseError> {
    let Some(state) = extract_array(body, Marker::State)? else {
        trace!("No 'state' array on status page");
        return Ok(Vec::new());
    };
    let state = strip_sentinels(&state);
    let port_count = state.len();

    if port_count == 0 {
        return Ok(Vec::new());
    }

    let link_status = extract_port_array(body, Marker::LinkStatus, port_count)?;
    let pkts = extract_port_array(body, Marker::Pkts, port_count * COUNTERS_PER_PORT)?;

    let ports = (1u32..)
        .zip(state)
        .zip(link_status.iter())
        .zip(pkts.chunks_exact(COUNTERS_PER_PORT))
        .map(|(((port, &admin), &link), group)| PortSnapshot {
            port,
            description: descriptions.get(&port).cloned().unwrap_or_default(),
            admin_state: AdminState::from_code(admin),
            link_state: LinkState::from_code(link),
            counters: PacketCounters::from_group([group[0], group[1], group[2], group[3]]),
        })
        .collect();

    Ok(ports)
}

//! Client for the web interface of TP-Link TL-SG "easy smart" switches.
//!
//! These switches have no SNMP agent and no API. The only way to read port
//! counters is to log in to the management UI and scrape the
//! `PortStatisticsRpm.htm` page, which embeds the data as JavaScript arrays.
//!
//! - [`config`] - Static identity of one switch (`SwitchConfig`)
//! - [`client`] - HTTP session handling (`SwitchClient`, `SessionState`)
//! - [`parser`] - Status page extraction (`parse_status_page`)
//! - [`port`] - Per-port data model (`PortSnapshot`, `LinkState`, ...)
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```ignore
//! use tlsg_switch::{SwitchClient, SwitchConfig, parse_status_page};
//!
//! let mut client = SwitchClient::new(config)?;
//! if client.authenticate().await {
//!     let body = client.fetch_port_stats().await?;
//!     let ports = parse_status_page(&body, &client.config().port_descriptions)?;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod parser;
pub mod port;

pub use client::{SessionState, SwitchClient};
pub use config::SwitchConfig;
pub use error::{Error, Result};
pub use parser::{Marker, ParseError, extract_array, parse_status_page};
pub use port::{AdminState, LinkState, PacketCounters, PacketKind, PortSnapshot};

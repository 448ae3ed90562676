//! Shaping of switch port data into Prometheus metric families.

use std::fmt;

use tlsg_switch::{AdminState, LinkState, PortSnapshot};

/// Prometheus metric types produced by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrometheusType {
    Counter,
    Gauge,
    /// Exactly one of a fixed set of states is 1, the others 0.
    StateSet,
    /// Constant 1 carrying its payload in labels.
    Info,
}

impl PrometheusType {
    /// Get the TYPE comment string for the text exposition format (0.0.4).
    ///
    /// State sets and info metrics have no type of their own in 0.0.4 and
    /// are exposed as gauges.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrometheusType::Counter => "counter",
            PrometheusType::Gauge | PrometheusType::StateSet | PrometheusType::Info => "gauge",
        }
    }
}

/// Value of a sample.
///
/// Counters stay integers so they render exactly, even past 2^53.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Integer(u64),
    Float(f64),
}

impl SampleValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl From<u64> for SampleValue {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl PartialEq<f64> for SampleValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == *other
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) if v.is_nan() => f.write_str("NaN"),
            Self::Float(v) if v.is_infinite() => {
                f.write_str(if v.is_sign_positive() { "+Inf" } else { "-Inf" })
            }
            Self::Float(v) if v.fract() == 0.0 => write!(f, "{:.0}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One labelled value of a metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<(String, String)>,
    pub value: SampleValue,
}

impl Sample {
    pub fn new(labels: Vec<(String, String)>, value: impl Into<SampleValue>) -> Self {
        Self {
            labels,
            value: value.into(),
        }
    }

    /// Look up a label value.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the label set as `{k="v",...}`, or nothing without labels.
    pub fn format_labels(&self) -> String {
        if self.labels.is_empty() {
            return String::new();
        }

        let parts: Vec<String> = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect();

        format!("{{{}}}", parts.join(","))
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A named group of samples sharing type and help text.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: &'static str,
    pub metric_type: PrometheusType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: String, help: &'static str, metric_type: PrometheusType) -> Self {
        Self {
            name,
            help,
            metric_type,
            samples: Vec::new(),
        }
    }
}

/// Sanitize a metric name to be Prometheus-compatible.
///
/// Prometheus metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`. Invalid
/// characters become underscores, runs of underscores collapse and a
/// leading digit gets an underscore prefix.
pub fn sanitize_metric_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 1);
    let mut last_was_underscore = false;

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        result.push('_');
        last_was_underscore = true;
    }

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == ':' {
            result.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            result.push('_');
            last_was_underscore = true;
        }
    }

    while result.ends_with('_') {
        result.pop();
    }

    result
}

/// Metric names for one configured prefix.
#[derive(Debug, Clone)]
pub struct MetricNames {
    prefix: String,
}

impl MetricNames {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: sanitize_metric_name(prefix),
        }
    }

    fn name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }

    pub fn packet_counters(&self) -> String {
        self.name("switch_port_packet_counters_packets_total")
    }

    pub fn link_speed(&self) -> String {
        self.name("switch_port_linkSpeed")
    }

    pub fn link_state(&self) -> String {
        self.name("switch_port_linkState")
    }

    pub fn port_description(&self) -> String {
        self.name("switch_port_description_info")
    }

    pub fn scrape_success(&self) -> String {
        self.name("switch_scrape_success")
    }

    pub fn collection_time(&self) -> String {
        self.name("collection_time")
    }
}

fn port_labels(host: &str, port: &PortSnapshot) -> Vec<(String, String)> {
    vec![
        ("host".to_string(), host.to_string()),
        ("port".to_string(), port.port.to_string()),
    ]
}

/// Build a state-set family: one sample per `(port, state)` pair where the
/// observed state is 1 and every other state 0. The state label is named
/// after the family.
fn state_set<S: Copy + PartialEq>(
    name: String,
    help: &'static str,
    host: &str,
    ports: &[PortSnapshot],
    states: &[S],
    observed: impl Fn(&PortSnapshot) -> S,
    label: impl Fn(S) -> &'static str,
) -> MetricFamily {
    let mut family = MetricFamily::new(name, help, PrometheusType::StateSet);

    for port in ports {
        let current = observed(port);
        for &state in states {
            let mut labels = port_labels(host, port);
            labels.push((family.name.clone(), label(state).to_string()));
            let value = if state == current { 1.0 } else { 0.0 };
            family.samples.push(Sample::new(labels, value));
        }
    }

    family
}

/// Packet counters, four per port, labelled by `type`.
pub fn packet_counters(names: &MetricNames, host: &str, ports: &[PortSnapshot]) -> MetricFamily {
    let mut family = MetricFamily::new(
        names.packet_counters(),
        "Packet counters (rx/tx, good/bad) for each switch port",
        PrometheusType::Counter,
    );

    for port in ports {
        for (kind, value) in port.counters.iter() {
            let mut labels = port_labels(host, port);
            labels.push(("type".to_string(), kind.as_str().to_string()));
            family.samples.push(Sample::new(labels, value));
        }
    }

    family
}

/// Link speed/duplex per port as a state set over [`LinkState::ALL`].
pub fn link_speed(names: &MetricNames, host: &str, ports: &[PortSnapshot]) -> MetricFamily {
    state_set(
        names.link_speed(),
        "Link speed/duplex for each switch port",
        host,
        ports,
        &LinkState::ALL,
        |port| port.link_state,
        |state| state.as_str(),
    )
}

/// Administrative state per port as a state set over enabled/disabled.
pub fn link_state(names: &MetricNames, host: &str, ports: &[PortSnapshot]) -> MetricFamily {
    state_set(
        names.link_state(),
        "Administrative state (enabled/disabled) for each switch port",
        host,
        ports,
        &AdminState::ALL,
        |port| port.admin_state,
        |state| state.as_str(),
    )
}

/// Configured description per port.
pub fn port_description(names: &MetricNames, host: &str, ports: &[PortSnapshot]) -> MetricFamily {
    let mut family = MetricFamily::new(
        names.port_description(),
        "Port descriptions for each port",
        PrometheusType::Info,
    );

    for port in ports {
        let mut labels = port_labels(host, port);
        labels.push(("description".to_string(), port.description.clone()));
        family.samples.push(Sample::new(labels, 1.0));
    }

    family
}

/// Whether the last scrape of a switch produced data.
pub fn scrape_success(names: &MetricNames, host: &str, success: bool) -> MetricFamily {
    let mut family = MetricFamily::new(
        names.scrape_success(),
        "Whether port statistics could be read from the switch (1) or not (0)",
        PrometheusType::Gauge,
    );
    family.samples.push(Sample::new(
        vec![("host".to_string(), host.to_string())],
        if success { 1.0 } else { 0.0 },
    ));
    family
}

/// Wall-clock duration of a whole scrape cycle.
pub fn collection_time(names: &MetricNames, seconds: f64) -> MetricFamily {
    let mut family = MetricFamily::new(
        names.collection_time(),
        "Collection time in seconds for all the switches",
        PrometheusType::Gauge,
    );
    family.samples.push(Sample::new(Vec::new(), seconds));
    family
}

/// All port families of one switch.
pub fn port_families(names: &MetricNames, host: &str, ports: &[PortSnapshot]) -> Vec<MetricFamily> {
    vec![
        packet_counters(names, host, ports),
        link_speed(names, host, ports),
        link_state(names, host, ports),
        port_description(names, host, ports),
    ]
}

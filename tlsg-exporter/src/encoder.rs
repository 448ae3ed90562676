//! Prometheus text exposition format (0.0.4).

use std::collections::HashSet;
use std::fmt::Write;

use crate::mapping::MetricFamily;

/// Content type of the rendered output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders metric families for one scrape cycle.
///
/// Families arrive in per-switch batches, so the same family name shows up
/// once per switch. `# HELP` and `# TYPE` are written only the first time a
/// name is seen; later batches contribute samples only.
#[derive(Debug, Default)]
pub struct TextEncoder {
    described: HashSet<String>,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a batch of families.
    pub fn encode(&mut self, families: &[MetricFamily]) -> String {
        let mut output = String::new();

        for family in families {
            if family.samples.is_empty() && self.described.contains(&family.name) {
                continue;
            }

            if self.described.insert(family.name.clone()) {
                writeln!(output, "# HELP {} {}", family.name, escape_help(family.help)).ok();
                writeln!(
                    output,
                    "# TYPE {} {}",
                    family.name,
                    family.metric_type.as_str()
                )
                .ok();
            }

            for sample in &family.samples {
                writeln!(
                    output,
                    "{}{} {}",
                    family.name,
                    sample.format_labels(),
                    sample.value
                )
                .ok();
            }
        }

        output
    }
}

/// Escape special characters in help text.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

//! A nagios/icinga check for the private HTTP API of a Jitsi Videobridge.
//!
//! The crate is split into the threshold handling ([Threshold]), lazy access to the colibri
//! statistics ([MetricStore]), the check itself ([CheckEngine]) and the types used to render
//! the final plugin output ([Resource], [PerfData], [ServiceState]).
//!
//! ```rust
//! # use check_jitsi::{PerfData, Resource, ServiceState, Threshold};
//! let warning: Threshold = "10:100".parse().unwrap();
//! let resource = Resource::new(ServiceState::Ok, "42 participants").with_perf_data(
//!     PerfData::new("participants", 42).with_thresholds(warning, Threshold::default()),
//! );
//! assert_eq!(
//!     &resource.to_nagios_string(),
//!     "OK - 42 participants | participants=42;10:100;"
//! );
//! ```

use std::fmt;
use std::process;

pub mod check;
pub mod config_generator;
pub mod metric;
pub mod mode;
pub mod runner;
pub mod stats;
pub mod threshold;
pub mod transport;

pub use crate::check::{CheckConfig, CheckEngine, CheckError};
pub use crate::metric::MetricValue;
pub use crate::mode::{Mode, SimpleMetric};
pub use crate::runner::{Outcome, Runner};
pub use crate::stats::MetricStore;
pub use crate::threshold::{Threshold, ThresholdError};
pub use crate::transport::{HttpResponse, HttpTransport, Transport, TransportError};

/// The result of a single check: a state, a human readable message and the performance data.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    state: ServiceState,
    description: String,
    perf_data: Vec<PerfData>,
}

impl Resource {
    pub fn new(state: ServiceState, description: &str) -> Self {
        Resource {
            state,
            description: description.to_owned(),
            perf_data: Vec::new(),
        }
    }

    pub fn with_perf_data(mut self, perf_data: PerfData) -> Self {
        self.push(perf_data);
        self
    }

    /// Adds a performance data entry. An entry with the same label is replaced in place.
    pub fn push(&mut self, perf_data: PerfData) {
        match self.perf_data.iter_mut().find(|p| p.label == perf_data.label) {
            Some(existing) => *existing = perf_data,
            None => self.perf_data.push(perf_data),
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn perf_data(&self) -> &[PerfData] {
        &self.perf_data
    }

    /// Returns the single line nagios expects on stdout:
    /// `<STATE> - <description>[ | <perf data>...]`.
    pub fn to_nagios_string(&self) -> String {
        let mut s = format!("{} - {}", self.state, self.description);

        if !self.perf_data.is_empty() {
            s.push_str(" |");
            for perf_data in &self.perf_data {
                s.push(' ');
                s.push_str(&perf_data.to_perf_string());
            }
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

/// Represents a service state from nagios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// The representation of a value inside of the performance data section. Kept apart from
/// Display so the human readable form of a type is left alone.
pub trait ToPerfString {
    fn to_perf_string(&self) -> String;
}

impl ToPerfString for MetricValue {
    fn to_perf_string(&self) -> String {
        self.to_string()
    }
}

impl ToPerfString for Threshold {
    fn to_perf_string(&self) -> String {
        self.as_str().to_owned()
    }
}

/// A single `label=value[;warning;critical]` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfData {
    label: String,
    value: MetricValue,
    thresholds: Option<(Threshold, Threshold)>,
}

impl PerfData {
    pub fn new(label: &str, value: impl Into<MetricValue>) -> Self {
        PerfData {
            label: label.to_owned(),
            value: value.into(),
            thresholds: None,
        }
    }

    /// Attaches the warning and critical thresholds. Both are always rendered, even when empty.
    pub fn with_thresholds(mut self, warning: Threshold, critical: Threshold) -> Self {
        self.thresholds = Some((warning, critical));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &MetricValue {
        &self.value
    }
}

impl ToPerfString for PerfData {
    fn to_perf_string(&self) -> String {
        // replace `=`
        let label = self.label.replace('=', "_");

        // quote `'`
        let label = label.replace('\'', "''");

        // quote if contains spaces
        let label = if label.contains(' ') {
            format!("'{label}'")
        } else {
            label
        };

        match &self.thresholds {
            Some((warning, critical)) => format!(
                "{label}={};{};{}",
                self.value.to_perf_string(),
                warning.to_perf_string(),
                critical.to_perf_string()
            ),
            None => format!("{label}={}", self.value.to_perf_string()),
        }
    }
}

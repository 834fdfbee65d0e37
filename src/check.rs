use std::time::Duration;

use tracing::debug;

use crate::metric::MetricValue;
use crate::mode::{Mode, SimpleMetric};
use crate::stats::{MetricStore, StatsError};
use crate::threshold::{Threshold, ThresholdError};
use crate::transport::{Transport, TransportError};
use crate::{PerfData, Resource, ServiceState};

pub const HEALTH_PATH: &str = "/about/health";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Everything a single check needs to know.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub base_url: String,
    pub mode: Mode,
    pub warning: Threshold,
    pub critical: Threshold,
    /// Merge every metric of the statistics into the performance data.
    pub all_metrics: bool,
    /// Metrics removed from the statistics before anything looks at them.
    pub ignore_metrics: Vec<String>,
    /// Metrics added to the performance data of a simple check.
    pub append_metrics: Vec<String>,
    pub timeout: Duration,
}

impl CheckConfig {
    pub fn new(hostname: &str, port: u16, mode: Mode) -> Self {
        CheckConfig {
            base_url: format!("http://{hostname}:{port}"),
            mode,
            warning: Threshold::default(),
            critical: Threshold::default(),
            all_metrics: false,
            ignore_metrics: Vec::new(),
            append_metrics: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parses both thresholds. Fails before any request is made if either of them is invalid.
    pub fn with_thresholds(mut self, warning: &str, critical: &str) -> Result<Self, CheckError> {
        self.warning = warning.parse()?;
        self.critical = critical.parse()?;
        Ok(self)
    }
}

/// Runs exactly one check against the bridge.
pub struct CheckEngine<'a, T> {
    config: CheckConfig,
    transport: &'a T,
    store: MetricStore<&'a T>,
}

impl<'a, T: Transport> CheckEngine<'a, T> {
    pub fn new(config: CheckConfig, transport: &'a T) -> Self {
        let store = MetricStore::new(transport, &config.base_url, config.ignore_metrics.clone());
        CheckEngine {
            config,
            transport,
            store,
        }
    }

    pub fn run(&mut self) -> Result<Resource, CheckError> {
        match self.config.mode {
            Mode::Health => {
                let mut resource = self.check_health()?;
                // The probe already answered, the statistics only add performance data.
                if let Err(err) = self.add_requested_metrics(&mut resource) {
                    debug!(error = %err, "skipping statistics for health check");
                }
                Ok(resource)
            }
            Mode::Simple(metric) => {
                let mut resource = self.check_simple(metric)?;
                self.add_requested_metrics(&mut resource)?;
                Ok(resource)
            }
        }
    }

    pub fn store(&self) -> &MetricStore<&'a T> {
        &self.store
    }

    fn check_health(&self) -> Result<Resource, CheckError> {
        let url = format!("{}{}", self.config.base_url, HEALTH_PATH);
        let response = self.transport.get(&url)?;
        debug!(status = response.status, "health probe answered");

        if response.is_ok() {
            Ok(Resource::new(ServiceState::Ok, "service is healthy"))
        } else {
            Ok(Resource::new(
                ServiceState::Critical,
                &format!("health check failed ({})", response.status),
            ))
        }
    }

    fn check_simple(&mut self, metric: SimpleMetric) -> Result<Resource, CheckError> {
        let value = self.store.get(metric.name())?;
        let state = self.evaluate(value.as_f64());
        debug!(%metric, %value, %state, "evaluated metric");

        let perf_data = PerfData::new(metric.name(), value.clone())
            .with_thresholds(self.config.warning.clone(), self.config.critical.clone());

        Ok(Resource::new(state, &format!("{value} {metric}")).with_perf_data(perf_data))
    }

    /// Critical is checked first, so it wins when both thresholds alert.
    fn evaluate(&self, value: f64) -> ServiceState {
        if self.config.critical.check(value) {
            ServiceState::Critical
        } else if self.config.warning.check(value) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }

    fn add_requested_metrics(&mut self, resource: &mut Resource) -> Result<(), CheckError> {
        if self.config.all_metrics {
            for (name, value) in self.store.metrics()? {
                resource.push(PerfData::new(&name, value));
            }
        } else if matches!(self.config.mode, Mode::Simple(_)) {
            if self.config.append_metrics.is_empty() {
                return Ok(());
            }

            let snapshot = self.store.snapshot()?;
            for name in &self.config.append_metrics {
                match snapshot.get(name).and_then(MetricValue::from_json) {
                    Some(value) => resource.push(PerfData::new(name, value)),
                    None => debug!(metric = %name, "appended metric not reported"),
                }
            }
        }

        Ok(())
    }
}

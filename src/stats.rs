//! Lazily fetched colibri statistics.
//!
//! See <https://github.com/jitsi/jitsi-videobridge/blob/master/doc/statistics.md> for the
//! document format. The document is fetched at most once per [MetricStore], every access filters
//! out keys which must never show up in a check result.

use serde_json::{Map, Value};
use tracing::debug;

use crate::metric::MetricValue;
use crate::transport::{Transport, TransportError};

pub const STATS_PATH: &str = "/colibri/stats";

/// Keys which are never usable as performance data.
pub const EXCLUDED_METRICS: [&str; 2] = ["conference_sizes", "current_timestamp"];

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Could not fetch colibri stats (HTTP {0})")]
    Status(u16),
    #[error("Could not decode colibri stats: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Could not decode colibri stats: expected a JSON object")]
    NotAnObject,
}

pub struct MetricStore<T> {
    transport: T,
    url: String,
    ignored: Vec<String>,
    snapshot: Option<Map<String, Value>>,
    fetches: usize,
}

impl<T: Transport> MetricStore<T> {
    /// `base_url` is `scheme://host:port` without a trailing slash.
    pub fn new(transport: T, base_url: &str, ignored: Vec<String>) -> Self {
        MetricStore {
            transport,
            url: format!("{}{}", base_url.trim_end_matches('/'), STATS_PATH),
            ignored,
            snapshot: None,
            fetches: 0,
        }
    }

    /// Returns the filtered statistics, fetching them on first use.
    pub fn snapshot(&mut self) -> Result<&Map<String, Value>, StatsError> {
        if self.snapshot.is_none() {
            let fetched = fetch(&self.transport, &self.url)?;
            self.fetches += 1;
            self.snapshot = Some(fetched);
        }

        let ignored = &self.ignored;
        let snapshot = self.snapshot.get_or_insert_with(Map::new);
        snapshot.retain(|key, _| {
            !EXCLUDED_METRICS.contains(&key.as_str()) && !ignored.iter().any(|i| i == key)
        });

        Ok(snapshot)
    }

    /// Returns the value of `name`, or `0` if the bridge does not report it.
    pub fn get(&mut self, name: &str) -> Result<MetricValue, StatsError> {
        Ok(self
            .snapshot()?
            .get(name)
            .and_then(MetricValue::from_json)
            .unwrap_or_default())
    }

    /// All filtered metrics in document order.
    pub fn metrics(&mut self) -> Result<Vec<(String, MetricValue)>, StatsError> {
        Ok(self
            .snapshot()?
            .iter()
            .filter_map(|(k, v)| MetricValue::from_json(v).map(|v| (k.clone(), v)))
            .collect())
    }

    /// How often the document was requested from the bridge.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }
}

fn fetch<T: Transport>(transport: &T, url: &str) -> Result<Map<String, Value>, StatsError> {
    let response = transport.get(url)?;
    if !response.is_ok() {
        return Err(StatsError::Status(response.status));
    }

    let Value::Object(mut document) = serde_json::from_str(&response.body)? else {
        return Err(StatsError::NotAnObject);
    };

    document.retain(|key, value| {
        let usable = MetricValue::from_json(value).is_some();
        if !usable && !EXCLUDED_METRICS.contains(&key.as_str()) {
            debug!(metric = %key, "dropping non-numeric statistic");
        }
        usable
    });
    debug!(metrics = document.len(), "fetched colibri stats");

    Ok(document)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::transport::HttpResponse;

    /// Answers requests from a fixed table and records every requested url.
    #[derive(Default)]
    pub struct FakeTransport {
        responses: HashMap<String, (u16, String)>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        pub fn with(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
            self.responses
                .insert(format!("http://jvb:8080{path}"), (status, body.into()));
            self
        }

        pub fn with_stats(self, stats: Value) -> Self {
            self.with(STATS_PATH, 200, stats.to_string())
        }

        pub fn requested(&self, path: &str) -> usize {
            let url = format!("http://jvb:8080{path}");
            self.requests.borrow().iter().filter(|r| **r == url).count()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(url.to_owned());
            match self.responses.get(url) {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(TransportError::Connect),
            }
        }
    }

    fn sample_stats() -> Value {
        json!({
            "participants": 42,
            "conferences": 3,
            "jitter_aggregate": 0.5,
            "graceful_shutdown": false,
            "conference_sizes": [0, 2, 1],
            "current_timestamp": "2020-04-01 12:00:00.000",
            "videostreams": 7,
        })
    }

    #[test]
    fn test_fetch_once() {
        let transport = FakeTransport::default().with_stats(sample_stats());
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);

        assert_eq!(store.fetch_count(), 0);
        assert_eq!(store.get("participants").unwrap(), MetricValue::from(42));
        assert_eq!(store.get("conferences").unwrap(), MetricValue::from(3));
        assert_eq!(store.get("videostreams").unwrap(), MetricValue::from(7));
        store.metrics().unwrap();
        store.snapshot().unwrap();

        assert_eq!(store.fetch_count(), 1);
        assert_eq!(transport.requested(STATS_PATH), 1);
    }

    #[test]
    fn test_absent_metric_is_zero() {
        let transport = FakeTransport::default().with_stats(sample_stats());
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);

        assert_eq!(store.get("total_no_payload_channels").unwrap(), MetricValue::from(0));
        assert_eq!(store.get("does_not_exist").unwrap().to_string(), "0");
    }

    #[test]
    fn test_filtering() {
        let transport = FakeTransport::default().with_stats(sample_stats());
        let mut store = MetricStore::new(
            &transport,
            "http://jvb:8080/",
            vec!["videostreams".to_owned(), "unknown".to_owned()],
        );

        let names: Vec<String> = store.metrics().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            ["participants", "conferences", "jitter_aggregate", "graceful_shutdown"]
        );

        // filtered keys read as absent
        assert_eq!(store.get("videostreams").unwrap(), MetricValue::from(0));
        assert_eq!(store.get("conference_sizes").unwrap(), MetricValue::from(0));

        // filtering again changes nothing
        let first = store.snapshot().unwrap().clone();
        assert_eq!(store.snapshot().unwrap(), &first);
    }

    #[test]
    fn test_bad_status() {
        let transport = FakeTransport::default().with(STATS_PATH, 500, "oops");
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);

        let err = store.get("participants").unwrap_err();
        assert!(matches!(err, StatsError::Status(500)));
        assert_eq!(err.to_string(), "Could not fetch colibri stats (HTTP 500)");
    }

    #[test]
    fn test_bad_document() {
        let transport = FakeTransport::default().with(STATS_PATH, 200, "not json");
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);
        assert!(matches!(store.snapshot(), Err(StatsError::Decode(_))));

        let transport = FakeTransport::default().with(STATS_PATH, 200, "[1, 2]");
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);
        assert!(matches!(store.snapshot(), Err(StatsError::NotAnObject)));
    }

    /// Counts events at WARN or ERROR level.
    struct LoudEvents(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for LoudEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_non_numeric_fields_are_quiet() {
        let transport = FakeTransport::default().with_stats(json!({
            "participants": 42,
            "conferences_by_audio_senders": [1, 2],
            "version": "2.1",
            "region": { "name": "eu" },
        }));
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);

        let loud = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(LoudEvents(loud.clone()));
        let metrics = tracing::subscriber::with_default(subscriber, || store.metrics().unwrap());

        assert_eq!(metrics, [("participants".to_owned(), MetricValue::from(42))]);
        assert_eq!(loud.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transport_error() {
        let transport = FakeTransport::default();
        let mut store = MetricStore::new(&transport, "http://jvb:8080", vec![]);
        assert!(matches!(
            store.get("participants"),
            Err(StatsError::Transport(TransportError::Connect))
        ));
    }
}

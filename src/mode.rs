use std::fmt;

use clap::builder::PossibleValue;
use clap::ValueEnum;

/// A metric of the colibri statistics which can be checked against thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleMetric {
    Participants,
    Conferences,
    AudioChannels,
    VideoChannels,
    VideoStreams,
    TotalConferencesCompleted,
    TotalConferencesCreated,
    TotalConferencesFailed,
    TotalPartiallyFailedConferences,
    JitterAggregate,
    TotalNoPayloadChannels,
    TotalNoTransportChannels,
}

impl SimpleMetric {
    pub const ALL: [SimpleMetric; 12] = [
        SimpleMetric::Participants,
        SimpleMetric::Conferences,
        SimpleMetric::AudioChannels,
        SimpleMetric::VideoChannels,
        SimpleMetric::VideoStreams,
        SimpleMetric::TotalConferencesCompleted,
        SimpleMetric::TotalConferencesCreated,
        SimpleMetric::TotalConferencesFailed,
        SimpleMetric::TotalPartiallyFailedConferences,
        SimpleMetric::JitterAggregate,
        SimpleMetric::TotalNoPayloadChannels,
        SimpleMetric::TotalNoTransportChannels,
    ];

    /// The key of this metric in the statistics document.
    pub fn name(&self) -> &'static str {
        match self {
            SimpleMetric::Participants => "participants",
            SimpleMetric::Conferences => "conferences",
            SimpleMetric::AudioChannels => "audiochannels",
            SimpleMetric::VideoChannels => "videochannels",
            SimpleMetric::VideoStreams => "videostreams",
            SimpleMetric::TotalConferencesCompleted => "total_conferences_completed",
            SimpleMetric::TotalConferencesCreated => "total_conferences_created",
            SimpleMetric::TotalConferencesFailed => "total_conferences_failed",
            SimpleMetric::TotalPartiallyFailedConferences => "total_partially_failed_conferences",
            SimpleMetric::JitterAggregate => "jitter_aggregate",
            SimpleMetric::TotalNoPayloadChannels => "total_no_payload_channels",
            SimpleMetric::TotalNoTransportChannels => "total_no_transport_channels",
        }
    }
}

impl fmt::Display for SimpleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single invocation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Health,
    Simple(SimpleMetric),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Health => "health",
            Mode::Simple(metric) => metric.name(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static MODES: [Mode; 13] = [
    Mode::Health,
    Mode::Simple(SimpleMetric::Participants),
    Mode::Simple(SimpleMetric::Conferences),
    Mode::Simple(SimpleMetric::AudioChannels),
    Mode::Simple(SimpleMetric::VideoChannels),
    Mode::Simple(SimpleMetric::VideoStreams),
    Mode::Simple(SimpleMetric::TotalConferencesCompleted),
    Mode::Simple(SimpleMetric::TotalConferencesCreated),
    Mode::Simple(SimpleMetric::TotalConferencesFailed),
    Mode::Simple(SimpleMetric::TotalPartiallyFailedConferences),
    Mode::Simple(SimpleMetric::JitterAggregate),
    Mode::Simple(SimpleMetric::TotalNoPayloadChannels),
    Mode::Simple(SimpleMetric::TotalNoTransportChannels),
];

impl ValueEnum for Mode {
    fn value_variants<'a>() -> &'a [Self] {
        &MODES
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.name()))
    }
}

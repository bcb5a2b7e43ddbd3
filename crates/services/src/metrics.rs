use std::time::{Duration, Instant};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Scoring counters exposed on `/metrics`.
#[derive(Clone)]
pub struct ScoringMetrics {
    registry: Registry,
    balls_recorded: IntCounter,
    balls_undone: IntCounter,
    innings_completed: IntCounter,
    boundaries: IntCounter,
    rejected: IntCounterVec,
    apply_latency: Histogram,
}

impl ScoringMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("criclive".to_string()), None)?;

        let balls_recorded = IntCounter::new("balls_recorded_total", "Ball events committed")?;
        let balls_undone = IntCounter::new("balls_undone_total", "Ball events reversed by undo")?;
        let innings_completed = IntCounter::new("innings_completed_total", "Innings that reached completion")?;
        let boundaries = IntCounter::new("boundaries_total", "Fours and sixes struck")?;
        let rejected = IntCounterVec::new(
            Opts::new("rejected_operations_total", "Scoring operations rejected, by error kind"),
            &["reason"],
        )?;
        let apply_latency = Histogram::with_opts(
            HistogramOpts::new("apply_ball_seconds", "Time to validate, commit and announce a ball")
                .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]),
        )?;

        registry.register(Box::new(balls_recorded.clone()))?;
        registry.register(Box::new(balls_undone.clone()))?;
        registry.register(Box::new(innings_completed.clone()))?;
        registry.register(Box::new(boundaries.clone()))?;
        registry.register(Box::new(rejected.clone()))?;
        registry.register(Box::new(apply_latency.clone()))?;

        Ok(Self {
            registry,
            balls_recorded,
            balls_undone,
            innings_completed,
            boundaries,
            rejected,
            apply_latency,
        })
    }

    pub fn record_ball(&self, is_boundary: bool, elapsed: Duration) {
        self.balls_recorded.inc();
        if is_boundary {
            self.boundaries.inc();
        }
        self.apply_latency.observe(elapsed.as_secs_f64());
    }

    pub fn record_undo(&self) {
        self.balls_undone.inc();
    }

    pub fn record_innings_completed(&self) {
        self.innings_completed.inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.rejected.with_label_values(&[reason]).inc();
    }

    pub fn balls_recorded(&self) -> u64 {
        self.balls_recorded.get()
    }

    pub fn balls_undone(&self) -> u64 {
        self.balls_undone.get()
    }

    pub fn rejections(&self, reason: &str) -> u64 {
        self.rejected.with_label_values(&[reason]).get()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Measures one operation from construction to `elapsed`.
pub struct LatencyTracker {
    start_time: Instant,
}

impl LatencyTracker {
    pub fn start() -> Self {
        Self { start_time: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

//! # Bridge Module
//!
//! Periodically encodes telemetry into GDL-90 messages and sends them.
//!
//! Three independent schedules run side by side:
//! - Heartbeat at `heartbeat_rate`
//! - Ownship Report at `position_rate`
//! - Traffic Reports at `traffic_rate`, one datagram per target
//!
//! Send failures are logged and counted but never stop the loop; the next
//! tick simply tries again.

use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::capture::{format_hex, CaptureWriter};
use crate::config::{RatesConfig, MAX_TRAFFIC_TARGETS};
use crate::gdl90::encoder::{Gdl90Encoder, SystemClock, UtcClock};
use crate::gdl90::protocol::{
    message_name, MSG_ID_HEARTBEAT, MSG_ID_OWNSHIP_REPORT, MSG_ID_TRAFFIC_REPORT,
};
use crate::telemetry::TelemetrySource;
use crate::transport::DatagramSink;

/// How often running totals are logged
pub const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Counters for one bridge run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub heartbeats_sent: u64,
    pub ownship_reports_sent: u64,
    pub traffic_reports_sent: u64,
    pub send_errors: u64,
    pub capture_errors: u64,

    /// Frames written to the capture file, 0 when capture is off
    pub frames_captured: u64,
}

impl BridgeStats {
    /// Datagrams successfully sent, all message kinds
    pub fn total_sent(&self) -> u64 {
        self.heartbeats_sent + self.ownship_reports_sent + self.traffic_reports_sent
    }
}

/// Period between messages for a rate in Hz
///
/// Rates are validated positive at load time; anything else falls back to
/// once per second.
pub fn period_for_rate(rate_hz: f32) -> Duration {
    if rate_hz.is_finite() && rate_hz > 0.0 {
        Duration::from_secs_f64(1.0 / rate_hz as f64)
    } else {
        Duration::from_secs(1)
    }
}

/// Encodes telemetry and pushes frames to a datagram sink
pub struct Bridge<S, T, C = SystemClock>
where
    S: DatagramSink,
    T: TelemetrySource,
    C: UtcClock,
{
    encoder: Gdl90Encoder<C>,
    sink: S,
    source: T,
    capture: Option<CaptureWriter>,
    rates: RatesConfig,
    log_messages: bool,
    gps_valid: bool,
    stats: BridgeStats,
}

impl<S, T, C> Bridge<S, T, C>
where
    S: DatagramSink,
    T: TelemetrySource,
    C: UtcClock,
{
    /// Create a bridge
    ///
    /// # Arguments
    ///
    /// * `encoder` - GDL-90 encoder (its clock stamps heartbeats)
    /// * `sink` - Where frames are sent
    /// * `source` - Where ownship and traffic positions come from
    /// * `rates` - Message rates in Hz
    pub fn new(encoder: Gdl90Encoder<C>, sink: S, source: T, rates: &RatesConfig) -> Self {
        Self {
            encoder,
            sink,
            source,
            capture: None,
            rates: rates.clone(),
            log_messages: false,
            gps_valid: false,
            stats: BridgeStats::default(),
        }
    }

    /// Record every sent frame to `capture`
    pub fn with_capture(mut self, capture: CaptureWriter) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Log a hex dump of every sent frame at DEBUG
    pub fn with_message_logging(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            frames_captured: self.capture.as_ref().map_or(0, CaptureWriter::records),
            ..self.stats
        }
    }

    /// Send one Heartbeat
    ///
    /// The GPS-valid flag reflects whether the last ownship poll produced a
    /// position.
    pub async fn send_heartbeat(&mut self) {
        let frame = self.encoder.create_heartbeat(self.gps_valid, true);

        if self.transmit(MSG_ID_HEARTBEAT, &frame).await {
            self.stats.heartbeats_sent += 1;
        }
    }

    /// Poll the ownship position and send an Ownship Report
    ///
    /// Nothing is sent when the source has no position.
    pub async fn send_ownship(&mut self) {
        let Some(data) = self.source.ownship() else {
            if self.gps_valid {
                warn!("Ownship position lost");
            }
            self.gps_valid = false;
            return;
        };

        if !self.gps_valid {
            info!("Ownship position acquired");
        }
        self.gps_valid = true;

        let frame = self.encoder.create_ownship_report(&data);
        if self.transmit(MSG_ID_OWNSHIP_REPORT, &frame).await {
            self.stats.ownship_reports_sent += 1;
        }
    }

    /// Poll traffic and send one Traffic Report per target
    pub async fn send_traffic(&mut self) {
        let targets = self.source.traffic();

        if targets.len() > MAX_TRAFFIC_TARGETS {
            debug!(
                "Dropping {} traffic targets over the limit of {}",
                targets.len() - MAX_TRAFFIC_TARGETS,
                MAX_TRAFFIC_TARGETS
            );
        }

        for target in targets.iter().take(MAX_TRAFFIC_TARGETS) {
            let frame = self.encoder.create_traffic_report(target);
            if self.transmit(MSG_ID_TRAFFIC_REPORT, &frame).await {
                self.stats.traffic_reports_sent += 1;
            }
        }
    }

    /// Send one frame, returning whether the whole datagram went out
    async fn transmit(&mut self, message_id: u8, frame: &[u8]) -> bool {
        if self.log_messages {
            debug!(
                "TX {} ({} bytes): {}",
                message_name(message_id),
                frame.len(),
                format_hex(frame)
            );
        }

        if let Some(capture) = self.capture.as_mut() {
            if let Err(e) = capture.record(frame) {
                warn!("Failed to capture frame: {}", e);
                self.stats.capture_errors += 1;
            }
        }

        match self.sink.send(frame).await {
            Ok(sent) if sent == frame.len() => true,
            Ok(sent) => {
                warn!(
                    "Short send of {}: {} of {} bytes",
                    message_name(message_id),
                    sent,
                    frame.len()
                );
                self.stats.send_errors += 1;
                false
            }
            Err(e) => {
                debug!("Failed to send {}: {}", message_name(message_id), e);
                self.stats.send_errors += 1;
                false
            }
        }
    }

    /// Run all schedules until `shutdown` completes
    ///
    /// # Returns
    ///
    /// * `BridgeStats` - Totals for the whole run
    pub async fn run<F>(mut self, shutdown: F) -> BridgeStats
    where
        F: Future<Output = ()>,
    {
        let mut heartbeat_interval = interval(period_for_rate(self.rates.heartbeat_rate));
        let mut ownship_interval = interval(period_for_rate(self.rates.position_rate));
        let mut traffic_interval = interval(period_for_rate(self.rates.traffic_rate));
        let mut status_interval = interval(STATUS_LOG_INTERVAL);

        for ticker in [
            &mut heartbeat_interval,
            &mut ownship_interval,
            &mut traffic_interval,
            &mut status_interval,
        ] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        // The status log would otherwise fire immediately
        status_interval.reset();

        info!(
            "Starting GDL-90 output: heartbeat {}Hz, ownship {}Hz, traffic {}Hz",
            self.rates.heartbeat_rate, self.rates.position_rate, self.rates.traffic_rate
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutting down GDL-90 output");
                    break;
                }

                _ = heartbeat_interval.tick() => self.send_heartbeat().await,

                _ = ownship_interval.tick() => self.send_ownship().await,

                _ = traffic_interval.tick() => self.send_traffic().await,

                _ = status_interval.tick() => {
                    info!(
                        "Sent {} heartbeats, {} ownship reports, {} traffic reports ({} send errors)",
                        self.stats.heartbeats_sent,
                        self.stats.ownship_reports_sent,
                        self.stats.traffic_reports_sent,
                        self.stats.send_errors
                    );
                }
            }
        }

        self.stats()
    }
}

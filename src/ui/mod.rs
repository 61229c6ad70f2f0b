// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! UI module - headless status board

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::aggregate::DeviceSnapshot;
use crate::core::Monitor;
use crate::sensors::SensorType;
use crate::status::Status;

/// Text table of device statuses, one row per device
#[derive(Debug, Clone)]
pub struct StatusBoard {
    sensors: Vec<SensorType>,
    colors: Vec<(Status, String)>,
}

impl StatusBoard {
    /// `sensors` are the per-sensor columns, `colors` the legend
    pub fn new(sensors: Vec<SensorType>, colors: Vec<(Status, String)>) -> Self {
        Self { sensors, colors }
    }

    pub fn render(&self, devices: &[DeviceSnapshot], now: DateTime<Utc>) -> String {
        Board {
            layout: self,
            devices,
            now,
        }
        .to_string()
    }
}

struct Board<'a> {
    layout: &'a StatusBoard,
    devices: &'a [DeviceSnapshot],
    now: DateTime<Utc>,
}

impl fmt::Display for Board<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject_w = column_width("SUBJECT", self.devices.iter().map(|d| d.identity.subject_id.len()));
        let source_w = column_width("SOURCE", self.devices.iter().map(|d| d.identity.source_id.len()));

        write!(
            f,
            "{:<subject_w$}  {:<source_w$}  {:<12}  {:>7}",
            "SUBJECT", "SOURCE", "STATUS", "BATTERY"
        )?;
        for sensor in &self.layout.sensors {
            write!(f, "  {:<12}", sensor.abbrev())?;
        }
        writeln!(f, "  LAST SEEN")?;

        for device in self.devices {
            let battery = device
                .battery_level
                .map(|b| format!("{:.0}%", b * 100.0))
                .unwrap_or_else(|| "-".to_string());
            write!(
                f,
                "{:<subject_w$}  {:<source_w$}  {:<12}  {:>7}",
                device.identity.subject_id,
                device.identity.source_id,
                device.priority_status.label(),
                battery
            )?;
            for sensor in &self.layout.sensors {
                let status = device
                    .meta(*sensor)
                    .map(|m| m.status)
                    .unwrap_or(Status::NotAvailable);
                write!(f, "  {:<12}", status.label())?;
            }
            writeln!(f, "  {}", format_age(device.latest_age(self.now)))?;
        }

        if self.devices.is_empty() {
            writeln!(f, "(no devices to show)")?;
        }

        let legend: Vec<String> = self
            .layout
            .colors
            .iter()
            .map(|(status, color)| format!("{}={}", status, color))
            .collect();
        write!(f, "legend: {}", legend.join(" "))
    }
}

fn column_width(header: &str, values: impl Iterator<Item = usize>) -> usize {
    values.fold(header.len(), usize::max)
}

/// Compact age such as `42s`, `3m07s` or `2h15m`; `-` when never seen
pub fn format_age(age: Option<Duration>) -> String {
    let Some(age) = age else {
        return "-".to_string();
    };
    let secs = age.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m{:02}s", s / 60, s % 60),
        s => format!("{}h{:02}m", s / 3600, (s % 3600) / 60),
    }
}

/// Redraw the board every `render_refresh` until the monitor stops
pub async fn run_console(monitor: Arc<Monitor>, show_all: bool) {
    let board = StatusBoard::new(
        monitor.config().monitor.aggregate_sensors.clone(),
        monitor.status_colors(),
    );
    let refresh = monitor.config().monitor.render_refresh();
    let stop = monitor.stop_signal();

    info!("Starting status board (refresh {:?})...", refresh);
    while !stop.is_stopped() {
        let now = Utc::now();
        let devices = monitor.devices_at(now, show_all);
        println!("{}\n", board.render(&devices, now));
        debug!("Rendered {} of {} devices", devices.len(), monitor.device_count());

        if !stop.sleep(refresh).await {
            break;
        }
    }
    info!("Status board stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeviceIdentity;
    use crate::sensors::{Payload, Sample, SensorMeta};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 6, 1, 12, 0, 0).unwrap()
    }

    fn snapshot(subject: &str, status: Status, battery: Option<f64>, minutes_ago: Option<i64>) -> DeviceSnapshot {
        let mut acc = SensorMeta::new(SensorType::Accelerometer);
        acc.status = status;
        if let Some(m) = minutes_ago {
            let ts = now() - Duration::minutes(m);
            acc.last_sample = Some(Sample::new(
                ts,
                SensorType::Accelerometer,
                Payload::Vector { x: 0.0, y: 0.0, z: 1.0 },
            ));
            acc.last_timestamp = Some(ts);
        }

        DeviceSnapshot {
            identity: DeviceIdentity::new(subject, "00:07:80:1F:52:F3"),
            raw_source_id: "00:07:80:1F:52:F3".into(),
            priority_status: status,
            battery_level: battery,
            latest_timestamp: minutes_ago.map(|m| now() - Duration::minutes(m)),
            sensors: vec![acc],
        }
    }

    fn board() -> StatusBoard {
        StatusBoard::new(
            vec![SensorType::Accelerometer, SensorType::Battery],
            vec![(Status::Good, "lightgreen".into()), (Status::Critical, "red".into())],
        )
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(None), "-");
        assert_eq!(format_age(Some(Duration::seconds(42))), "42s");
        assert_eq!(format_age(Some(Duration::seconds(187))), "3m07s");
        assert_eq!(format_age(Some(Duration::minutes(135))), "2h15m");
        assert_eq!(format_age(Some(Duration::seconds(-5))), "0s");
    }

    #[test]
    fn test_render_rows() {
        let devices = vec![
            snapshot("UKLFR", Status::Warning, Some(0.42), Some(4)),
            snapshot("UKLFR-LONG-SUBJECT", Status::Good, None, None),
        ];
        let text = board().render(&devices, now());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("SUBJECT"));
        assert!(lines[0].contains("ACC"));
        assert!(lines[0].contains("BAT"));
        assert!(lines[1].contains("WARNING"));
        assert!(lines[1].contains("42%"));
        assert!(lines[1].ends_with("4m00s"));
        // sensor without metadata renders as N/A
        assert!(lines[2].contains("N/A"));
        assert!(lines[2].ends_with("-"));
        assert_eq!(lines[3], "legend: GOOD=lightgreen CRITICAL=red");
    }

    #[test]
    fn test_columns_align() {
        let devices = vec![
            snapshot("A", Status::Good, Some(0.9), Some(0)),
            snapshot("LONGER-SUBJECT", Status::Ok, Some(0.2), Some(2)),
        ];
        let text = board().render(&devices, now());
        let offsets: Vec<usize> = text
            .lines()
            .take(3)
            .map(|l| l.find("00:07").or_else(|| l.find("SOURCE")).unwrap())
            .collect();
        assert!(offsets.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_render_empty_board() {
        let text = board().render(&[], now());
        assert!(text.contains("(no devices to show)"));
    }
}

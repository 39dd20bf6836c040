//! Writers for simulation results
//!
//! These only read the history and the report; nothing flows back into the
//! engine.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::simulation::{PerformanceReport, StatsSnapshot};

/// One CSV row: a road as seen at the end of one tick
#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    tick: u64,
    time: f64,
    road: &'a str,
    vehicle_count: usize,
    mean_speed: f64,
    density: f64,
    occupancy: f64,
    congestion_index: f64,
    network_vehicles: usize,
    network_mean_speed: f64,
}

/// Write one row per (tick, road) to `path`
pub fn write_history_csv(path: impl AsRef<Path>, history: &[StatsSnapshot]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for snapshot in history {
        for road in &snapshot.roads {
            writer.serialize(HistoryRow {
                tick: snapshot.tick,
                time: snapshot.time,
                road: &road.name,
                vehicle_count: road.vehicle_count,
                mean_speed: road.mean_speed,
                density: road.density,
                occupancy: road.occupancy,
                congestion_index: road.congestion_index(),
                network_vehicles: snapshot.total_vehicles,
                network_mean_speed: snapshot.mean_speed,
            })?;
        }
    }

    writer.flush()?;
    info!("History written to {}", path.display());
    Ok(())
}

/// Write the performance report as pretty-printed JSON
pub fn write_report_json(path: impl AsRef<Path>, report: &PerformanceReport) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Write `history.csv` and `report.json` into `dir`, creating it if needed
pub fn export_all(
    dir: impl AsRef<Path>,
    history: &[StatsSnapshot],
    report: &PerformanceReport,
) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let csv_path = dir.join("history.csv");
    let json_path = dir.join("report.json");
    write_history_csv(&csv_path, history)?;
    write_report_json(&json_path, report)?;
    Ok((csv_path, json_path))
}

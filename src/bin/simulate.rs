use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};
use pacman_smash_engine::clock::ManualClock;
use pacman_smash_engine::config::EngineConfig;
use pacman_smash_engine::constants::{SPEED_MULTIPLIER_MAX, SPEED_MULTIPLIER_MIN, TICK_MS};
use pacman_smash_engine::engine::{GameEngine, GameEngineOptions};
use pacman_smash_engine::types::{AiStats, RuntimeEvent, ScoreEntry, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const GHOST_HISTORY_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Simulated match length.
    #[arg(long, default_value_t = 120)]
    seconds: u64,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = TICK_MS)]
    tick_ms: u64,
    /// JSON engine config; missing fields fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    aggression: Option<f32>,
    #[arg(long)]
    chaos: Option<f32>,
    #[arg(long)]
    fairness: Option<f32>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Debug, Serialize)]
struct MatchResultLine {
    seed: u32,
    seconds: u64,
    #[serde(rename = "tickMs")]
    tick_ms: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    ticks: u64,
    ranking: Vec<ScoreEntry>,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "pelletsRespawned")]
    pellets_respawned: usize,
    #[serde(rename = "powerUps")]
    power_ups: u32,
    catches: u32,
    #[serde(rename = "pelletsRemaining")]
    pellets_remaining: usize,
    completion: f32,
    #[serde(rename = "aiStats")]
    ai_stats: AiStats,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    message: String,
    #[serde(rename = "firstTick")]
    first_tick: u64,
    #[serde(rename = "lastTick")]
    last_tick: u64,
    occurrences: u32,
}

/// Invariant breaches folded per message: a breach that persists across
/// ticks becomes one record with its first and last tick.
#[derive(Clone, Debug, Default)]
struct AnomalyLog {
    records: Vec<AnomalyRecord>,
}

impl AnomalyLog {
    fn record(&mut self, tick: u64, message: String) {
        match self.records.iter_mut().find(|r| r.message == message) {
            Some(existing) => {
                existing.last_tick = tick;
                existing.occurrences += 1;
            }
            None => self.records.push(AnomalyRecord {
                message,
                first_tick: tick,
                last_tick: tick,
                occurrences: 1,
            }),
        }
    }

    fn messages(&self) -> Vec<String> {
        self.records.iter().map(|r| r.message.clone()).collect()
    }

    fn occurrences(&self) -> usize {
        self.records.iter().map(|r| r.occurrences as usize).sum()
    }
}

#[derive(Clone, Debug, Serialize)]
struct MatchRunResult {
    #[serde(flatten)]
    result: MatchResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    #[serde(rename = "anomalyOccurrences")]
    anomaly_occurrences: usize,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "generatedAt")]
    generated_at: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    result: MatchResultLine,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Renders engine log records as structured JSON lines on stderr.
struct StructuredLogger {
    match_id: String,
    seed: u32,
    level: LevelFilter,
}

impl Log for StructuredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        emit_log(
            level_name(record.level()),
            "engine_log",
            &self.match_id,
            Some(self.seed),
            None,
            json!({
                "target": record.target(),
                "message": record.args().to_string(),
            }),
        );
    }

    fn flush(&self) {}
}

fn main() {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let run_started_at_ms = now_ms();
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, run_started_at_ms));

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let logger = StructuredLogger {
        match_id: match_id.clone(),
        seed,
        level,
    };
    if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
        log::set_max_level(level);
    }

    let config = match cli.config.as_deref() {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(error) => {
                emit_log(
                    "error",
                    "config_load_failed",
                    &match_id,
                    Some(seed),
                    None,
                    json!({
                        "path": path.to_string_lossy(),
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        },
        None => EngineConfig::default(),
    };

    emit_log(
        "info",
        "match_started",
        &match_id,
        Some(seed),
        None,
        json!({
            "seconds": cli.seconds,
            "tickMs": cli.tick_ms,
            "aggression": cli.aggression,
            "chaos": cli.chaos,
            "fairness": cli.fairness,
        }),
    );

    let run = run_match(&cli, config, seed);
    for anomaly in &run.anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &match_id,
            Some(seed),
            Some(anomaly.first_tick),
            json!({
                "message": anomaly.message,
                "lastTick": anomaly.last_tick,
                "occurrences": anomaly.occurrences,
            }),
        );
    }

    match serde_json::to_string(&run.result) {
        Ok(line) => println!("{line}"),
        Err(error) => {
            emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(seed),
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    }

    let summary = RunSummary {
        match_id: match_id.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        started_at_ms: run_started_at_ms,
        finished_at_ms: now_ms(),
        anomaly_count: run.anomaly_occurrences,
        result: run.result.clone(),
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                Some(seed),
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "match_finished",
        &match_id,
        Some(seed),
        Some(run.result.ticks),
        json!({
            "durationMs": run.result.duration_ms,
            "anomalyCount": summary.anomaly_count,
            "summaryOut": summary_out_written,
        }),
    );

    if !run.result.anomalies.is_empty() {
        std::process::exit(1);
    }
}

fn run_match(cli: &Cli, config: EngineConfig, seed: u32) -> MatchRunResult {
    let message_capacity = config.players.message_capacity;
    let mut engine = GameEngine::new(
        config,
        GameEngineOptions {
            seed,
            bots: [true, true],
        },
        ManualClock::starting_at(0),
    );
    engine.adjust_personality(cli.aggression, cli.chaos, cli.fairness);

    let tick_ms = cli.tick_ms.max(1);
    let total_ticks = cli.seconds.saturating_mul(1_000) / tick_ms;

    let mut pellets_eaten = 0u32;
    let mut pellets_respawned = 0usize;
    let mut power_ups = 0u32;
    let mut catches = 0u32;
    let mut anomalies = AnomalyLog::default();

    for _ in 0..total_ticks {
        engine.clock_mut().advance(tick_ms);
        engine.step();
        let snapshot = engine.build_snapshot(true);

        let mut found = collect_snapshot_anomalies(&snapshot, message_capacity);
        for ghost in engine.ghosts().ghosts() {
            let history = ghost.history().count();
            if history > GHOST_HISTORY_LIMIT {
                found.push(format!("ghost {} history too long: {history}", ghost.id));
            }
        }
        for message in found {
            anomalies.record(snapshot.tick, message);
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PelletCollected { .. } => pellets_eaten += 1,
                RuntimeEvent::PelletsRespawned { count } => pellets_respawned += count,
                RuntimeEvent::PowerUpCollected { .. } => power_ups += 1,
                RuntimeEvent::PlayerCaught { .. } => catches += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    MatchRunResult {
        result: MatchResultLine {
            seed,
            seconds: cli.seconds,
            tick_ms,
            duration_ms: summary.duration_ms,
            ticks: engine.tick_count(),
            ranking: summary.ranking,
            pellets_eaten,
            pellets_respawned,
            power_ups,
            catches,
            pellets_remaining: summary.pellets_remaining,
            completion: (summary.completion * 10.0).round() / 10.0,
            ai_stats: summary.ai_stats,
            anomalies: anomalies.messages(),
        },
        anomaly_occurrences: anomalies.occurrences(),
        anomaly_records: anomalies.records,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, message_capacity: usize) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !snapshot.completion.is_finite() || !(0.0..=100.0).contains(&snapshot.completion) {
        anomalies.push(format!("invalid completion: {}", snapshot.completion));
    }
    for ghost in &snapshot.ghosts {
        if !(SPEED_MULTIPLIER_MIN..=SPEED_MULTIPLIER_MAX).contains(&ghost.speed_multiplier) {
            anomalies.push(format!(
                "ghost speed multiplier out of range: {} {}",
                ghost.id, ghost.speed_multiplier
            ));
        }
    }
    for player in &snapshot.players {
        if player.score < 0 {
            anomalies.push(format!("negative score: {} {}", player.id, player.score));
        }
    }
    if snapshot.messages.len() > message_capacity {
        anomalies.push(format!(
            "message log overflow: {} > {message_capacity}",
            snapshot.messages.len()
        ));
    }
    anomalies
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

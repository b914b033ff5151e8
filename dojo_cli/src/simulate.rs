use std::{fs, path::Path};

use anyhow::Context;
use dojo_core::gameplay::session::TapOutcome;
use dojo_core::input::events::InputEvent;
use dojo_core::store::OffsetStore;
use dojo_core::time::{AudioClock, ManualClock};
use dojo_core::trainer::{Response, Trainer};
use dojo_core::DojoResult;
use dojo_schema::{SessionReport, SessionSettings};
use serde::Deserialize;

/// Scripted session: tap times are seconds after the start request.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub settings: SessionSettings,
    #[serde(default)]
    pub taps: Vec<f64>,
    /// Stop request, seconds after start. Without it the session runs out.
    #[serde(default)]
    pub stop_at: Option<f64>,
}

pub struct TapLine {
    pub time: f64,
    pub outcome: TapOutcome,
}

pub struct ScriptRun {
    pub taps: Vec<TapLine>,
    pub clicks: usize,
    pub report: SessionReport,
}

pub fn load_script(path: &Path) -> anyhow::Result<Script> {
    let bytes = fs::read(path).with_context(|| format!("failed to read script: {}", path.display()))?;
    let script: Script = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse script json: {}", path.display()))?;
    Ok(script)
}

pub fn run_script<S: OffsetStore>(script: &Script, settings: SessionSettings, store: S) -> DojoResult<ScriptRun> {
    let clock = ManualClock::new(0.0);
    let tick = settings.tick_secs();
    let mut trainer = Trainer::new(clock.clone(), store, settings)?;
    trainer.start();

    let mut taps: Vec<f64> = script.taps.iter().copied().filter(|t| t.is_finite()).collect();
    taps.sort_by(|a, b| a.total_cmp(b));
    let mut pending = taps.into_iter().peekable();

    let mut lines = Vec::new();
    let mut clicks = 0;
    let mut step: u64 = 0;
    while trainer.session().is_running() {
        let now = step as f64 * tick;

        if script.stop_at.is_some_and(|stop| stop <= now) {
            clock.set(now);
            trainer.handle(InputEvent::Stop)?;
            break;
        }

        // Taps are delivered between ticks, in time order.
        while let Some(&tap) = pending.peek() {
            if tap > now || !trainer.session().is_running() {
                break;
            }
            pending.next();
            clock.set(tap);
            if let Response::Tap(outcome) = trainer.handle(InputEvent::Tap { timestamp: tap })? {
                lines.push(TapLine { time: tap, outcome });
            }
        }

        clock.set(now);
        clicks += trainer.tick();
        step += 1;
    }

    log::info!("script finished at {:.3}s with {} clicks", trainer.clock().now(), clicks);
    Ok(ScriptRun {
        taps: lines,
        clicks,
        report: trainer.report(),
    })
}

pub fn print_table(run: &ScriptRun) {
    println!("Time(s)  | Target | Result      | Error(ms)");
    println!("---------|--------|-------------|----------");
    for line in &run.taps {
        let (target, result, error) = match &line.outcome {
            TapOutcome::Judged(j) => {
                let label = if j.duplicate { "MISS (dup)" } else { j.tier.label() };
                (j.target.index.to_string(), label.to_string(), format_error(j.error_ms))
            }
            TapOutcome::CountIn { beats_remaining } => ("-".to_string(), format!("count-in {beats_remaining}"), "-".to_string()),
            TapOutcome::CalibrationSample { error_ms, collected } => {
                ("-".to_string(), format!("calib {collected}"), format_error(Some(*error_ms)))
            }
            TapOutcome::Calibrated { error_ms, offset_ms } => {
                ("-".to_string(), format!("offset {}", offset_ms.round()), format_error(Some(*error_ms)))
            }
            TapOutcome::SessionOver => ("-".to_string(), "over".to_string(), "-".to_string()),
            TapOutcome::Ignored => ("-".to_string(), "ignored".to_string(), "-".to_string()),
        };
        println!("{:8.3} | {:>6} | {:<11} | {}", line.time, target, result, error);
    }
    let r = &run.report;
    println!(
        "clicks={} score={} max_combo={} judged={} accuracy={} offset_ms={}",
        run.clicks,
        r.score,
        r.max_combo,
        r.judged_taps,
        r.stats
            .accuracy_pct
            .map(|a| format!("{a:.1}%"))
            .unwrap_or_else(|| "--".to_string()),
        r.latency_offset_ms.round()
    );
}

fn format_error(error_ms: Option<f64>) -> String {
    match error_ms {
        Some(e) => format!("{e:+.1}"),
        None => "--".to_string(),
    }
}

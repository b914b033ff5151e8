use std::{
    io::{self, BufRead, Write},
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use atomic_float::AtomicF64;
use dojo_core::audio::click_track::ClickTrack;
use dojo_core::gameplay::session::{SessionView, TapOutcome};
use dojo_core::input::events::InputEvent;
use dojo_core::input::InputQueue;
use dojo_core::store::JsonFileStore;
use dojo_core::time::conductor::Conductor;
use dojo_core::time::{AudioClock, SystemClock};
use dojo_core::trainer::{Response, Trainer};
use dojo_schema::{SessionReport, SessionSettings};

const AUDIO_PERIOD: Duration = Duration::from_millis(5);
const STATUS_PERIOD: Duration = Duration::from_millis(250);

pub fn play(settings: SessionSettings, store_path: &Path) -> anyhow::Result<SessionReport> {
    let (mut track, click_handle) = ClickTrack::new();
    let clock = SystemClock::new(click_handle);
    let tick = Duration::from_millis(settings.tick_ms);
    let mut trainer = Trainer::new(clock.clone(), JsonFileStore::new(store_path), settings)
        .context("failed to initialize the audio clock")?;

    // Audio side: publishes its position and plays due clicks as terminal lines.
    let audio_time = Arc::new(AtomicF64::new(0.0));
    let running = Arc::new(AtomicBool::new(true));
    let audio = {
        let clock = clock.clone();
        let audio_time = audio_time.clone();
        let running = running.clone();
        thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                let now = clock.now();
                audio_time.store(now, Ordering::Release);
                for click in track.drain_due(now) {
                    let mark = if click.accented { "TOCK" } else { "tick" };
                    println!("\x07  {mark}  ({:.0} Hz)", click.frequency_hz);
                }
                thread::sleep(AUDIO_PERIOD);
            }
        })
    };

    let queue = InputQueue::new();
    let sender = queue.sender();
    let input_clock = clock.clone();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = if line.trim().eq_ignore_ascii_case("q") {
                InputEvent::Stop
            } else {
                InputEvent::Tap {
                    timestamp: input_clock.now(),
                }
            };
            if sender.send(event).is_err() {
                break;
            }
        }
    });

    let render_origin = Instant::now();
    let mut conductor = Conductor::new(audio_time);
    let mut last_status = Instant::now();

    trainer.start();
    println!("{}", trainer.view().message);
    loop {
        while let Some(event) = queue.pop() {
            match trainer.handle(event)? {
                Response::Tap(outcome) => print_tap(&outcome),
                Response::Stopped => println!("stopped"),
                _ => {}
            }
        }
        trainer.tick();
        if !trainer.session().is_running() {
            break;
        }

        let render_now = render_origin.elapsed().as_secs_f64();
        conductor.update(render_now);
        if last_status.elapsed() >= STATUS_PERIOD {
            let view = trainer.session().view(conductor.get_time(render_now));
            print_status(&view);
            last_status = Instant::now();
        }
        thread::sleep(tick);
    }

    running.store(false, Ordering::Release);
    let _ = audio.join();
    println!("{}", trainer.view().message);
    Ok(trainer.report())
}

fn print_tap(outcome: &TapOutcome) {
    match outcome {
        TapOutcome::Judged(j) => match j.error_ms {
            Some(e) => println!("{:<8} {e:+.0} ms", j.tier.label()),
            None => println!("{:<8} (same beat twice)", j.tier.label()),
        },
        TapOutcome::CountIn { beats_remaining } => println!("{beats_remaining}..."),
        TapOutcome::CalibrationSample { error_ms, collected } => {
            println!("CALIB {collected:>2}/{}  {error_ms:+.0} ms", dojo_schema::CALIBRATION_SAMPLES)
        }
        TapOutcome::Calibrated { offset_ms, .. } => println!("offset set to {} ms", offset_ms.round()),
        TapOutcome::SessionOver => println!("time is up"),
        TapOutcome::Ignored => {}
    }
}

fn print_status(view: &SessionView) {
    let fmt_opt = |v: Option<f64>| v.map(|x| format!("{x:.0}")).unwrap_or_else(|| "--".to_string());
    print!(
        "\r[{}] {:>5.1}s left  score {}  combo {} (max {})  mean {}  std {}  acc {}  offset {:.0}ms   ",
        view.label,
        view.remaining_secs,
        view.score,
        view.combo,
        view.max_combo,
        fmt_opt(view.stats.mean_ms),
        fmt_opt(view.stats.std_ms),
        fmt_opt(view.stats.accuracy_pct),
        view.latency_offset_ms
    );
    let _ = io::stdout().flush();
}

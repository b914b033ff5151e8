use std::{env, fs, path::PathBuf, process::Command};

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn temp_file(name: &str, ext: &str) -> PathBuf {
    env::temp_dir().join(format!("rhythm_dojo_cli_{}_{}.{}", name, std::process::id(), ext))
}

fn run_dojo(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dojo")).args(args).output().unwrap()
}

#[test]
fn run_script_prints_report_json() {
    let script = temp_file("report", "json");
    // Count-in ends at 0.2 + 3 * 0.6 = 2.0s; taps are 5, 5 and 10 ms late.
    fs::write(
        &script,
        r#"{
  "settings": { "bpm": 100, "pattern": "quarter", "difficulty": "hard", "duration_secs": 2 },
  "taps": [2.005, 2.605, 3.21]
}"#,
    )
    .unwrap();

    let output = run_dojo(&["run", script.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["score"], 306);
    assert_eq!(report["max_combo"], 3);
    assert_eq!(report["judged_taps"], 3);
    assert_eq!(report["tier_counts"]["perfect"], 3);
    assert_eq!(report["tier_counts"]["miss"], 0);
    assert_eq!(report["stats"]["accuracy_pct"], 100.0);
    assert_eq!(report["settings"]["difficulty"], "hard");

    let _ = fs::remove_file(&script);
}

#[test]
fn run_without_taps_reports_no_data() {
    let script = temp_file("silent", "json");
    fs::write(&script, r#"{ "settings": { "duration_secs": 30 } }"#).unwrap();

    let output = run_dojo(&["run", script.to_str().unwrap()]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["score"], 0);
    assert_eq!(report["judged_taps"], 0);
    assert!(report["stats"]["accuracy_pct"].is_null());
    assert!(report["stats"]["mean_ms"].is_null());

    let _ = fs::remove_file(&script);
}

#[test]
fn calibration_run_writes_offset_store() {
    let script = temp_file("calib", "json");
    let store = temp_file("calib_store", "json");
    let _ = fs::remove_file(&store);

    let taps: Vec<String> = (0..20)
        .map(|k| format!("{:.4}", 0.2 + k as f64 * 0.6 + 0.03))
        .collect();
    fs::write(
        &script,
        format!(
            r#"{{ "settings": {{ "mode": "calibration" }}, "taps": [{}] }}"#,
            taps.join(", ")
        ),
    )
    .unwrap();

    let output = run_dojo(&["run", script.to_str().unwrap(), "--store", store.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let saved: serde_json::Value = serde_json::from_slice(&fs::read(&store).unwrap()).unwrap();
    let offset = saved["rhythm-dojo.latency-offset-ms"].as_f64().unwrap();
    assert!((offset + 30.0).abs() < 1e-3, "offset {offset}");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!((report["latency_offset_ms"].as_f64().unwrap() + 30.0).abs() < 1e-3);

    let _ = fs::remove_file(&script);
    let _ = fs::remove_file(&store);
}

#[test]
fn table_output_lists_each_tap() {
    let script = temp_file("table", "json");
    fs::write(
        &script,
        r#"{ "settings": { "duration_secs": 2 }, "taps": [0.5, 2.01, 2.02] }"#,
    )
    .unwrap();

    let output = run_dojo(&["run", script.to_str().unwrap(), "--table"]);
    assert!(output.status.success());

    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("count-in 3"));
    assert!(stdout.contains("PERFECT"));
    assert!(stdout.contains("MISS (dup)"));
    assert!(stdout.contains("judged=2"));

    let _ = fs::remove_file(&script);
}

#[test]
fn flags_override_script_settings_and_coerce_bpm() {
    let script = temp_file("flags", "json");
    fs::write(&script, r#"{ "settings": { "bpm": 140, "duration_secs": 1 } }"#).unwrap();

    let output = run_dojo(&[
        "run",
        script.to_str().unwrap(),
        "--bpm",
        "fast",
        "--pattern",
        "offbeat",
        "--difficulty",
        "insane",
    ]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["settings"]["bpm"], 100.0);
    assert_eq!(report["settings"]["pattern"], "offbeat");
    assert_eq!(report["settings"]["difficulty"], "insane");

    let _ = fs::remove_file(&script);
}

#[test]
fn unknown_pattern_is_rejected() {
    let output = run_dojo(&["run", "whatever.json", "--pattern", "waltz"]);
    assert!(!output.status.success());
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("unknown pattern 'waltz'"));
}

#[test]
fn missing_script_is_reported() {
    let missing = temp_file("missing", "json");
    let _ = fs::remove_file(&missing);

    let output = run_dojo(&["run", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: failed to read script: "));
}

use groove_analyzer::analysis::{
    DescriptorBackend, LevelDescriptors, NativeBackend, StubBackend,
};
use groove_analyzer::audio::AudioBuffer;
use groove_analyzer::batch::{Capabilities, FileOutcome};
use groove_analyzer::error::BackendError;
use groove_analyzer::model::PitchClass;
use groove_analyzer::validation::validate_artifact;
use groove_analyzer::{AnalysisCoordinator, AnalyzerConfig, ReportMode};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SR: u32 = 44_100;

/// Write a 16-bit mono WAV
fn write_wav(path: &Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Steady tone; the stub backend only looks at its length
fn tone(secs: f32, freq: f32) -> Vec<f32> {
    (0..(secs * SR as f32) as usize)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
        .collect()
}

/// Kick-like clicks at `bpm` over a quiet A3/A4 drone
fn click_track(bpm: f64, secs: f64) -> Vec<f32> {
    let beat_samples = (60.0 / bpm * SR as f64) as usize;
    (0..(secs * SR as f64) as usize)
        .map(|i| {
            let t = i as f32 / SR as f32;
            let drone = 0.1 * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
                + 0.1 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            let since_beat = i % beat_samples;
            let click = if since_beat < 400 {
                let decay = (-(since_beat as f32) / 80.0).exp();
                decay * if (i / 7) % 2 == 0 { 0.8 } else { -0.8 }
            } else {
                0.0
            };
            drone + click
        })
        .collect()
}

/// Folder with the given ten-second tone files
fn library(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        write_wav(&dir.path().join(name), &tone(10.0, 220.0));
    }
    dir
}

fn output_of(dir: &TempDir) -> PathBuf {
    dir.path().join("music_analysis.json")
}

fn read_json(path: &Path) -> Vec<Value> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn filenames(records: &[Value]) -> Vec<&str> {
    records.iter().map(|r| r["filename"].as_str().unwrap()).collect()
}

fn sequential(dir: &TempDir) -> AnalyzerConfig {
    AnalyzerConfig::new(output_of(dir)).with_capabilities(Capabilities::none())
}

struct FixedDescriptors;

impl DescriptorBackend for FixedDescriptors {
    fn describe(&self, _audio: &AudioBuffer) -> Result<LevelDescriptors, BackendError> {
        Ok(LevelDescriptors {
            energy: 0.12345,
            loudness: -18.0629,
            danceability: 1.23456,
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[test]
fn test_folder_is_analyzed_in_name_order() {
    let dir = library(&["b.wav", "a.wav"]);
    fs::write(dir.path().join("notes.txt"), b"not audio").unwrap();

    // onsets on every other beat at 128 BPM
    let onsets = (0..12).map(|k| k as f64 * 0.9375).collect();
    let backend = StubBackend::new().with_onsets(onsets);

    let report = AnalysisCoordinator::new(sequential(&dir), backend)
        .run(dir.path())
        .unwrap();

    assert_eq!(report.analyzed, vec!["a.wav", "b.wav"]);
    assert!(report.failed.is_empty());
    assert_eq!(report.total_records, 2);

    let text = fs::read_to_string(output_of(&dir)).unwrap();
    assert!(text.ends_with("]\n"));

    let records = read_json(&output_of(&dir));
    assert_eq!(filenames(&records), vec!["a.wav", "b.wav"]);
    for record in &records {
        assert_eq!(record["bpm"], serde_json::json!(128.0));
        assert_eq!(record["key"], "A");
        assert_eq!(
            record["drum_pattern"],
            serde_json::json!([1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0])
        );
        assert!(record.get("energy").is_none());
    }
}

#[test]
fn test_rerun_skips_everything_and_is_byte_identical() {
    let dir = library(&["a.wav", "b.wav"]);

    AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(dir.path())
        .unwrap();
    let first = fs::read(output_of(&dir)).unwrap();

    // a different key proves nothing was re-analyzed
    let backend = StubBackend::new().with_key(PitchClass::C);
    let report = AnalysisCoordinator::new(sequential(&dir), backend)
        .run(dir.path())
        .unwrap();

    assert!(report.analyzed.is_empty());
    assert_eq!(report.skipped, vec!["a.wav", "b.wav"]);
    assert_eq!(fs::read(output_of(&dir)).unwrap(), first);
}

#[test]
fn test_new_files_are_appended() {
    let dir = library(&["b.wav"]);
    AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(dir.path())
        .unwrap();

    write_wav(&dir.path().join("a.wav"), &tone(10.0, 220.0));
    let backend = StubBackend::new().with_key(PitchClass::DSharp);
    let report = AnalysisCoordinator::new(sequential(&dir), backend)
        .run(dir.path())
        .unwrap();

    assert_eq!(report.analyzed, vec!["a.wav"]);
    assert_eq!(report.skipped, vec!["b.wav"]);

    // existing records keep their place, new ones go at the end
    let records = read_json(&output_of(&dir));
    assert_eq!(filenames(&records), vec!["b.wav", "a.wav"]);
    assert_eq!(records[0]["key"], "A");
    assert_eq!(records[1]["key"], "D#");
}

#[test]
fn test_unreadable_file_is_isolated() {
    let dir = library(&["a.wav", "c.wav"]);
    fs::write(dir.path().join("b.wav"), b"RIFF garbage that is not a wav").unwrap();

    let report = AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(dir.path())
        .unwrap();

    assert_eq!(report.analyzed, vec!["a.wav", "c.wav"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "b.wav");

    let records = read_json(&output_of(&dir));
    assert_eq!(filenames(&records), vec!["a.wav", "c.wav"]);

    // the failed file is retried on the next run
    let report = AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(dir.path())
        .unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn test_parallel_run_matches_sequential() {
    let names = ["e.wav", "a.wav", "d.wav", "b.wav", "c.wav", "f.wav"];
    let seq_dir = library(&names);
    let par_dir = library(&names);

    AnalysisCoordinator::new(sequential(&seq_dir), StubBackend::new())
        .run(seq_dir.path())
        .unwrap();
    let report = AnalysisCoordinator::new(sequential(&par_dir).with_jobs(4), StubBackend::new())
        .run(par_dir.path())
        .unwrap();

    assert_eq!(report.analyzed, vec!["a.wav", "b.wav", "c.wav", "d.wav", "e.wav", "f.wav"]);
    assert_eq!(
        fs::read(output_of(&seq_dir)).unwrap(),
        fs::read(output_of(&par_dir)).unwrap()
    );
}

#[test]
fn test_extended_mode_without_descriptor_capability() {
    let dir = library(&["a.wav"]);
    let config = sequential(&dir).with_report_mode(ReportMode::Extended);

    AnalysisCoordinator::new(config, StubBackend::new())
        .run(dir.path())
        .unwrap();

    let records = read_json(&output_of(&dir));
    let record = &records[0];
    assert!(record["energy"].is_null());
    assert!(record["loudness"].is_null());
    assert!(record["danceability"].is_null());
    assert_eq!(record["spectral_centroid"], serde_json::json!(1500.12));
    assert_eq!(record["spectral_bandwidth"], serde_json::json!(1800.57));
    assert_eq!(record["spectral_rolloff"], serde_json::json!(3200.99));

    let summary = validate_artifact(&output_of(&dir)).unwrap();
    assert!(summary.extended);
    assert_eq!(summary.degraded, 1);
}

#[test]
fn test_extended_mode_with_descriptor_backend() {
    let dir = library(&["a.wav"]);
    let config = AnalyzerConfig::new(output_of(&dir))
        .with_report_mode(ReportMode::Extended)
        .with_capabilities(Capabilities { descriptors: true });

    AnalysisCoordinator::new(config, StubBackend::new())
        .with_descriptor_backend(Some(Box::new(FixedDescriptors)))
        .run(dir.path())
        .unwrap();

    let records = read_json(&output_of(&dir));
    assert_eq!(records[0]["energy"], serde_json::json!(0.123));
    assert_eq!(records[0]["loudness"], serde_json::json!(-18.063));
    assert_eq!(records[0]["danceability"], serde_json::json!(1.235));
}

#[test]
fn test_extended_run_appends_basic_records_to_basic_artifact() {
    let dir = library(&["a.wav"]);
    AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(dir.path())
        .unwrap();

    write_wav(&dir.path().join("b.wav"), &tone(10.0, 220.0));
    let config = AnalyzerConfig::new(output_of(&dir))
        .with_report_mode(ReportMode::Extended)
        .with_capabilities(Capabilities { descriptors: true });
    let report = AnalysisCoordinator::new(config, StubBackend::new())
        .with_descriptor_backend(Some(Box::new(FixedDescriptors)))
        .run(dir.path())
        .unwrap();
    assert_eq!(report.analyzed, vec!["b.wav"]);

    let records = read_json(&output_of(&dir));
    assert_eq!(filenames(&records), ["a.wav", "b.wav"]);
    for record in &records {
        assert_eq!(record.as_object().unwrap().len(), 4);
        assert!(record.get("energy").is_none());
    }

    let summary = validate_artifact(&output_of(&dir)).unwrap();
    assert_eq!(summary.records, 2);
    assert!(!summary.extended);
}

#[test]
fn test_basic_run_appends_extended_records_to_extended_artifact() {
    let dir = library(&["a.wav"]);
    let extended = sequential(&dir).with_report_mode(ReportMode::Extended);
    AnalysisCoordinator::new(extended, StubBackend::new())
        .run(dir.path())
        .unwrap();

    write_wav(&dir.path().join("b.wav"), &tone(10.0, 220.0));
    AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(dir.path())
        .unwrap();

    let records = read_json(&output_of(&dir));
    assert_eq!(filenames(&records), ["a.wav", "b.wav"]);
    assert_eq!(records[1].as_object().unwrap().len(), 10);
    assert!(records[1]["energy"].is_null());
    assert_eq!(records[1]["spectral_centroid"], serde_json::json!(1500.12));

    let summary = validate_artifact(&output_of(&dir)).unwrap();
    assert!(summary.extended);
    assert_eq!(summary.degraded, 2);
}

#[test]
fn test_invalid_path_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let result = AnalysisCoordinator::new(sequential(&dir), StubBackend::new())
        .run(&dir.path().join("missing"));

    assert!(result.is_err());
    assert!(!output_of(&dir).exists());
}

#[test]
fn test_corrupt_artifact_is_fatal_and_untouched() {
    let dir = library(&["a.wav"]);
    fs::write(output_of(&dir), "[{ broken").unwrap();

    let result = AnalysisCoordinator::new(sequential(&dir), StubBackend::new()).run(dir.path());

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(output_of(&dir)).unwrap(), "[{ broken");
}

#[test]
fn test_single_file_input() {
    let dir = library(&["loop.wav", "other.wav"]);
    let out = dir.path().join("results").join("single.json");
    let config = AnalyzerConfig::new(out.clone()).with_capabilities(Capabilities::none());

    let report = AnalysisCoordinator::new(config, StubBackend::new())
        .run(&dir.path().join("loop.wav"))
        .unwrap();

    assert_eq!(report.analyzed, vec!["loop.wav"]);
    assert_eq!(filenames(&read_json(&out)), vec!["loop.wav"]);
}

#[test]
fn test_debug_click_track_is_written_and_not_analyzed() {
    let dir = library(&["a.wav"]);
    let config = sequential(&dir).with_debug(true);

    AnalysisCoordinator::new(config.clone(), StubBackend::new())
        .run(dir.path())
        .unwrap();

    let debug = dir.path().join("a_debug.wav");
    assert!(debug.exists());
    let reader = hound::WavReader::open(&debug).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, SR);

    let report = AnalysisCoordinator::new(config, StubBackend::new())
        .run(dir.path())
        .unwrap();
    assert_eq!(report.skipped, vec!["a.wav"]);
    assert!(report.analyzed.is_empty());
}

#[test]
fn test_rejected_tempo_hint_falls_back_to_unhinted_tracking() {
    let dir = library(&["a.wav"]);
    let backend = StubBackend::new().rejecting_hints();

    let report = AnalysisCoordinator::new(sequential(&dir), backend)
        .run(dir.path())
        .unwrap();

    assert_eq!(report.analyzed, vec!["a.wav"]);
}

#[test]
fn test_panicking_backend_fails_only_that_file() {
    let dir = library(&["a.wav", "b.wav"]);
    let backend = StubBackend::new().panicking();

    let report = AnalysisCoordinator::new(sequential(&dir), backend)
        .run(dir.path())
        .unwrap();

    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].1.contains("panicked"));
    assert_eq!(read_json(&output_of(&dir)).len(), 0);
}

#[test]
fn test_tempo_rules_flow_into_records() {
    let cases: [(Vec<f64>, f64); 3] = [
        (vec![65.0, 128.0], 128.0),
        (vec![64.0], 128.0),
        (vec![45.0, 50.0], 95.0),
    ];

    for (candidates, expected) in cases {
        let dir = library(&["a.wav"]);
        let backend = StubBackend::new().with_tempo_candidates(candidates);
        AnalysisCoordinator::new(sequential(&dir), backend)
            .run(dir.path())
            .unwrap();

        let records = read_json(&output_of(&dir));
        assert_eq!(records[0]["bpm"], serde_json::json!(expected));
    }
}

#[test]
fn test_short_file_pads_pattern_with_zeros() {
    let dir = TempDir::new().unwrap();
    write_wav(&dir.path().join("short.wav"), &tone(3.0, 220.0));

    let coordinator = AnalysisCoordinator::new(sequential(&dir), StubBackend::new());
    let record = coordinator
        .analyze_file(&dir.path().join("short.wav"), "short.wav")
        .unwrap();

    let slots = record.drum_pattern.slots();
    assert!(slots[..7].iter().all(|&s| s == 1), "{:?}", slots);
    assert!(slots[7..].iter().all(|&s| s == 0), "{:?}", slots);
}

#[test]
fn test_native_backend_on_click_track() {
    let dir = TempDir::new().unwrap();
    write_wav(&dir.path().join("kick_128.wav"), &click_track(128.0, 12.0));

    let report = AnalysisCoordinator::new(sequential(&dir), NativeBackend::new())
        .run(dir.path())
        .unwrap();
    assert_eq!(report.analyzed, vec!["kick_128.wav"]);

    let records = read_json(&output_of(&dir));
    let bpm = records[0]["bpm"].as_f64().unwrap();
    assert!((bpm - 128.0).abs() < 5.0, "bpm {}", bpm);
    assert_eq!(records[0]["key"], "A");

    let pattern = records[0]["drum_pattern"].as_array().unwrap();
    assert_eq!(pattern.len(), 16);
    let hits = pattern.iter().filter(|v| v.as_u64() == Some(1)).count();
    assert!(hits >= 8, "only {} hits", hits);

    assert!(matches!(
        validate_artifact(&output_of(&dir)),
        Ok(summary) if summary.records == 1
    ));
}

#[test]
fn test_outcome_filenames() {
    let outcome = FileOutcome::Skipped {
        filename: "a.wav".to_string(),
    };
    assert_eq!(outcome.filename(), "a.wav");
}

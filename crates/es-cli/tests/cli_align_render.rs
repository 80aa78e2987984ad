use std::path::PathBuf;
use std::process::{Command, Output};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_eventsim"))
}

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("eventsim_cli_align_{}_{}", std::process::id(), name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn write(name: &str, text: &str) -> PathBuf {
    let p = tmp_path(name);
    std::fs::write(&p, text).unwrap();
    p
}

const SPLIT: &str = r#"{
  "estimator": "Split est",
  "series": {
    "convention": "split",
    "lags": [
      {"label": 0, "estimate": 0.5, "variance": 0.01},
      {"label": 1, "estimate": 0.3, "variance": 0.02}
    ],
    "leads": [{"label": 2, "estimate": 0.1, "variance": 0.03}]
  }
}"#;

const SIGNED: &str = r#"{
  "convention": "signed",
  "entries": [
    {"label": -2, "estimate": 0.0, "variance": 0.02},
    {"label": 0, "estimate": 0.6, "variance": 0.02},
    {"label": 1, "estimate": 0.4, "variance": 0.02}
  ],
  "reference": -1
}"#;

#[test]
fn align_then_render() {
    let split = write("split.json", SPLIT);
    let signed = write("Signed est.json", SIGNED);
    let o = run(&[
        "align",
        "--input",
        split.to_string_lossy().as_ref(),
        "--input",
        signed.to_string_lossy().as_ref(),
    ]);
    assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));

    let v: serde_json::Value = serde_json::from_slice(&o.stdout).unwrap();
    let series = v["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["name"], "Split est");
    let ks: Vec<i64> =
        series[0]["points"].as_array().unwrap().iter().map(|p| p["relativeTime"].as_i64().unwrap()).collect();
    assert_eq!(ks, vec![-2, -1, 0, 1]);
    assert_eq!(series[0]["points"][1]["isReference"], true);
    // Name from the file stem when the file carries none.
    let stem = signed.file_stem().unwrap().to_string_lossy().into_owned();
    assert_eq!(series[1]["name"], stem.as_str());

    let artifact = write("artifact.json", &String::from_utf8_lossy(&o.stdout));
    let chart = tmp_path("chart.svg");
    let o = run(&[
        "render",
        "--input",
        artifact.to_string_lossy().as_ref(),
        "--output",
        chart.to_string_lossy().as_ref(),
        "--offsets=-0.1,0.1",
    ]);
    assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));
    let svg = std::fs::read_to_string(&chart).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Split est"));

    for p in [split, signed, artifact, chart] {
        let _ = std::fs::remove_file(p);
    }
}

#[test]
fn align_skips_duplicate_relative_times() {
    let good = write("good.json", SPLIT);
    let bad = write(
        "bad.json",
        r#"{"estimator":"Bad","series":{"convention":"signed","entries":[
            {"label":3,"estimate":0.1,"variance":0.01},
            {"label":3,"estimate":0.2,"variance":0.01}]}}"#,
    );
    let o = run(&[
        "align",
        "--input",
        good.to_string_lossy().as_ref(),
        "--input",
        bad.to_string_lossy().as_ref(),
    ]);
    assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));
    let v: serde_json::Value = serde_json::from_slice(&o.stdout).unwrap();
    assert_eq!(v["series"].as_array().unwrap().len(), 1);

    let o = run(&["align", "--input", bad.to_string_lossy().as_ref()]);
    assert!(!o.status.success());

    for p in [good, bad] {
        let _ = std::fs::remove_file(p);
    }
}

#[test]
fn render_rejects_unknown_format() {
    let split = write("fmt_split.json", SPLIT);
    let artifact = tmp_path("fmt_artifact.json");
    let o = run(&[
        "align",
        "--input",
        split.to_string_lossy().as_ref(),
        "--output",
        artifact.to_string_lossy().as_ref(),
    ]);
    assert!(o.status.success());

    let chart = tmp_path("chart.bmp");
    let o = run(&[
        "render",
        "--input",
        artifact.to_string_lossy().as_ref(),
        "--output",
        chart.to_string_lossy().as_ref(),
    ]);
    assert!(!o.status.success());
    assert!(String::from_utf8_lossy(&o.stderr).contains("unsupported output format"));

    for p in [split, artifact] {
        let _ = std::fs::remove_file(p);
    }
}

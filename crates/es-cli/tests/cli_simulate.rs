use std::path::PathBuf;
use std::process::{Command, Output};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_eventsim"))
}

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("eventsim_cli_sim_{}_{}", std::process::id(), name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

#[test]
fn simulate_writes_csv_panel() {
    let out = tmp_path("panel.csv");
    let o = run(&[
        "simulate",
        "--units",
        "20",
        "--periods",
        "8",
        "--seed",
        "3",
        "--never-treated-share",
        "0.25",
        "--output",
        out.to_string_lossy().as_ref(),
    ]);
    assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));

    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("i,t,Ei,K,D,Y,gvar"));
    let rows: Vec<Vec<String>> =
        lines.map(|l| l.split(',').map(str::to_string).collect()).collect();
    assert_eq!(rows.len(), 20 * 8);

    // Never-treated rows: empty Ei/K, D = 0, gvar = 0.
    let never: Vec<&Vec<String>> = rows.iter().filter(|r| r[2].is_empty()).collect();
    assert!(!never.is_empty());
    assert!(never.iter().all(|r| r[3].is_empty() && r[4] == "0" && r[6] == "0"));

    for r in rows.iter().filter(|r| !r[2].is_empty()) {
        let t: i64 = r[1].parse().unwrap();
        let ei: i64 = r[2].parse().unwrap();
        let k: i64 = r[3].parse().unwrap();
        assert_eq!(k, t - ei);
        assert_eq!(r[4], if k >= 0 { "1" } else { "0" });
        assert_eq!(r[6], r[2]);
    }
    let _ = std::fs::remove_file(&out);
}

#[test]
fn simulate_is_deterministic() {
    let args = ["simulate", "--units", "10", "--periods", "6", "--seed", "42"];
    let a = run(&args);
    let b = run(&args);
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn truth_is_independent_of_noise_seed() {
    let a = run(&["truth", "--units", "300", "--periods", "15", "--seed", "1", "--design-seed", "9"]);
    let b = run(&["truth", "--units", "300", "--periods", "15", "--seed", "2", "--design-seed", "9"]);
    assert!(a.status.success(), "stderr={}", String::from_utf8_lossy(&a.stderr));
    assert_eq!(a.stdout, b.stdout);

    let v: serde_json::Value = serde_json::from_slice(&a.stdout).unwrap();
    assert_eq!(v["kind"], "truth");
    let points = v["points"].as_array().unwrap();
    let lag_values: Vec<f64> = points
        .iter()
        .filter(|p| p["relativeTime"].as_i64().unwrap() >= 0)
        .map(|p| p["estimate"].as_f64().unwrap())
        .collect();
    assert!(lag_values.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn missing_seed_is_a_usage_error() {
    let o = run(&["simulate", "--units", "5"]);
    assert!(!o.status.success());
    assert!(String::from_utf8_lossy(&o.stderr).contains("--seed"));
}

#[test]
fn invalid_config_fails() {
    let o = run(&["simulate", "--units", "0", "--seed", "1"]);
    assert!(!o.status.success());
    assert!(String::from_utf8_lossy(&o.stderr).contains("n_units"));
}

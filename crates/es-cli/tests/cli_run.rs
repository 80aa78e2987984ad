use std::path::PathBuf;
use std::process::{Command, Output};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_eventsim"))
}

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("eventsim_cli_run_{}_{}", std::process::id(), name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

#[test]
fn run_from_flags() {
    let chart = tmp_path("flags.svg");
    let artifact = tmp_path("flags_artifact.json");
    let o = run(&[
        "run",
        "--units",
        "120",
        "--periods",
        "12",
        "--seed",
        "10",
        "--output",
        chart.to_string_lossy().as_ref(),
        "--artifact",
        artifact.to_string_lossy().as_ref(),
    ]);
    assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&o.stdout).unwrap();
    assert_eq!(summary["series"], serde_json::json!(["True value", "TWFE OLS"]));
    assert!(summary["failures"].as_array().unwrap().is_empty());

    let art: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(art["lead_horizon"], 5);
    assert!(std::fs::read_to_string(&chart).unwrap().contains("TWFE OLS"));

    for p in [chart, artifact] {
        let _ = std::fs::remove_file(p);
    }
}

#[test]
fn run_from_config_isolates_bad_external() {
    let dir = tmp_path("cfg_dir");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("broken.json"), "{").unwrap();
    std::fs::write(
        dir.join("run.yaml"),
        "simulation:\n  n_units: 80\n  n_periods: 10\n  seed: 4\n\
         estimators:\n  twfe:\n    max_lead: 3\n    max_lag: 3\n  external:\n    - path: broken.json\n      name: Broken\n\
         chart:\n  output: chart.svg\n  title: From config\n",
    )
    .unwrap();

    let o = run(&["run", "--config", dir.join("run.yaml").to_string_lossy().as_ref()]);
    assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&o.stdout).unwrap();
    let failures = summary["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["estimator"], "Broken");
    let svg = std::fs::read_to_string(dir.join("chart.svg")).unwrap();
    assert!(svg.contains("From config"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pinned_design_seed_fixes_truth_across_seeds() {
    let truth_for = |seed: &str| {
        let chart = tmp_path(&format!("design_{seed}.svg"));
        let artifact = tmp_path(&format!("design_{seed}.json"));
        let o = run(&[
            "run",
            "--units",
            "60",
            "--periods",
            "10",
            "--seed",
            seed,
            "--design-seed",
            "7",
            "--no-twfe",
            "--output",
            chart.to_string_lossy().as_ref(),
            "--artifact",
            artifact.to_string_lossy().as_ref(),
        ]);
        assert!(o.status.success(), "stderr={}", String::from_utf8_lossy(&o.stderr));
        let art: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&artifact).unwrap()).unwrap();
        for p in [chart, artifact] {
            let _ = std::fs::remove_file(p);
        }
        art["series"][0].clone()
    };

    let a = truth_for("1");
    assert_eq!(a["name"], "True value");
    assert_eq!(a, truth_for("2"));
}

#[test]
fn misspelled_simulation_key_fails() {
    let dir = tmp_path("typo_dir");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("run.yaml"), "simulation:\n  n_unit: 50\n  seed: 4\nchart:\n  output: chart.svg\n")
        .unwrap();

    let o = run(&["run", "--config", dir.join("run.yaml").to_string_lossy().as_ref()]);
    assert!(!o.status.success());
    assert!(!dir.join("chart.svg").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn run_without_seed_fails() {
    let o = run(&["run", "--output", tmp_path("x.svg").to_string_lossy().as_ref()]);
    assert!(!o.status.success());
    assert!(String::from_utf8_lossy(&o.stderr).contains("--seed"));
}

#[test]
fn version_prints() {
    let o = run(&["version"]);
    assert!(o.status.success());
    assert!(String::from_utf8_lossy(&o.stdout).starts_with("eventsim "));
}

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn core_fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("spaxel-core/tests/fixtures")
        .join(name)
}

fn spaxel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spaxel-rs"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("binary should launch")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths should be utf-8")
}

#[test]
fn process_writes_the_assembled_table() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output_path = temp.path().join("assembled.csv");
    let input = core_fixture("bins.csv");
    let config = core_fixture("pipeline-config.json");

    let output = spaxel(&[
        "process",
        "--input",
        path_arg(&input),
        "--output",
        path_arg(&output_path),
        "--config",
        path_arg(&config),
        "--metallicity",
        "R23_KK04",
        "--ion",
        "O3O2_KK04",
        "--components",
        "total",
    ]);

    assert!(
        output.status.success(),
        "process should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote 2 rows"));

    let written = fs::read_to_string(&output_path).expect("output table should exist");
    let header = written.lines().next().expect("output should have a header");
    for column in [
        "galaxy",
        "log N2 (total)",
        "BPT (total)",
        "log(O/H) + 12 (N2O2_K19/O3O2_K19) (total)",
        "log(O/H) + 12 (R23_KK04/O3O2_KK04) (total)",
        "log(U) (R23_KK04/O3O2_KK04) (total)",
        "FWHM_gas (component 1)",
    ] {
        assert!(header.contains(column), "header should contain '{column}'");
    }
}

#[test]
fn missing_input_columns_exit_with_input_validation_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let input = temp.path().join("bins.csv");
    fs::write(&input, "galaxy,bin,HALPHA (total)\nG,0,1.0\n").expect("input should be written");

    let output = spaxel(&[
        "process",
        "--input",
        path_arg(&input),
        "--output",
        path_arg(&temp.path().join("out.csv")),
        "--ncomponents",
        "0",
        "--metallicity",
        "N2Ha_PP04",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR: [INPUT.MISSING_COLUMN] metallicity diagnostic N2Ha_PP04"),
        "stderr should name the diagnostic: {stderr}"
    );
    assert!(stderr.contains("NII6583 (total)"));
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
    assert!(!temp.path().join("out.csv").exists());
}

#[test]
fn conflicting_metallicity_flags_are_rejected() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = spaxel(&[
        "process",
        "--input",
        path_arg(&core_fixture("bins.csv")),
        "--output",
        path_arg(&temp.path().join("out.csv")),
        "--metallicity",
        "N2Ha_PP04",
        "--log-u",
        "-3.0",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CONFIG_VALUE"));
}

#[test]
fn diagnostics_lists_the_catalogue_as_json() {
    let output = spaxel(&["diagnostics", "--json"]);
    assert!(output.status.success());

    let parsed: Value =
        serde_json::from_slice(&output.stdout).expect("diagnostics output should be json");
    let metallicity = parsed["metallicity"]
        .as_array()
        .expect("metallicity should be an array");
    assert_eq!(metallicity.len(), 20);
    assert!(
        metallicity
            .iter()
            .any(|entry| entry["diagnostic"] == "ONS_P10" && entry["family"] == "fixed")
    );
    assert_eq!(parsed["ionisation"].as_array().map(Vec::len), Some(3));
}

#[test]
fn density_converts_ratios_with_limit_flags() {
    let output = spaxel(&[
        "density",
        "--diagnostic",
        "Proxauf2014",
        "--line",
        "[SII]",
        "1.0",
        "2.0",
    ]);
    assert!(
        output.status.success(),
        "density should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows: Vec<&str> = stdout.lines().collect();
    assert_eq!(rows[0], "ratio\tn_e\tlimit");
    assert!(rows[1].starts_with("1\t449.39"));
    assert_eq!(rows[2], "2\t40\tlower limit");

    let rejected = spaxel(&[
        "density",
        "--diagnostic",
        "Proxauf2014",
        "--line",
        "[OII]",
        "1.0",
    ]);
    assert_eq!(rejected.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("INPUT.DENSITY_DIAGNOSTIC"));
}

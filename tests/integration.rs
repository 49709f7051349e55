use std::{env, fs, path::PathBuf, process::Command};

fn species_section(name: &str, lifespan_mean: f64, adult_age: u32, egg_age: u32) -> String {
    format!(
        "[laws.{name}]\n\
         male_prob = 0.5\n\
         lifespan_mean = {lifespan_mean:?}\n\
         lifespan_std_dev = 2.0\n\
         initial_age_min = 0\n\
         initial_age_max = 10\n\
         fertility_ratio = 0.8\n\
         offspring_mean = 2.0\n\
         offspring_std_dev = 1.0\n\
         adult_age = {adult_age}\n\
         egg_age = {egg_age}\n\
         random_death_prob = 0.01\n\
         \n"
    )
}

fn run_bin(args: &[&str]) -> (bool, String) {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_biocontrol"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    (
        output.status.success(),
        format!("stdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"),
    )
}

fn run_ok(args: &[&str]) -> String {
    let (success, output) = run_bin(args);
    assert!(success, "failed to run binary with {args:?}\n{output}");
    output
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "seed = 42\n"
        + "\n"
        + "[laws]\n"
        + "predation_coef = 0.5\n"
        + "\n"
        + &species_section("predator", 15.0, 5, 2)
        + &species_section("host", 20.0, 8, 3)
        + "[costs]\n"
        + "predator_unit_cost = 1.0\n"
        + "host_unit_cost = 0.1\n"
        + "\n"
        + "[batch]\n"
        + "n_steps = 30\n"
        + "n_runs = 3\n"
        + "log_output = \"all\"\n"
        + "cost_output = \"mean\"\n"
        + "rows = [0, 2]\n"
        + "populations = [\n"
        + "  { predator_count = 1, host_count = 10 },\n"
        + "  { predator_count = 2, host_count = 10 },\n"
        + "  { predator_count = 1, host_count = 20 },\n"
        + "]\n"
        + "\n"
        + "[bayes]\n"
        + "predator_counts = [1, 2]\n"
        + "density_scale = 10.0\n"
        + "prior = [\n"
        + "  { density = 1.0, probability = 0.5 },\n"
        + "  { density = 2.0, probability = 0.5 },\n"
        + "]\n"
        + "samples = [\n"
        + "  { host_count = 3, area = 2.0 },\n"
        + "  { host_count = 0, area = 1.0 },\n"
        + "]\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_ok(&["--sim-dir", test_dir_str, "simulate"]);
    assert!(test_dir.join("log-p1-h10-run0002.msgpack").exists());
    assert!(test_dir.join("log-p2-h10-mean.msgpack").exists());
    assert!(!test_dir.join("log-p1-h20-mean.msgpack").exists());

    run_ok(&["--sim-dir", test_dir_str, "bayes"]);
    assert!(test_dir.join("missing.msgpack").exists());
    assert!(!test_dir.join("bayes-costs.msgpack").exists());

    run_ok(&["--sim-dir", test_dir_str, "simulate", "--missing"]);
    assert!(test_dir.join("log-p2-h20-mean.msgpack").exists());
    assert!(!test_dir.join("missing.msgpack").exists());

    let (success, _) = run_bin(&["--sim-dir", test_dir_str, "simulate", "--missing"]);
    assert!(!success);

    run_ok(&["--sim-dir", test_dir_str, "bayes"]);
    assert!(test_dir.join("bayes-costs.msgpack").exists());
    assert!(test_dir.join("bayes-min.msgpack").exists());

    let log_path = test_dir.join("log-p1-h10-mean.msgpack");
    let log_str = log_path.to_str().expect("failed to convert log path to string");
    let output = run_ok(&[
        "--sim-dir",
        test_dir_str,
        "show",
        "--log",
        log_str,
        "--columns",
        "host-juveniles,predator-living",
    ]);
    assert!(output.contains("step host-juveniles predator-living"));
    assert!(output.contains("\n30 "));

    let (success, _) = run_bin(&[
        "--sim-dir",
        test_dir_str,
        "show",
        "--log",
        log_str,
        "--columns",
        "host-unknown",
    ]);
    assert!(!success);

    run_ok(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("costs.msgpack").exists());
    assert!(test_dir.join("config.toml").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_fails() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_config_fails");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let (success, _) = run_bin(&["--sim-dir", test_dir_str, "simulate"]);
    assert!(!success);

    fs::write(test_dir.join("config.toml"), "seed = 1\n").expect("failed to write config file");
    let (success, _) = run_bin(&["--sim-dir", test_dir_str, "simulate"]);
    assert!(!success);

    fs::remove_dir_all(&test_dir).ok();
}

use assert_cmd::Command;
use predicates::prelude::*;
use taxalink_test::TestEnvironment;

fn taxalink_cmd(env: &TestEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("taxalink").unwrap();
    cmd.env("TAXALINK_HOME", env.root())
        .env_remove("TAXALINK_CONFIG")
        .env_remove("TAXALINK_LOG");
    cmd
}

fn configured() -> (TestEnvironment, std::path::PathBuf) {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();
    (env, config)
}

#[test]
fn test_cli_help_command() {
    let env = TestEnvironment::new().unwrap();
    taxalink_cmd(&env)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("map"))
        .stdout(predicate::str::contains("lineage"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_map_by_taxid_prints_json() {
    let (env, config) = configured();
    let output = taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["map", "9606", "12345"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["key"], "9606");
    assert_eq!(entries[0]["status"], "resolved");
    assert_eq!(entries[0]["value"][0]["scientific_name"], "Homo sapiens");
    assert_eq!(entries[1]["key"], "12345");
    assert_eq!(entries[1]["value"], serde_json::json!([]));
}

#[test]
fn test_map_by_name_from_input_file() {
    let (env, config) = configured();
    let input = env
        .write_file("names.txt", "# fixture names\nhuman\n\nhouse mouse\n")
        .unwrap();

    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["map", "--by", "name", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mus musculus"))
        .stderr(predicate::str::contains("2/2 keys matched"));
}

#[test]
fn test_lineage_single_rank() {
    let (env, config) = configured();
    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["lineage", "--single-rank", "family", "9606", "555"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hominidae"))
        .stdout(predicate::str::contains("Primates").not());
}

#[test]
fn test_contradictory_bounds_exit_code() {
    let (env, config) = configured();
    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["lineage", "--single-rank", "genus", "--stop-rank", "order", "9606"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be combined"));
}

#[test]
fn test_invalid_taxid_is_a_parse_error() {
    let (env, config) = configured();
    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["map", "human"])
        .assert()
        .code(4);
}

#[test]
fn test_remote_without_authority_is_a_configuration_error() {
    let (env, config) = configured();
    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["map", "--remote", "9606"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no remote authority"));
}

#[test]
fn test_missing_taxonomy_exit_code() {
    let (env, config) = configured();
    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .arg("--taxonomy-dir")
        .arg(env.root().join("nowhere"))
        .args(["validate", "9606"])
        .assert()
        .code(5);
}

#[test]
fn test_validate_strict() {
    let (env, config) = configured();
    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["validate", "9606", "10090"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"complete\""));

    taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["validate", "--strict", "9606", "999999"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("999999"))
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn test_remote_map_does_not_need_local_taxonomy() {
    let env = TestEnvironment::new().unwrap();
    let config = env
        .write_file(
            "remote.toml",
            "[remote]\nbase_url = \"http://127.0.0.1:9\"\nemail = \"curator@example.org\"\nmax_attempts = 1\ntimeout_secs = 2\n",
        )
        .unwrap();

    let output = taxalink_cmd(&env)
        .arg("--config")
        .arg(&config)
        .args(["map", "--remote", "9606"])
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(!stderr.contains("nodes.dmp"));

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["key"], "9606");
    assert_eq!(entries[0]["status"], "failed");
    assert_eq!(entries[0]["value"]["kind"], "remote");
}

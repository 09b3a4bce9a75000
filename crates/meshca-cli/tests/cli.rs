//! Black-box tests of the `meshca` binary against a stand-in `nebula-cert`.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FAKE_NEBULA_CERT: &str = r#"#!/bin/sh
cmd="$1"; shift
name=""; crt=""; key=""
while [ $# -gt 0 ]; do
  case "$1" in
    -name) name="$2"; shift 2 ;;
    -out-crt) crt="$2"; shift 2 ;;
    -out-key) key="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case "$cmd" in
  ca)
    printf 'CA-KEY-%s\n' "$name" > ca.key
    printf 'CA-CERT-%s\n' "$name" > ca.crt
    ;;
  sign)
    [ -f ca.key ] || { echo "missing ca.key" >&2; exit 3; }
    printf 'CERT-%s\n' "$name" > "$crt"
    if [ -n "$key" ]; then printf 'KEY-%s\n' "$name" > "$key"; fi
    ;;
  *)
    echo "unknown command $cmd" >&2
    exit 1
    ;;
esac
"#;

const NETWORKS: &str = r#"[
  {
    "name": "n1",
    "ip": "10.0.0.0/24",
    "hosts": [
      {"type": "lighthouse", "name": "lh", "ip": "10.0.0.1", "publicIpPort": "203.0.113.7:4242"},
      {"type": "host", "name": "relay-1", "ip": "10.0.0.2", "relay": true},
      {"type": "host", "name": "node-a", "ip": "10.0.0.5"}
    ]
  }
]"#;

struct Harness {
    dir: TempDir,
    signer: PathBuf,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let signer = dir.path().join("nebula-cert");
        std::fs::write(&signer, FAKE_NEBULA_CERT).unwrap();
        std::fs::set_permissions(&signer, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, signer }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn data_path(&self) -> PathBuf {
        self.path("data/db.json")
    }

    fn cmd_with_signer(&self, signer: &Path) -> Command {
        let mut cmd = Command::cargo_bin("meshca").unwrap();
        cmd.env_remove("MESHCA_LOG")
            .env_remove("MESHCA_CONFIG")
            .env_remove("DATA_PATH")
            .env_remove("NEBULA_CERT")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.path("meshca.toml"))
            .arg("--nebula-cert")
            .arg(signer)
            .arg("--data-path")
            .arg(self.data_path());
        cmd
    }

    fn cmd(&self) -> Command {
        self.cmd_with_signer(&self.signer)
    }

    fn create_ca(&self, name: &str) {
        self.cmd().args(["ca", "create", name]).assert().success();
    }
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("meshca")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ca"))
        .stdout(predicate::str::contains("cert"))
        .stdout(predicate::str::contains("network"));
}

#[test]
fn test_fresh_mesh_has_no_ca() {
    let h = Harness::new();
    h.cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    h.cmd()
        .args(["ca", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No CA has been created yet"));
}

#[test]
fn test_sign_without_ca_fails() {
    let h = Harness::new();
    h.cmd()
        .args(["cert", "sign", "--name", "node-a", "--ip", "10.0.0.5/24"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CA not established"));
    assert!(!h.data_path().exists());
}

#[test]
fn test_create_ca_and_sign() {
    let h = Harness::new();
    h.cmd()
        .args(["ca", "create", "mesh1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CA-CERT-mesh1"));
    assert!(h.data_path().exists());

    h.cmd()
        .args(["-o", "json", "cert", "sign", "--name", "node-a", "--ip", "10.0.0.5/24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"crt\": \"CERT-node-a\\n\""))
        .stdout(predicate::str::contains("\"key\": \"KEY-node-a\\n\""));

    let out = h.path("out");
    h.cmd()
        .args(["cert", "sign", "--name", "node-b", "--ip", "10.0.0.6/24", "--out-dir"])
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(out.join("host.crt")).unwrap(), "CERT-node-b\n");
    let mode = std::fs::metadata(out.join("host.key")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_sign_with_supplied_public_key() {
    let h = Harness::new();
    h.create_ca("mesh1");
    let key = h.path("host.pub");
    std::fs::write(&key, "PUBLIC").unwrap();

    h.cmd()
        .args(["-o", "json", "cert", "sign", "--name", "node-a", "--ip", "10.0.0.5/24", "--pub"])
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::contains("CERT-node-a"))
        .stdout(predicate::str::contains("\"key\"").not());
}

#[test]
fn test_show_never_prints_ca_key() {
    let h = Harness::new();
    h.create_ca("mesh1");

    h.cmd()
        .args(["-o", "json", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CA-CERT-mesh1"))
        .stdout(predicate::str::contains("CA-KEY").not());

    let stored = std::fs::read_to_string(h.data_path()).unwrap();
    assert!(stored.contains("CA-KEY-mesh1"));
    let mode = std::fs::metadata(h.data_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_topology_and_host_config() {
    let h = Harness::new();
    let file = h.path("networks.json");
    std::fs::write(&file, NETWORKS).unwrap();

    h.cmd()
        .args(["network", "replace"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 network(s), 3 host(s)"));

    h.cmd()
        .args(["network", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("relay-1"))
        .stdout(predicate::str::contains("203.0.113.7:4242"));

    let output = h
        .cmd()
        .args(["-o", "json", "config", "host", "--network", "n1", "--host", "node-a"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["lighthouse"]["am_lighthouse"], false);
    assert_eq!(doc["lighthouse"]["hosts"], serde_json::json!(["10.0.0.1"]));
    assert_eq!(doc["static_host_map"], serde_json::json!({"10.0.0.1": ["203.0.113.7:4242"]}));
    assert_eq!(doc["relay"]["relays"], serde_json::json!(["10.0.0.2"]));

    h.cmd()
        .args(["config", "host", "--network", "n1", "--host", "lh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("am_lighthouse: true"))
        .stdout(predicate::str::contains("am_relay: true"));

    h.cmd()
        .args(["config", "host", "--network", "n1", "--host", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_invalid_topology_is_rejected() {
    let h = Harness::new();
    let file = h.path("networks.yaml");
    let networks = concat!(
        "- name: n1\n",
        "  ip: 10.0.0.0/24\n",
        "  hosts:\n",
        "    - type: lighthouse\n",
        "      name: lh\n",
        "      ip: 10.0.0.1\n",
    );
    std::fs::write(&file, networks).unwrap();

    h.cmd()
        .args(["network", "replace"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));
    assert!(!h.data_path().exists());
}

#[test]
fn test_host_config_from_params_file() {
    let h = Harness::new();
    let file = h.path("params.json");
    let params = serde_json::json!({
        "staticHostMap": {"10.0.0.1": ["1.2.3.4:4242"]},
        "lighthouseHosts": ["10.0.0.1"],
        "amRelay": true
    });
    std::fs::write(&file, params.to_string()).unwrap();

    h.cmd()
        .args(["config", "host", "--params"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("am_relay: true"))
        .stdout(predicate::str::contains("use_relays: false"));
}

#[test]
fn test_lighthouse_config() {
    let h = Harness::new();
    h.cmd()
        .args(["config", "lighthouse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("am_lighthouse: true"))
        .stdout(predicate::str::contains("port: 4242"));
}

#[test]
fn test_missing_signer_is_reported() {
    let h = Harness::new();
    h.cmd_with_signer(&h.path("no-such-nebula-cert"))
        .args(["ca", "create", "mesh1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signer failed"));
    assert!(!h.data_path().exists());
}

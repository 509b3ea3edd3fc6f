use assert_cmd::Command;
use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const SHOP: &str = r#"{
    "name": "Shop",
    "types": [
        { "name": "Order", "namespace": "Shop", "accessibility": "public",
          "base": "T:Shop.Entity", "interfaces": ["T:Shop.IEntity"] },
        { "name": "Entity", "namespace": "Shop", "accessibility": "public", "abstract": true },
        { "name": "IEntity", "namespace": "Shop", "kind": "interface", "accessibility": "public" },
        { "name": "Hidden", "namespace": "Shop" }
    ]
}"#;

const SHOP_WITH_INVOICE: &str = r#"{
    "name": "Shop",
    "types": [
        { "name": "Order", "namespace": "Shop", "accessibility": "public",
          "base": "T:Shop.Entity", "interfaces": ["T:Shop.IEntity"] },
        { "name": "Entity", "namespace": "Shop", "accessibility": "public", "abstract": true },
        { "name": "IEntity", "namespace": "Shop", "kind": "interface", "accessibility": "public" },
        { "name": "Hidden", "namespace": "Shop" },
        { "name": "Invoice", "namespace": "Shop", "accessibility": "public" }
    ]
}"#;

/// Run `typediagram` inside an isolated temp directory.
fn typediagram_cmd(work_dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("typediagram");
    cmd.current_dir(work_dir.path());
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(".git")).unwrap();
    tmp
}

// ============================================================================
// emit
// ============================================================================

#[test]
fn emit_writes_sibling_diagram() {
    let tmp = repo();
    write(tmp.path(), "Shop.symbols.json", SHOP);

    typediagram_cmd(&tmp)
        .args(["emit", "Shop.symbols.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote: Shop.mmd"));

    let diagram = std::fs::read_to_string(tmp.path().join("Shop.mmd")).unwrap();
    assert_eq!(
        diagram,
        "classDiagram\n\
         direction LR\n\
         namespace Shop {\n  \
         class Shop::Entity <<Abstract>>\n  \
         class Shop::IEntity <<Interface>>\n  \
         class Shop::Order\n\
         }\n\
         Shop::Order <|-- Shop::Entity\n\
         Shop::Order ..|> Shop::IEntity\n"
    );
}

#[test]
fn emit_twice_reports_unchanged() {
    let tmp = repo();
    write(tmp.path(), "Shop.symbols.json", SHOP);

    typediagram_cmd(&tmp).args(["emit", "Shop.symbols.json"]).assert().success();
    typediagram_cmd(&tmp)
        .args(["emit", "Shop.symbols.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged: Shop.mmd"));
}

#[test]
fn emit_honors_flags_and_config() {
    let tmp = repo();
    write(tmp.path(), "Shop.symbols.json", SHOP);
    write(tmp.path(), "typediagram.toml", "[emit]\ndirection = \"BT\"\nmin-access = \"internal\"\n");

    typediagram_cmd(&tmp)
        .args(["emit", "Shop.symbols.json", "--out", "docs/shop.mmd", "--direction", "TB"])
        .assert()
        .success();

    let diagram = std::fs::read_to_string(tmp.path().join("docs/shop.mmd")).unwrap();
    assert!(diagram.starts_with("classDiagram\ndirection TB\n"));
    assert!(diagram.contains("  class Shop::Hidden\n"));
}

#[test]
fn emit_solution_manifest() {
    let tmp = repo();
    std::fs::create_dir(tmp.path().join("units")).unwrap();
    write(&tmp.path().join("units"), "Shop.symbols.json", SHOP);
    write(
        &tmp.path().join("units"),
        "Util.symbols.json",
        r#"{ "types": [ { "name": "Clock", "namespace": "", "accessibility": "public", "static": true } ] }"#,
    );
    write(tmp.path(), "Store.solution.toml", "name = \"Store\"\nunits = [\"units/*.symbols.json\"]\n");

    typediagram_cmd(&tmp)
        .args(["--format", "json", "emit", "Store.solution.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\": \"emit\""))
        .stdout(predicate::str::contains("\"projects\": 2"));

    let diagram = std::fs::read_to_string(tmp.path().join("Store.mmd")).unwrap();
    assert!(diagram.contains("namespace Global {\n  class Global::Clock <<static>>\n}\n"));
}

#[test]
fn emit_unrecognized_descriptor_exits_3() {
    let tmp = repo();
    write(tmp.path(), "App.csproj", "<Project />");

    typediagram_cmd(&tmp)
        .args(["emit", "App.csproj"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("[emit] error:"));
    assert!(!tmp.path().join("App.mmd").exists());
}

#[test]
fn emit_malformed_unit_exits_3() {
    let tmp = repo();
    write(tmp.path(), "Broken.symbols.json", "{ not json");

    typediagram_cmd(&tmp)
        .args(["emit", "Broken.symbols.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Broken"));
}

// ============================================================================
// diff
// ============================================================================

#[test]
fn drift_scenario() {
    let tmp = repo();
    write(tmp.path(), "Shop.symbols.json", SHOP);

    typediagram_cmd(&tmp)
        .args(["emit", "Shop.symbols.json", "--out", "committed.mmd"])
        .assert()
        .success();
    typediagram_cmd(&tmp)
        .args(["emit", "Shop.symbols.json", "--out", "fresh.mmd"])
        .assert()
        .success();
    typediagram_cmd(&tmp)
        .args(["diff", "committed.mmd", "fresh.mmd"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No drift."));

    write(tmp.path(), "Shop.symbols.json", SHOP_WITH_INVOICE);
    typediagram_cmd(&tmp)
        .args(["emit", "Shop.symbols.json", "--out", "fresh.mmd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote: fresh.mmd"));
    typediagram_cmd(&tmp)
        .args(["diff", "committed.mmd", "fresh.mmd"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("Drift detected."));
}

#[test]
fn diff_missing_file_exits_1() {
    let tmp = repo();
    write(tmp.path(), "a.mmd", "classDiagram\n");

    typediagram_cmd(&tmp)
        .args(["diff", "a.mmd", "b.mmd"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Both files must exist."));
}

#[test]
fn diff_json_reports_digests() {
    let tmp = repo();
    write(tmp.path(), "a.mmd", "classDiagram\n");
    write(tmp.path(), "b.mmd", "classDiagram\ndirection TB\n");

    typediagram_cmd(&tmp)
        .args(["--format", "json", "diff", "a.mmd", "b.mmd"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("\"identical\": false"))
        .stdout(predicate::str::contains("\"old_digest\""));
}

// ============================================================================
// install / enable / disable / status / uninstall
// ============================================================================

#[test]
fn install_and_uninstall() {
    let tmp = repo();
    let nested = tmp.path().join("src");
    std::fs::create_dir(&nested).unwrap();

    cargo_bin_cmd!("typediagram")
        .current_dir(&nested)
        .env("NO_COLOR", "1")
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed typediagram-build 1.1.0"));

    let config = std::fs::read_to_string(tmp.path().join("typediagram.toml")).unwrap();
    assert!(config.contains("typediagram-enabled = true"));
    assert!(config.contains("[build.packages.typediagram-build]"));

    typediagram_cmd(&tmp)
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed typediagram-build"));
    let config = std::fs::read_to_string(tmp.path().join("typediagram.toml")).unwrap();
    assert!(!config.contains("typediagram-build"));
    assert!(config.contains("typediagram-enabled = true"));
}

#[test]
fn uninstall_without_config() {
    let tmp = repo();
    typediagram_cmd(&tmp)
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to uninstall."));
}

#[test]
fn toggle_repo_default_preserves_emit_settings() {
    let tmp = repo();
    write(tmp.path(), "typediagram.toml", "# team settings\n[emit]\ndirection = \"TB\"\n");

    typediagram_cmd(&tmp)
        .arg("disable")
        .assert()
        .success()
        .stdout(predicate::str::contains("Repo default set to DISABLED"));

    let config = std::fs::read_to_string(tmp.path().join("typediagram.toml")).unwrap();
    assert!(config.starts_with("# team settings\n[emit]\ndirection = \"TB\"\n"));
    assert!(config.contains("typediagram-enabled = false"));
}

#[test]
fn toggle_solution_and_status() {
    let tmp = repo();
    write(tmp.path(), "Shop.symbols.json", SHOP);
    write(tmp.path(), "Store.solution.toml", "units = [\"Shop.symbols.json\"]\n");
    typediagram_cmd(&tmp).arg("install").assert().success();

    typediagram_cmd(&tmp)
        .args(["disable", "--solution"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Disabled in"));
    assert!(tmp.path().join("Shop.typediagram.toml").is_file());

    typediagram_cmd(&tmp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package: typediagram-build 1.1.0"))
        .stdout(predicate::str::contains("Repo default: true"))
        .stdout(predicate::str::contains("Shop.symbols.json"))
        .stdout(predicate::str::contains("false"));
}

#[test]
fn toggle_solution_without_manifest_exits_1() {
    let tmp = repo();
    typediagram_cmd(&tmp)
        .args(["enable", "--solution"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No solution manifest"));
}

#[test]
fn toggle_project() {
    let tmp = repo();
    write(tmp.path(), "Shop.symbols.json", SHOP);

    typediagram_cmd(&tmp)
        .args(["enable", "--project", "Shop.symbols.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled in"));

    let config = std::fs::read_to_string(tmp.path().join("Shop.typediagram.toml")).unwrap();
    assert!(config.contains("typediagram-enabled = true"));
}

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

fn fwaudit_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fwaudit"))
}

fn write_package(path: &Path, model: &str) {
    let file = std::fs::File::create(path).unwrap();
    let enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(enc);
    let prop = format!("ro.product.model={model}\n");
    let content = prop.as_bytes();
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "system/build.prop", content)
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

fn refresh(folder: &Path, snapshot: &Path) -> std::process::Output {
    fwaudit_cmd()
        .args([
            "refresh",
            folder.to_str().unwrap(),
            snapshot.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run fwaudit refresh")
}

fn snapshot_keys(snapshot: &Path) -> BTreeSet<String> {
    let content = std::fs::read_to_string(snapshot).unwrap();
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).unwrap();
    map.keys().cloned().collect()
}

fn snapshot_model(snapshot: &Path, key: &str) -> String {
    let content = std::fs::read_to_string(snapshot).unwrap();
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).unwrap();
    map[key]["project_model"].as_str().unwrap().to_string()
}

#[test]
fn test_full_refresh_then_diff() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("releases");
    std::fs::create_dir(&folder).unwrap();
    for name in ["lux2_a.tar.gz", "lux2_b.tar.gz", "lux2_c.tar.gz"] {
        write_package(&folder.join(name), "Model1");
    }
    // Files outside the naming convention are never picked up
    std::fs::write(folder.join("notes.txt"), b"scratch").unwrap();
    let snapshot = dir.path().join("report.json");

    let output = refresh(&folder, &snapshot);
    assert!(output.status.success(), "{output:?}");
    let expected: BTreeSet<String> = [
        "lux2_a.tar.gz".to_string(),
        "lux2_b.tar.gz".to_string(),
        "lux2_c.tar.gz".to_string(),
    ]
    .into();
    assert_eq!(snapshot_keys(&snapshot), expected);

    // A removed, D added: post-refresh collection is exactly {B, C, D}
    std::fs::remove_file(folder.join("lux2_a.tar.gz")).unwrap();
    write_package(&folder.join("lux2_d.tar.gz"), "Model2");
    let output = refresh(&folder, &snapshot);
    assert!(output.status.success(), "{output:?}");
    let expected: BTreeSet<String> = [
        "lux2_b.tar.gz".to_string(),
        "lux2_c.tar.gz".to_string(),
        "lux2_d.tar.gz".to_string(),
    ]
    .into();
    assert_eq!(snapshot_keys(&snapshot), expected);
    assert_eq!(snapshot_model(&snapshot, "lux2_d.tar.gz"), "Model2");
}

#[test]
fn test_refresh_does_not_reanalyze_known_packages() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("releases");
    std::fs::create_dir(&folder).unwrap();
    write_package(&folder.join("lux2_a.tar.gz"), "Model1");
    let snapshot = dir.path().join("report.json");

    assert!(refresh(&folder, &snapshot).status.success());
    assert_eq!(snapshot_model(&snapshot, "lux2_a.tar.gz"), "Model1");

    // Same file name, different content: the diff is by name, so the
    // persisted record must survive untouched.
    write_package(&folder.join("lux2_a.tar.gz"), "Model9");
    assert!(refresh(&folder, &snapshot).status.success());
    assert_eq!(snapshot_model(&snapshot, "lux2_a.tar.gz"), "Model1");
}

#[test]
fn test_refresh_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("releases");
    std::fs::create_dir(&folder).unwrap();
    write_package(&folder.join("lux2_a.tar.gz"), "Model1");
    write_package(&folder.join("sg_b.tar.gz"), "Model2");
    let snapshot = dir.path().join("report.json");

    assert!(refresh(&folder, &snapshot).status.success());
    let first_json = std::fs::read(&snapshot).unwrap();
    let first_xml = std::fs::read(dir.path().join("report.xml")).unwrap();
    let first_txt = std::fs::read(dir.path().join("report.txt")).unwrap();

    assert!(refresh(&folder, &snapshot).status.success());
    assert_eq!(std::fs::read(&snapshot).unwrap(), first_json);
    assert_eq!(std::fs::read(dir.path().join("report.xml")).unwrap(), first_xml);
    assert_eq!(std::fs::read(dir.path().join("report.txt")).unwrap(), first_txt);
}

#[test]
fn test_refresh_writes_companion_formats() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("releases");
    std::fs::create_dir(&folder).unwrap();
    write_package(&folder.join("lux2_a.tar.gz"), "Model1");
    let snapshot = dir.path().join("report.xml");

    assert!(refresh(&folder, &snapshot).status.success());
    for name in ["report.xml", "report.html", "report.txt", "report.json", "report.xslt", "style.css"] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
}

#[test]
fn test_refresh_with_xml_snapshot_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("releases");
    std::fs::create_dir(&folder).unwrap();
    write_package(&folder.join("lux2_a.tar.gz"), "Model1");
    let snapshot = dir.path().join("report.xml");

    assert!(refresh(&folder, &snapshot).status.success());
    // Second run imports the XML snapshot; the JSON companion must be
    // unchanged afterwards.
    let first_json = std::fs::read(dir.path().join("report.json")).unwrap();
    assert!(refresh(&folder, &snapshot).status.success());
    assert_eq!(std::fs::read(dir.path().join("report.json")).unwrap(), first_json);
}

#[test]
fn test_refresh_missing_folder_and_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = refresh(
        &dir.path().join("no-folder"),
        &dir.path().join("no-snapshot.json"),
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_run_executes_configured_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let folder_a = dir.path().join("line_a");
    let folder_b = dir.path().join("line_b");
    std::fs::create_dir(&folder_a).unwrap();
    std::fs::create_dir(&folder_b).unwrap();
    write_package(&folder_a.join("lux2_a.tar.gz"), "Model1");
    write_package(&folder_b.join("sg_b.tar.gz"), "Model2");
    let snap_a = dir.path().join("a.json");
    let snap_b = dir.path().join("b.json");

    let config = format!(
        "[[tasks]]\nfolder = {:?}\nsnapshot = {:?}\n\n[[tasks]]\nfolder = {:?}\nsnapshot = {:?}\n",
        folder_a, snap_a, folder_b, snap_b
    );
    let config_path = dir.path().join("fwaudit.toml");
    std::fs::write(&config_path, config).unwrap();

    let output = fwaudit_cmd()
        .args(["run", "--config", config_path.to_str().unwrap()])
        .output()
        .expect("failed to run fwaudit run");
    assert!(output.status.success(), "{output:?}");
    assert!(snapshot_keys(&snap_a).contains("lux2_a.tar.gz"));
    assert!(snapshot_keys(&snap_b).contains("sg_b.tar.gz"));
}

#[test]
fn test_run_reports_task_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        "[[tasks]]\nfolder = {:?}\nsnapshot = {:?}\n",
        dir.path().join("missing"),
        dir.path().join("missing.json")
    );
    let config_path = dir.path().join("fwaudit.toml");
    std::fs::write(&config_path, config).unwrap();

    let output = fwaudit_cmd()
        .args(["run", "--config", config_path.to_str().unwrap()])
        .output()
        .expect("failed to run fwaudit run");
    assert_eq!(output.status.code(), Some(1));
}

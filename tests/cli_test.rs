use sha1::{Digest, Sha1};
use std::env;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

fn run_command(args: &[&str], test_dir: &str) -> (bool, String, String) {
    run_command_with_env(args, test_dir, &[])
}

fn run_command_with_env(args: &[&str], test_dir: &str, envs: &[(&str, &str)]) -> (bool, String, String) {
    // Use cargo run which will build if needed
    // Set MCP_DIR in the environment for the subprocess
    let output = Command::new("cargo")
        .args(&["run", "--quiet", "--"])
        .args(args)
        .env("MCP_DIR", test_dir)
        .envs(envs.iter().copied())
        .current_dir(env::current_dir().unwrap())
        .output()
        .expect("Failed to execute command");

    let success = output.status.success();
    let stdout = String::from_utf8(output.stdout).unwrap_or_default();
    let stderr = String::from_utf8(output.stderr).unwrap_or_default();

    // Filter out cargo compilation messages from stderr
    let filtered_stderr: String = stderr
        .lines()
        .filter(|line| {
            !line.contains("Compiling")
                && !line.contains("Finished")
                && !line.contains("warning:")
                && !line.contains("note:")
        })
        .collect::<Vec<_>>()
        .join("\n");

    // Combine stdout and filtered stderr for checking messages
    let combined_output = if stdout.is_empty() {
        filtered_stderr.clone()
    } else if filtered_stderr.is_empty() {
        stdout.clone()
    } else {
        format!("{}\n{}", stdout, filtered_stderr)
    };

    (success, combined_output, filtered_stderr)
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
    for (name, contents) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn artifact(root: &Path, file: &str, data: &[u8]) -> serde_json::Value {
    fs::write(root.join("repo").join(file), data).unwrap();
    serde_json::json!({
        "path": format!("test/{}", file),
        "sha1": hex::encode(Sha1::digest(data)),
        "size": data.len(),
        "url": format!("repo/{}", file),
    })
}

/// An offline working directory: both manifest caches plus a local artifact repository.
fn setup_test_dir() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path();
    fs::create_dir_all(root.join("repo")).unwrap();
    fs::create_dir_all(root.join("mod_versions")).unwrap();

    let client = artifact(root, "client.jar", b"client bytes");
    let lib = artifact(root, "lib.jar", b"library bytes");
    for id in ["a1.2.2", "a1.2.6"] {
        let descriptor = serde_json::json!({
            "id": id,
            "arguments": {"game": ["--demo"]},
            "downloads": {"client": client},
            "libraries": [{"name": "org.test:lib:1", "downloads": {"artifact": lib}}]
        });
        fs::write(root.join(format!("repo/{}.json", id)), descriptor.to_string()).unwrap();
    }
    let server_lib = artifact(root, "server-lib.jar", b"server library");
    fs::write(
        root.join("repo/hmod125.json"),
        serde_json::json!({"id": "hmod125", "libraries": [{"name": "org.test:server-lib:1", "downloads": {"artifact": server_lib}}]})
            .to_string(),
    )
    .unwrap();
    fs::write(
        root.join("repo/hmod125.zip"),
        zip_bytes(&[("bin/Minecraft_Mod.jar", b"mod jar")]),
    )
    .unwrap();

    fs::write(
        root.join("versions.json"),
        r#"[
            {"id": "a1.2.2", "type": "old_alpha", "releaseTime": "2010-11-10T00:00:00+00:00", "url": "repo/a1.2.2.json"},
            {"id": "a1.2.6", "type": "old_alpha", "releaseTime": "2010-12-03T00:00:00+00:00", "url": "repo/a1.2.6.json"},
            {"id": "b1.7.3", "type": "old_beta", "releaseTime": "2011-07-08T00:00:00+00:00", "url": "repo/missing.json"},
            {"id": "c0.30_01c", "type": "old_alpha", "releaseTime": "not a date"}
        ]"#,
    )
    .unwrap();
    fs::write(
        root.join("mod_versions/versions.json"),
        r#"[{"id": "hmod125", "type": "hmod", "url": "repo/hmod125.json", "resources": "repo/hmod125.zip", "serverVersions": ["0.2.4"]}]"#,
    )
    .unwrap();

    temp_dir
}

#[test]
fn test_versions_lists_newest_first() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["versions"], test_dir);

    assert!(success, "Versions command should succeed. output: {}", output);
    assert!(output.contains("4 game version(s)"), "output: {}", output);
    assert!(output.contains("Beta 1.7.3"), "output: {}", output);
    assert!(output.contains("Classic 0.30_01c"), "output: {}", output);

    // Undated entries come first, then newest to oldest
    let classic = output.find("c0.30_01c").unwrap();
    let beta = output.find("b1.7.3").unwrap();
    let alpha = output.find("a1.2.2").unwrap();
    assert!(classic < beta && beta < alpha, "unexpected order: {}", output);
}

#[test]
fn test_versions_mod_namespace() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["versions", "--mod"], test_dir);

    assert!(success, "output: {}", output);
    assert!(output.contains("1 mod version(s)"), "output: {}", output);
    assert!(output.contains("hmod125"), "output: {}", output);
}

#[test]
fn test_compat_resolves_client_range() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["compat", "hmod 125"], test_dir);

    assert!(success, "output: {}", output);
    assert!(output.contains("a1.2.2"), "output: {}", output);
    assert!(!output.contains("a1.2.6"), "output: {}", output);
}

#[test]
fn test_compat_server_target() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["compat", "125", "--target", "server"], test_dir);

    assert!(success, "output: {}", output);
    assert!(output.contains("0.2.4"), "output: {}", output);
}

#[test]
fn test_compat_unknown_mod_build_fails() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["compat", "hmod9000"], test_dir);

    assert!(!success, "Unknown mod build should fail. output: {}", output);
    assert!(output.contains("No compatibility data"), "output: {}", output);
}

#[test]
fn test_setup_installs_version() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["setup", "a1.2.6"], test_dir);

    assert!(success, "Setup should succeed. output: {}", output);
    assert!(output.contains("Setup a1.2.6 finished"), "output: {}", output);

    let root = temp_dir.path();
    assert_eq!(fs::read(root.join("jars/minecraft_client.jar")).unwrap(), b"client bytes");
    assert!(root.join("libraries/test/lib.jar").exists());
    let descriptor = fs::read_to_string(root.join("conf/version.json")).unwrap();
    assert!(descriptor.contains("a1.2.6"));

    let (success, output, _) = run_command(&["status"], test_dir);
    assert!(success, "output: {}", output);
    assert!(output.contains("Active version: a1.2.6"), "output: {}", output);
}

#[test]
fn test_setup_unknown_version_is_canceled_without_answer() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["setup", "a9.9"], test_dir);

    assert!(!success, "Setup should not succeed. output: {}", output);
    assert!(output.contains("canceled"), "output: {}", output);
    assert!(!temp_dir.path().join("jars").exists());
}

#[test]
fn test_setup_unknown_version_with_chosen_answer() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["--choose", "a1.2.2", "setup", "a9.9"], test_dir);

    assert!(success, "output: {}", output);
    let descriptor = fs::read_to_string(temp_dir.path().join("conf/version.json")).unwrap();
    assert!(descriptor.contains("a1.2.2"));
}

#[test]
fn test_setup_broken_descriptor_fails() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["setup", "b1.7.3"], test_dir);

    assert!(!success, "output: {}", output);
    assert!(output.contains("stage 1 (Preparing) failed"), "output: {}", output);
}

#[test]
fn test_setup_mod_installs_both_sides() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["setup-mod", "125"], test_dir);

    assert!(success, "Mod setup should succeed. output: {}", output);
    let root = temp_dir.path();
    assert_eq!(fs::read(root.join("jars/minecraft_mod.jar")).unwrap(), b"mod jar");
    assert!(root.join("libraries/test/server-lib.jar").exists());
    let mod_descriptor = fs::read_to_string(root.join("conf/mod.json")).unwrap();
    assert!(mod_descriptor.contains("hmod125"));
    assert!(mod_descriptor.contains("--demo"));

    let (_, output, _) = run_command(&["status"], test_dir);
    assert!(output.contains("Active version: a1.2.2"), "output: {}", output);
    assert!(output.contains("Active mod build: hmod125"), "output: {}", output);
}

#[test]
fn test_status_reports_failed_manifest() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    fs::remove_dir_all(temp_dir.path().join("mod_versions")).unwrap();

    let (success, output, _) = run_command_with_env(
        &["status"],
        test_dir,
        &[("MCP_MOD_VERSIONS_URL", "missing/mods.json")],
    );

    assert!(!success, "Status should report the failure. output: {}", output);
    assert!(output.contains("failed to load mod manifest"), "output: {}", output);
    assert!(output.contains("4 game version(s) loaded"), "output: {}", output);
}

#[test]
fn test_non_default_manifest_warns() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command_with_env(
        &["versions"],
        test_dir,
        &[("MCP_VERSIONS_URL", "https://mirror.invalid/versions.json")],
    );

    assert!(success, "output: {}", output);
    assert!(output.contains("non-default version manifest"), "output: {}", output);
}

#[test]
fn test_backup_without_sources_fails() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output, _) = run_command(&["backup"], test_dir);

    assert!(!success, "output: {}", output);
    assert!(output.contains("no sources to back up"), "output: {}", output);
}

#[cfg(unix)]
#[test]
fn test_decompile_backs_up_existing_sources() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(temp_dir.path().join("src/Start.java"), b"class Start {}").unwrap();

    let (success, output, _) = run_command(
        &["--yes", "decompile", "sh", "-c", "touch src/Decompiled.java"],
        test_dir,
    );

    assert!(success, "output: {}", output);
    assert!(temp_dir.path().join("src/Decompiled.java").exists());
    let backups = fs::read_dir(temp_dir.path().join("backups")).unwrap().count();
    assert_eq!(backups, 1);
}

#[cfg(unix)]
#[test]
fn test_decompile_declined_without_yes() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(temp_dir.path().join("src/Start.java"), b"class Start {}").unwrap();

    let (success, _, _) = run_command(&["decompile", "sh", "-c", "touch src/Decompiled.java"], test_dir);

    assert!(!success);
    assert!(!temp_dir.path().join("src/Decompiled.java").exists());
}

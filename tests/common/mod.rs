#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

pub const CONVERT_JSON: &str = r#"{"name":"convert","help":"Convert image","donor":true,"donor_tier":1,"parameters":["format","url"]}"#;

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small catalog: `donor/convert`, `util/ping`, a broken `util/b.json`
/// and an empty `empty/` category.
pub fn write_catalog(root: &Path) {
    write_file(root, "donor/convert.json", CONVERT_JSON);
    write_file(root, "util/a.json", r#"{"name":"ping","help":"Pong"}"#);
    write_file(root, "util/b.json", "{ this is not json");
    fs::create_dir_all(root.join("empty")).unwrap();
}

/// Run git in `dir`, panicking with stderr on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Catalog Tests",
            "-c",
            "user.email=tests@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create an upstream repository on branch `main` holding `cmds/donor/convert.json`.
pub fn init_upstream(dir: &Path) -> String {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    write_file(dir, "cmds/donor/convert.json", CONVERT_JSON);
    commit_all(dir, "initial commands")
}

/// Stage everything in `dir`, commit, and return the new HEAD.
pub fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

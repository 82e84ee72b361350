//! The literal end-to-end scenarios from `spec.md` §8, driven through the
//! `huge` binary with `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;

fn huge(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("huge").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn read(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn init_then_status() {
    let dir = tempfile::tempdir().unwrap();

    huge(dir.path()).arg("init").assert().success();
    huge(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout("Not staged for commit:\n  A .hugeignore\n");
}

#[test]
fn first_commit() {
    let dir = tempfile::tempdir().unwrap();
    huge(dir.path()).arg("init").assert().success();

    std::fs::create_dir(dir.path().join("folder")).unwrap();
    std::fs::write(dir.path().join("folder/first_file.txt"), "Content").unwrap();

    huge(dir.path()).args(["add", "folder"]).assert().success();
    huge(dir.path()).arg("commit").assert().success();

    let current = read(&dir.path().join(".huge/current"));
    assert_eq!(current.trim().len(), 32);

    let storage: Vec<_> = std::fs::read_dir(dir.path().join(".huge/storage")).unwrap().collect();
    assert_eq!(storage.len(), 2, "expect one blob for the file and one for the default ignore file");

    let files = read(&dir.path().join(".huge/commits").join(current.trim()).join("files"));
    assert!(files.contains("folder/first_file.txt"));
    assert!(files.contains(".hugeignore"));
}

#[test]
fn change_then_commit() {
    let dir = tempfile::tempdir().unwrap();
    huge(dir.path()).arg("init").assert().success();

    std::fs::create_dir(dir.path().join("folder")).unwrap();
    std::fs::write(dir.path().join("folder/first_file.txt"), "Content").unwrap();
    huge(dir.path()).args(["add", "folder"]).assert().success();
    huge(dir.path()).arg("commit").assert().success();
    let first = read(&dir.path().join(".huge/current")).trim().to_string();

    std::fs::write(dir.path().join("folder/first_file.txt"), "ContentChanged").unwrap();
    huge(dir.path()).args(["add", "folder"]).assert().success();
    huge(dir.path())
        .args(["commit", "-m", "Changing first_file.txt"])
        .assert()
        .success();
    let second = read(&dir.path().join(".huge/current")).trim().to_string();

    assert_ne!(first, second);
    let message = read(&dir.path().join(".huge/commits").join(&second).join("message"));
    assert_eq!(message, "Changing first_file.txt");
    let parents = read(&dir.path().join(".huge/commits").join(&second).join("parents"));
    assert_eq!(parents.trim(), first);
}

#[test]
fn checkout_previous_refuses_a_dirty_workspace() {
    let dir = tempfile::tempdir().unwrap();
    huge(dir.path()).arg("init").assert().success();

    std::fs::create_dir(dir.path().join("folder")).unwrap();
    std::fs::write(dir.path().join("folder/first_file.txt"), "Content").unwrap();
    huge(dir.path()).args(["add", "folder"]).assert().success();
    huge(dir.path()).arg("commit").assert().success();
    let first = read(&dir.path().join(".huge/current")).trim().to_string();

    std::fs::write(dir.path().join("folder/first_file.txt"), "ContentChanged").unwrap();
    huge(dir.path()).args(["add", "folder"]).assert().success();
    huge(dir.path()).arg("commit").assert().success();
    let second = read(&dir.path().join(".huge/current")).trim().to_string();

    huge(dir.path()).args(["checkout", &first]).assert().success();
    assert_eq!(read(&dir.path().join("folder/first_file.txt")), "Content");

    std::fs::write(dir.path().join("folder/first_file.txt"), "dirty").unwrap();
    huge(dir.path())
        .args(["checkout", &second])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workspace has changes. Aborted."));

    std::fs::write(dir.path().join("folder/first_file.txt"), "Content").unwrap();
    huge(dir.path()).args(["checkout", &second]).assert().success();
    assert_eq!(read(&dir.path().join("folder/first_file.txt")), "ContentChanged");
}

#[test]
fn ignore_file_excludes_matching_paths_from_status() {
    let dir = tempfile::tempdir().unwrap();
    huge(dir.path()).arg("init").assert().success();

    std::fs::write(dir.path().join(".hugeignore"), ".*second.*\n").unwrap();
    std::fs::write(dir.path().join("first_file.txt"), "Content").unwrap();
    std::fs::write(dir.path().join("second_file.txt"), "Content2").unwrap();

    huge(dir.path())
        .args(["add", "first_file.txt", ".hugeignore", "second_file.txt"])
        .assert()
        .success();

    let output = huge(dir.path()).arg("status").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("A .hugeignore"));
    assert!(stdout.contains("A first_file.txt"));
    assert!(!stdout.contains("second_file.txt"));
}

#[test]
fn pull_before_checkout() {
    let origin_parent = tempfile::tempdir().unwrap();
    let origin = origin_parent.path().join("origin");
    std::fs::create_dir(&origin).unwrap();
    huge(&origin).arg("init").assert().success();

    std::fs::write(origin.join("first_file.txt"), "Content").unwrap();
    huge(&origin).args(["add", "first_file.txt"]).assert().success();
    huge(&origin).arg("commit").assert().success();
    let commit_id = read(&origin.join(".huge/current")).trim().to_string();

    let workdir = tempfile::tempdir().unwrap();
    huge(workdir.path())
        .args(["clone", &origin.display().to_string()])
        .assert()
        .success();

    let clone_dir = workdir.path().join("origin");
    huge(&clone_dir).arg("log").assert().success();

    huge(&clone_dir)
        .args(["checkout", &commit_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("huge pull {commit_id}")));

    huge(&clone_dir).args(["pull", &commit_id]).assert().success();
    huge(&clone_dir).args(["checkout", &commit_id]).assert().success();
    assert_eq!(read(&clone_dir.join("first_file.txt")), "Content");
}

//! End-to-end batches against a stand-in engine written in POSIX shell.
//! It follows the age command line closely enough for the orchestrator:
//! `-o` names the output, `-d` switches to decryption, the input comes last.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

const FAKE_AGE: &str = r#"#!/bin/sh
mode=enc
out=""
while [ $# -gt 1 ]; do
    case "$1" in
        -d) mode=dec; shift ;;
        -o) out="$2"; shift 2 ;;
        -R|-i) shift 2 ;;
        *) shift ;;
    esac
done
in="$1"
if [ "$mode" = enc ]; then
    { echo FAKE-AGE; cat "$in"; } > "$out"
else
    if [ "$(head -n 1 "$in")" != FAKE-AGE ]; then
        echo "age: error: no identity matched any of the recipients" >&2
        exit 1
    fi
    tail -n +2 "$in" > "$out"
fi
"#;

const BROKEN_AGE: &str = "#!/bin/sh\necho 'age: error: boom' >&2\nexit 1\n";

const HANGING_AGE: &str = "#!/bin/sh\nexec sleep 30\n";

/// Install an executable engine script under `dir/bin`.
fn install_engine(dir: &TempDir, script: &str) -> PathBuf {
    let path = dir.path().join("bin").join("age");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Run agebatch against `engine` with an isolated config directory.
fn agebatch(dir: &TempDir, engine: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("agebatch");
    cmd.current_dir(dir.path().join("work"))
        .arg("--config")
        .arg(dir.path().join("config"))
        .arg("--engine")
        .arg(engine);
    cmd
}

/// Key pair outside the work folder, as absolute paths.
fn write_key_pair(dir: &TempDir) -> (PathBuf, PathBuf) {
    let identity = age::x25519::Identity::generate();
    let public = dir.child("keys/team.pub");
    let private = dir.child("keys/team.key");
    public
        .write_str(&format!("{}\n", identity.to_public()))
        .unwrap();
    private
        .write_str(&format!("{}\n", identity.to_string().expose_secret()))
        .unwrap();
    (public.path().to_path_buf(), private.path().to_path_buf())
}

fn work_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path().join("work"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn encrypt_then_decrypt_round_trip() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, private) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();
    dir.child("work/b.txt").write_str("bravo\n").unwrap();
    dir.child("work/notes").write_str("no extension").unwrap();

    agebatch(&dir, &engine)
        .args(["encrypt", "a.txt", "b.txt", "notes", "-k"])
        .arg(&public)
        .assert()
        .success()
        .stdout(predicate::str::contains("Encryption complete: 3/3 file(s)"));

    assert_eq!(
        work_files(&dir),
        vec!["a.txt", "a.txt.age", "b.txt", "b.txt.age", "notes", "notes.age"]
    );

    agebatch(&dir, &engine)
        .args(["decrypt", "a.txt.age", "b.txt.age", "notes.age", "-k"])
        .arg(&private)
        .assert()
        .success()
        .stdout(predicate::str::contains("Decryption complete: 3/3 file(s)"));

    // Originals are still there, so every decrypted file gets a free name.
    let work = dir.child("work");
    work.child("a (1).txt").assert("alpha\n");
    work.child("b (1).txt").assert("bravo\n");
    work.child("notes (1)").assert("no extension");

    assert_eq!(work_files(&dir).len(), 9, "no temp files left behind");
}

#[test]
fn encrypting_twice_never_overwrites() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();

    for _ in 0..2 {
        agebatch(&dir, &engine)
            .args(["encrypt", "a.txt", "-k"])
            .arg(&public)
            .assert()
            .success();
    }

    assert_eq!(
        work_files(&dir),
        vec!["a.txt", "a.txt (1).age", "a.txt.age"]
    );
}

#[test]
fn folders_are_walked_and_hidden_files_skipped() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("work/docs/one.txt").write_str("1").unwrap();
    dir.child("work/docs/sub/two.txt").write_str("2").unwrap();
    dir.child("work/docs/.DS_Store").write_str("junk").unwrap();

    agebatch(&dir, &engine)
        .args(["encrypt", "docs", "-k"])
        .arg(&public)
        .assert()
        .success()
        .stdout(predicate::str::contains("2/2 file(s)"));

    dir.child("work/docs/one.txt.age")
        .assert(predicate::path::exists());
    dir.child("work/docs/sub/two.txt.age")
        .assert(predicate::path::exists());
    dir.child("work/docs/.DS_Store.age")
        .assert(predicate::path::missing());
}

#[test]
fn process_picks_mode_from_files() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, private) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();

    agebatch(&dir, &engine)
        .args(["process", "a.txt", "-k"])
        .arg(&public)
        .assert()
        .success()
        .stdout(predicate::str::contains("Encryption complete"));

    std::fs::remove_file(dir.path().join("work/a.txt")).unwrap();

    agebatch(&dir, &engine)
        .args(["process", "a.txt.age", "-k"])
        .arg(&private)
        .assert()
        .success()
        .stdout(predicate::str::contains("Decryption complete"));

    dir.child("work/a.txt").assert("alpha\n");
}

#[test]
fn remembered_recipients_are_reused() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();
    dir.child("work/b.txt").write_str("bravo\n").unwrap();

    agebatch(&dir, &engine)
        .args(["encrypt", "a.txt", "-k"])
        .arg(&public)
        .assert()
        .success();

    // No --key this time.
    agebatch(&dir, &engine)
        .args(["encrypt", "b.txt"])
        .assert()
        .success();

    dir.child("work/b.txt.age").assert(predicate::path::exists());
}

#[test]
fn remembering_can_be_turned_off() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("config/config.toml")
        .write_str("[keys]\nremember = false\n")
        .unwrap();
    dir.child("work/a.txt").write_str("alpha\n").unwrap();

    agebatch(&dir, &engine)
        .args(["encrypt", "a.txt", "-k"])
        .arg(&public)
        .assert()
        .success();

    dir.child("config/recipients.txt")
        .assert(predicate::path::missing());
}

#[test]
fn wrong_identity_fails_only_that_file() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, private) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();

    agebatch(&dir, &engine)
        .args(["encrypt", "a.txt", "-k"])
        .arg(&public)
        .assert()
        .success();

    dir.child("work/forged.txt.age")
        .write_str("not from the engine\n")
        .unwrap();

    agebatch(&dir, &engine)
        .args(["decrypt", "a.txt.age", "forged.txt.age", "-k"])
        .arg(&private)
        .assert()
        .failure()
        .stderr(predicate::str::contains("forged.txt.age"))
        .stderr(predicate::str::contains("no identity matched"))
        .stdout(predicate::str::contains("1 of 2 file(s) failed"));

    dir.child("work/a (1).txt").assert("alpha\n");
    dir.child("work/forged.txt").assert(predicate::path::missing());
}

#[test]
fn broken_engine_fails_every_file() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, BROKEN_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();
    dir.child("work/b.txt").write_str("bravo\n").unwrap();

    agebatch(&dir, &engine)
        .args(["encrypt", "a.txt", "b.txt", "-k"])
        .arg(&public)
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"))
        .stdout(predicate::str::contains("2 of 2 file(s) failed"));

    assert_eq!(work_files(&dir), vec!["a.txt", "b.txt"]);
}

#[test]
fn hanging_engine_is_stopped_at_the_timeout() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, HANGING_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();

    let started = std::time::Instant::now();
    agebatch(&dir, &engine)
        .args(["--timeout", "1", "encrypt", "a.txt", "-k"])
        .arg(&public)
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not finish within 1 second and"));

    assert!(started.elapsed() < std::time::Duration::from_secs(20));
    assert_eq!(work_files(&dir), vec!["a.txt"]);
}

#[test]
fn json_output_describes_every_file() {
    let dir = TempDir::new().unwrap();
    let engine = install_engine(&dir, FAKE_AGE);
    let (public, _) = write_key_pair(&dir);
    dir.child("work/a.txt").write_str("alpha\n").unwrap();

    let out = agebatch(&dir, &engine)
        .args(["--json", "encrypt", "a.txt", "-k"])
        .arg(&public)
        .output()
        .unwrap();
    assert!(out.status.success());

    let result: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["mode"], "encrypt");
    assert_eq!(result["success_count"], 1);
    assert_eq!(result["total_count"], 1);
    assert_eq!(result["outcomes"][0]["status"], "succeeded");
    assert!(
        result["outcomes"][0]["output"]
            .as_str()
            .unwrap()
            .ends_with("a.txt.age")
    );
}

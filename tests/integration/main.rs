//! Integration tests for cadir

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;

    fn cadir() -> Command {
        cargo_bin_cmd!("cadir")
    }

    /// cadir isolated from any user or project config, run inside `dir`
    fn cadir_in(dir: &Path) -> Command {
        let mut cmd = cadir();
        cmd.current_dir(dir)
            .arg("--no-local")
            .arg("--config")
            .arg(dir.join("no-config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        cadir()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--cache-source"))
            .stdout(predicate::str::contains("Exit codes"));
    }

    #[test]
    fn version_displays() {
        cadir()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cadir"));
    }

    #[test]
    fn missing_arguments_exit_1() {
        cadir().assert().code(1);
    }

    #[test]
    fn missing_destination_exit_1() {
        let dir = tempfile::TempDir::new().unwrap();
        cadir_in(dir.path())
            .args(["--cache-source", "deps", "--identity-file", "app.lock"])
            .args(["--setup", "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--cache-destination"));
    }

    #[test]
    fn invalid_config_exit_11() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.toml"), "[cache\n").unwrap();
        cadir()
            .current_dir(dir.path())
            .args(["--no-local", "--config", "bad.toml"])
            .args(["--cache-source", "deps", "--identity-file", "app.lock"])
            .args(["--cache-destination", "cache", "--setup", "true"])
            .assert()
            .code(11);
    }
}

#[cfg(unix)]
mod cache_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SETUP: &str = "mkdir -p deps && echo built > deps/out.txt && echo x >> setup-runs";

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.lock"), "v1").unwrap();
        dir
    }

    fn cadir_in(dir: &Path, setup: &str) -> Command {
        let mut cmd = cargo_bin_cmd!("cadir");
        cmd.current_dir(dir)
            .arg("--no-local")
            .arg("--config")
            .arg(dir.join("no-config.toml"))
            .args(["--cache-source", "deps"])
            .args(["--identity-file", "app.lock"])
            .args(["--cache-destination", "cache"])
            .args(["--setup", setup]);
        cmd
    }

    fn entries(dir: &Path) -> Vec<String> {
        match fs::read_dir(dir.join("cache")) {
            Ok(rd) => rd
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn setup_runs(dir: &Path) -> usize {
        fs::read_to_string(dir.join("setup-runs"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    #[test]
    fn miss_then_hit() {
        let dir = project();

        cadir_in(dir.path(), SETUP).assert().success();
        let stored = entries(dir.path());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], "6654c734ccab8f440ff0825eb443dc7f");

        fs::remove_dir_all(dir.path().join("deps")).unwrap();
        cadir_in(dir.path(), SETUP).assert().success();

        assert_eq!(
            fs::read_to_string(dir.path().join("deps/out.txt")).unwrap(),
            "built\n"
        );
        assert_eq!(setup_runs(dir.path()), 1);
    }

    #[test]
    fn changed_identity_is_a_miss() {
        let dir = project();
        cadir_in(dir.path(), SETUP).assert().success();

        fs::write(dir.path().join("app.lock"), "v2").unwrap();
        cadir_in(dir.path(), SETUP).assert().success();

        assert_eq!(entries(dir.path()).len(), 2);
        assert_eq!(setup_runs(dir.path()), 2);
    }

    #[test]
    fn archive_miss_then_hit() {
        let dir = project();

        cadir_in(dir.path(), SETUP).arg("--archive").assert().success();
        let stored = entries(dir.path());
        assert_eq!(stored.len(), 1);
        assert!(stored[0].ends_with(".tar.gz"));

        fs::remove_dir_all(dir.path().join("deps")).unwrap();
        cadir_in(dir.path(), SETUP).arg("-a").assert().success();

        assert_eq!(
            fs::read_to_string(dir.path().join("deps/out.txt")).unwrap(),
            "built\n"
        );
        assert_eq!(setup_runs(dir.path()), 1);
    }

    #[test]
    fn link_with_relative_destination() {
        let dir = project();
        cadir_in(dir.path(), SETUP).assert().success();

        cadir_in(dir.path(), SETUP).arg("--link").assert().success();

        let source = dir.path().join("deps");
        assert!(fs::symlink_metadata(&source).unwrap().file_type().is_symlink());
        let target = fs::read_link(&source).unwrap();
        assert!(target.is_absolute());
        let entry = dir.path().join("cache").join(&entries(dir.path())[0]);
        assert_eq!(
            target.canonicalize().unwrap(),
            entry.canonicalize().unwrap()
        );
        assert_eq!(
            fs::read_to_string(source.join("out.txt")).unwrap(),
            "built\n"
        );
    }

    #[test]
    fn identity_file_missing_exit_2() {
        let dir = TempDir::new().unwrap();

        cadir_in(dir.path(), SETUP)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("identity file"));

        assert!(!dir.path().join("cache").exists());
        assert_eq!(setup_runs(dir.path()), 0);
    }

    #[test]
    fn setup_failure_exit_3() {
        let dir = project();

        cadir_in(dir.path(), "exit 1")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Setup command failed"));

        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn finalize_failure_exit_4() {
        let dir = project();
        cadir_in(dir.path(), SETUP).assert().success();

        cadir_in(dir.path(), SETUP)
            .args(["--finalize", "exit 2"])
            .assert()
            .code(4);
    }

    #[test]
    fn verbose_streams_setup_output() {
        let dir = project();

        cadir_in(dir.path(), "echo hello-from-setup && mkdir deps")
            .arg("-v")
            .assert()
            .success()
            .stdout(predicate::str::contains("hello-from-setup"));
    }

    #[test]
    fn quiet_discards_setup_output() {
        let dir = project();

        cadir_in(dir.path(), "echo hello-from-setup && mkdir deps")
            .assert()
            .success()
            .stdout(predicate::str::contains("hello-from-setup").not());
    }

    #[test]
    fn local_config_supplies_destination() {
        let dir = project();
        fs::write(
            dir.path().join(".cadir.toml"),
            "[cache]\ndestination = \"cache\"\n",
        )
        .unwrap();

        cargo_bin_cmd!("cadir")
            .current_dir(dir.path())
            .arg("--config")
            .arg(dir.path().join("no-config.toml"))
            .args(["--cache-source", "deps", "--identity-file", "app.lock"])
            .args(["--setup", SETUP])
            .assert()
            .success();

        assert_eq!(entries(dir.path()).len(), 1);
    }

    #[test]
    fn debug_logging_covers_config_discovery() {
        let dir = project();
        fs::write(
            dir.path().join(".cadir.toml"),
            "[cache]\ndestination = \"cache\"\n",
        )
        .unwrap();

        cargo_bin_cmd!("cadir")
            .current_dir(dir.path())
            .env_remove("CADIR_LOG")
            .arg("--config")
            .arg(dir.path().join("no-config.toml"))
            .args(["--cache-source", "deps", "--identity-file", "app.lock"])
            .args(["--setup", SETUP, "-vv"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Found local config"));
    }
}

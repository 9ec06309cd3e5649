use crate::common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let env = TestEnv::new();
    env.jv()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("add-path"));
}

#[test]
fn test_version_flag() {
    let env = TestEnv::new();
    env.jv()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_add_list_and_remove() {
    let env = TestEnv::new();
    let jdk = env.jdk("graalvm-21", Some("21.0.1"));

    env.jv()
        .arg("add")
        .arg(&jdk)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Java 21.0.1"));
    assert_eq!(env.config().custom_paths, [jdk.clone()]);

    env.jv()
        .arg("add")
        .arg(&jdk)
        .assert()
        .success()
        .stdout(predicate::str::contains("already registered"));

    env.jv()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("21.0.1"))
        .stdout(predicate::str::contains("[custom]"));

    env.jv().arg("remove").arg(&jdk).assert().success();
    assert!(env.config().custom_paths.is_empty());
}

#[test]
fn test_add_rejects_non_jdk() {
    let env = TestEnv::new();
    env.jv()
        .arg("add")
        .arg(env.temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not contain a JDK"));
    assert!(!env.config_path.exists());
}

#[test]
fn test_search_paths() {
    let env = TestEnv::new();
    let dir = env.jdk("jdk-17.0.2", None).parent().unwrap().to_path_buf();

    env.jv().arg("add-path").arg(&dir).assert().success();
    env.jv()
        .arg("paths")
        .assert()
        .success()
        .stdout(predicate::str::contains(dir.to_string_lossy().as_ref()));
    env.jv()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("17.0.2"))
        .stdout(predicate::str::contains("[detected]"));

    env.jv().arg("remove-path").arg(&dir).assert().success();
    env.jv()
        .arg("remove-path")
        .arg(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_use_unknown_version_fails() {
    let env = TestEnv::new();
    env.jv()
        .args(["use", "99.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Java '99.1' not found"));
}

#[test]
fn test_uninstall_requires_installed_jdk() {
    let env = TestEnv::new();
    env.jv()
        .args(["uninstall", "21"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Installed Java '21' not found"));
}

#[test]
fn test_unreadable_config_is_reported() {
    let env = TestEnv::new();
    std::fs::create_dir_all(env.config_path.parent().unwrap()).unwrap();
    std::fs::write(&env.config_path, "{ broken").unwrap();

    env.jv()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

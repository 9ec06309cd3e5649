use jv_cli::env::{EnvVar, EnvironmentManager, PathFlavor, PathListRewriter, ProfileStore};
use jv_cli::test_utils::MemoryStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_profile_store_switches_homes() {
    let temp = TempDir::new().unwrap();
    let profile = temp.path().join("env.sh");
    let env = EnvironmentManager::new(ProfileStore::at(&profile));

    env.set_home(Path::new("/opt/jdk-17")).unwrap();
    env.set_home(Path::new("/opt/jdk-21/")).unwrap();

    assert_eq!(env.get_home().unwrap().unwrap(), Path::new("/opt/jdk-21"));
    assert_eq!(env.search_path().unwrap(), "$JAVA_HOME/bin");

    let snippet = fs::read_to_string(&profile).unwrap();
    assert!(snippet.contains("export JAVA_HOME='/opt/jdk-21'"));
    assert_eq!(snippet.matches("JAVA_HOME/bin").count(), 1);
}

#[test]
fn test_rewrite_is_idempotent() {
    let rewriter = PathListRewriter::new(PathFlavor::Windows, "JAVA_HOME");
    let lists = [
        "",
        r"C:\Windows\system32",
        r"%JAVA_HOME%\bin;C:\Windows",
        r"C:\X\bin;C:\Tools;c:\x\BIN\;%java_home%\bin",
        r" C:\Tools ; ;C:\Y\bin;C:\Windows ",
    ];

    for list in lists {
        for old in [None, Some(r"C:\X"), Some(r"C:\Y")] {
            let once = rewriter.rewrite(list, old, r"C:\Y");
            let twice = rewriter.rewrite(&once, Some(r"C:\Y"), r"C:\Y");
            assert_eq!(once, twice, "list {list:?}, old {old:?}");
            assert_eq!(rewriter.count_home_references(&once, Some(r"C:\Y")), 1);
        }
    }
}

#[test]
fn test_rewrite_ignores_case() {
    let rewriter = PathListRewriter::new(PathFlavor::Windows, "JAVA_HOME");
    for stale in [r"C:\X\bin", r"c:\x\bin", r"C:\x\BIN\"] {
        let list = format!("{stale};OTHER");
        assert_eq!(
            rewriter.rewrite(&list, Some(r"C:\X"), r"C:\Y"),
            r"%JAVA_HOME%\bin;OTHER"
        );
    }
}

#[test]
fn test_half_applied_write_is_repaired_by_rerun() {
    let store = MemoryStore::new(PathFlavor::Posix)
        .with(EnvVar::SearchPath, "/usr/bin")
        .failing_writes_of(EnvVar::SearchPath);
    let env = EnvironmentManager::new(store);

    assert!(env.set_home(Path::new("/opt/jdk-21")).is_err());
    assert_eq!(env.store().value(EnvVar::Home).as_deref(), Some("/opt/jdk-21"));
    assert_eq!(env.search_path().unwrap(), "/usr/bin");

    // The same stored state, re-run against a store that accepts the write.
    let healthy = EnvironmentManager::new(
        MemoryStore::new(PathFlavor::Posix)
            .with(EnvVar::Home, "/opt/jdk-21")
            .with(EnvVar::SearchPath, "/usr/bin"),
    );
    healthy.set_home(Path::new("/opt/jdk-21")).unwrap();
    assert_eq!(healthy.search_path().unwrap(), "$JAVA_HOME/bin:/usr/bin");
}

//! Sandbox boundary tests: path containment, permission rules, and
//! host-supplied redirect objects.

use pretty_assertions::assert_eq;
use shellbox::{Access, Error, RedirectObject, Shell};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_path_traversal_blocked_in_scripts() {
    let mut shell = Shell::new();
    let result = shell.exec("cat /../outside").await.unwrap();
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr_text().contains("path traversal"));
}

#[tokio::test]
async fn test_path_traversal_blocked_on_host_handle() {
    let shell = Shell::new();
    let err = shell
        .fs()
        .read_file(Path::new("/a/../../b"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PathTraversal(_)));
}

#[tokio::test]
async fn test_balanced_dotdot_is_allowed() {
    let mut shell = Shell::new();
    shell.fs().mkdir(Path::new("/dir"), false).await.unwrap();
    shell
        .fs()
        .write_file(Path::new("/top.txt"), b"ok\n")
        .await
        .unwrap();
    let result = shell.exec("cat /dir/../top.txt").await.unwrap();
    assert_eq!(result.stdout_text(), "ok\n");
}

#[tokio::test]
async fn test_read_only_rule_blocks_script_writes() {
    let mut shell = Shell::builder()
        .rule("/conf/**", Access::ReadOnly)
        .build();
    shell.fs().mkdir(Path::new("/conf"), false).await.unwrap();

    let result = shell.exec("echo x > /conf/app.ini").await.unwrap();
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr_text().contains("read-only"));
    assert!(!shell.fs().exists(Path::new("/conf/app.ini")).await.unwrap());
}

#[tokio::test]
async fn test_excluded_rule_blocks_reads() {
    let mut shell = Shell::builder()
        .rule("/vault/**", Access::Excluded)
        .build();

    let result = shell.exec("cat /vault/secret").await.unwrap();
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr_text().contains("excluded"));
}

#[tokio::test]
async fn test_excluded_paths_hidden_from_globs() {
    let mut shell = Shell::builder()
        .rule("/private/**", Access::Excluded)
        .build();
    let fs = shell.fs();
    fs.mkdir(Path::new("/private"), false).await.unwrap();
    fs.store()
        .write(Path::new("/private/key"), b"secret")
        .await
        .unwrap();
    fs.write_file(Path::new("/visible.txt"), b"").await.unwrap();

    let result = shell.exec("echo /*").await.unwrap();
    let stdout = result.stdout_text();
    assert!(stdout.contains("/visible.txt"));
    assert!(stdout.contains("/private"), "the directory itself is not excluded");

    let result = shell.exec("echo /private/*").await.unwrap();
    // No visible matches: the pattern is preserved literally.
    assert_eq!(result.stdout_text(), "/private/*\n");
}

#[tokio::test]
async fn test_specific_rule_overrides_broad_rule() {
    let mut shell = Shell::builder()
        .rule("/data/**", Access::ReadOnly)
        .rule("/data/scratch/*", Access::ReadWrite)
        .build();
    let fs = shell.fs();
    fs.mkdir(Path::new("/data"), false).await.unwrap();
    fs.mkdir(Path::new("/data/scratch"), false).await.unwrap();

    let denied = shell.exec("echo x > /data/out.txt").await.unwrap();
    assert_eq!(denied.exit_code, 1);

    let allowed = shell.exec("echo x > /data/scratch/out.txt").await.unwrap();
    assert_eq!(allowed.exit_code, 0);
}

#[tokio::test]
async fn test_read_only_shell_variant() {
    let mut shell = Shell::builder().read_only().build();
    shell
        .fs()
        .store()
        .write(Path::new("/seed.txt"), b"seeded\n")
        .await
        .unwrap();

    let read = shell.exec("cat /seed.txt").await.unwrap();
    assert_eq!(read.stdout_text(), "seeded\n");

    let write = shell.exec("echo x > /new.txt").await.unwrap();
    assert_eq!(write.exit_code, 1);
    assert!(write.stderr_text().contains("read-only"));
}

#[tokio::test]
async fn test_redirect_object_input() {
    let mut shell = Shell::builder()
        .redirect_object("__blob_0__", RedirectObject::bytes(vec![0x68, 0x69, 0x0a]))
        .build();
    let result = shell.exec("cat < __blob_0__").await.unwrap();
    assert_eq!(result.stdout, b"hi\n");
}

#[tokio::test]
async fn test_redirect_object_output_truncates_to_capacity() {
    let capture = Arc::new(Mutex::new(vec![0u8; 4]));
    let mut shell = Shell::builder()
        .redirect_object("__buf__", RedirectObject::buffer(Arc::clone(&capture)))
        .build();

    let result = shell.exec("echo overlong > __buf__").await.unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(&*capture.lock().unwrap(), b"over");
}

#[tokio::test]
async fn test_redirect_object_wrong_kind_fails_typed() {
    let mut shell = Shell::builder()
        .redirect_object("__ro__", RedirectObject::text("read only"))
        .build();

    let result = shell.exec("echo x > __ro__").await.unwrap();
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr_text().contains("not a writable buffer"));
}

#[tokio::test]
async fn test_marker_never_treated_as_path() {
    let mut shell = Shell::builder()
        .redirect_object("__blob__", RedirectObject::text("from object"))
        .build();
    // No file named __blob__ exists; the marker resolves to the object.
    let result = shell.exec("cat < __blob__").await.unwrap();
    assert_eq!(result.stdout_text(), "from object");
    assert!(!shell.fs().exists(Path::new("/__blob__")).await.unwrap());
}

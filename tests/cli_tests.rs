use std::io::Write as _;
use std::process::Command;

use serde_json::Value;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
routers:
  main:
    routes:
      - path: /foo
        component: Foo
      - path: /bar
        component: Bar
        children:
          - path: ""
            component: Baz
          - path: qux
            component: Qux
  users:
    options:
      isGlobal: true
    routes:
      - path: /users/:id
        component: User
"#;

fn config_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    file
}

fn vrouter(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_vrouter"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run vrouter")
}

#[test]
fn test_cli_routes_lists_table() {
    let config = config_file();
    let output = vrouter(&["routes", "--config", config.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines.contains(&"main\t/bar@0\tBar\tshadowed"));
    assert!(lines.contains(&"main\t/bar@1\tBaz"));
    assert!(lines.contains(&"main\t/bar/qux@1\tQux"));
    assert!(lines.contains(&"users\t/users/:id@0\tUser"));
}

#[test]
fn test_cli_routes_json_for_one_router() {
    let config = config_file();
    let output = vrouter(&[
        "routes",
        "--config",
        config.path().to_str().unwrap(),
        "--router",
        "users",
        "--json",
    ]);
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let users = report["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["fullPath"], "/users/:id");
    assert_eq!(users[0]["addressable"], true);
    assert!(report.get("main").is_none());
}

#[test]
fn test_cli_resolve_prints_snapshot() {
    let config = config_file();
    let output = vrouter(&[
        "resolve",
        "-c",
        config.path().to_str().unwrap(),
        "-r",
        "users",
        "-p",
        "/users/42?tab=posts#top",
    ]);
    assert!(output.status.success());

    let snapshot: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["path"], "/users/42");
    assert_eq!(snapshot["search"], "?tab=posts");
    assert_eq!(snapshot["hash"], "#top");
    assert_eq!(snapshot["params"]["id"], "42");
    assert_eq!(snapshot["renderList"], serde_json::json!(["User"]));
}

#[test]
fn test_cli_unknown_router_fails() {
    let config = config_file();
    let output = vrouter(&[
        "resolve",
        "-c",
        config.path().to_str().unwrap(),
        "-r",
        "ghost",
        "-p",
        "/",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("router with key \"ghost\" not found"));
}

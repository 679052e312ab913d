//! End-to-end tests for the `resource-forge validate` command.

mod common;
use common::prelude::*;

const VALID_SERVICE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  ports:
    - port: 8080
"#;

const ROUTE: &str = r#"
apiVersion: route.openshift.io/v1
kind: Route
metadata:
  name: web
spec:
  to:
    kind: Service
    name: web
"#;

#[test]
fn test_validate_clean_directory() {
    let fixture = TestFixture::new().with_file("out/kubernetes/web-service.yml", VALID_SERVICE);

    fixture
        .command()
        .args(["--color", "never", "validate", "out/kubernetes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Validation passed"));
}

#[test]
fn test_validate_warns_without_fail_flag() {
    let fixture = TestFixture::new().with_file("out/kubernetes/web-route.yml", ROUTE);

    fixture
        .command()
        .args(["--color", "never", "validate", "out/kubernetes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARN]"))
        .stdout(predicate::str::contains(
            "kind Route is not available on kubernetes",
        ));
}

#[test]
fn test_validate_fail_on_error() {
    let fixture = TestFixture::new().with_file("out/kubernetes/web-route.yml", ROUTE);

    fixture
        .command()
        .args(["validate", "out/kubernetes", "--fail-on-error"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation of kubernetes resources failed"));
}

#[test]
fn test_classifier_overrides_directory_name() {
    let fixture = TestFixture::new().with_file("out/kubernetes/web-route.yml", ROUTE);

    fixture
        .command()
        .args([
            "validate",
            "out/kubernetes",
            "--classifier",
            "openshift",
            "--fail-on-error",
        ])
        .assert()
        .success();
}

#[test]
fn test_missing_directory() {
    TestFixture::new()
        .command()
        .args(["validate", "nowhere/openshift"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Output directory not found"));
}

#[test]
fn test_unknown_classifier() {
    let fixture = TestFixture::new().with_file("out/manifests/web-service.yml", VALID_SERVICE);

    fixture
        .command()
        .args(["validate", "out/manifests"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown platform: manifests"));
}

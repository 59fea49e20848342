// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `riagen` binary.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use ria_fixtures::NORTHWIND_JSON;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SHOP: &str = r#"{
  "assembly": "Shop.Web",
  "types": [
    {
      "name": "Product", "namespace": "Shop", "kind": "entity",
      "source_file": "/srv/Shop/Product.cs",
      "properties": [
        { "name": "Id", "type": "int", "attributes": [ { "type": "Key" } ] },
        { "name": "Name", "type": "string" },
        { "name": "Dimensions", "type": "Shop.Size" }
      ]
    },
    {
      "name": "Size", "namespace": "Shop", "kind": "complex",
      "source_file": "/srv/Shop/Size.shared.cs",
      "properties": [ { "name": "Width", "type": "int" }, { "name": "Height", "type": "int" } ]
    }
  ],
  "services": [
    {
      "name": "ProductService", "namespace": "Shop.Services",
      "attributes": [ { "type": "EnableClientAccess" } ],
      "operations": [
        { "name": "GetProducts", "kind": "query", "return_type": "IQueryable<Shop.Product>" },
        { "name": "InsertProduct", "kind": "insert",
          "parameters": [ { "name": "product", "type": "Shop.Product" } ] }
      ]
    }
  ]
}"#;

fn write_catalog(dir: &TempDir, name: &str, json: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, json).unwrap();
    path
}

fn riagen(config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_riagen"));
    cmd.arg("--config-dir").arg(config_dir).env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn generate_prints_csharp_by_default() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "shop.json", SHOP);
    let text = stdout_of(riagen(&dir.path().join("cfg")).arg("generate").arg("--catalog").arg(&catalog));
    assert!(text.contains("public sealed partial class ProductContext : DomainContext"));
    assert!(text.contains("class Product : Entity"));
    assert!(text.contains("class Size : ComplexObject"));
}

#[test]
fn shared_files_suppress_types_in_process_and_isolated() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "shop.json", SHOP);
    let cfg = dir.path().join("cfg");
    let run = |isolated: bool| {
        let mut cmd = riagen(&cfg);
        cmd.arg("generate")
            .arg("--catalog")
            .arg(&catalog)
            .args(["--shared-file", "/srv/Shop/Size.shared.cs"]);
        if isolated {
            cmd.arg("--isolated");
        }
        stdout_of(&mut cmd)
    };

    let in_process = run(false);
    assert!(!in_process.contains("class Size"));
    assert!(in_process.contains("Dimensions"));
    assert_eq!(run(true), in_process);
}

#[test]
fn logged_errors_fail_without_output() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "northwind.json", NORTHWIND_JSON);
    let out = dir.path().join("Northwind.g.cs");
    riagen(&dir.path().join("cfg"))
        .arg("generate")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("GetAuditLevel"));
    assert!(!out.exists());
}

#[test]
fn unchanged_output_is_not_rewritten() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "shop.json", SHOP);
    let out = dir.path().join("gen").join("Shop.g.cs");
    let cfg = dir.path().join("cfg");
    let generate = || {
        let mut cmd = riagen(&cfg);
        cmd.arg("generate").arg("--catalog").arg(&catalog).arg("--out").arg(&out);
        cmd
    };

    generate()
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("output written"));
    let first = fs::read_to_string(&out).unwrap();
    assert!(first.contains("ProductContext"));

    generate()
        .assert()
        .success()
        .stderr(predicate::str::contains("output unchanged"));
    assert_eq!(fs::read_to_string(&out).unwrap(), first);
}

#[test]
fn saved_preferences_become_defaults() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "shop.json", SHOP);
    let cfg = dir.path().join("cfg");

    let vb = stdout_of(
        riagen(&cfg)
            .arg("generate")
            .arg("--catalog")
            .arg(&catalog)
            .args(["--language", "vb", "--save-prefs"]),
    );
    assert!(vb.contains("Partial Public NotInheritable Class ProductContext"));
    assert!(cfg.join("generator.json").exists());

    let again = stdout_of(riagen(&cfg).arg("generate").arg("--catalog").arg(&catalog));
    assert_eq!(again, vb);
}

#[test]
fn unsupported_language_is_rejected() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "shop.json", SHOP);
    riagen(&dir.path().join("cfg"))
        .arg("generate")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--language", "F#"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported language"));
}

#[test]
fn generators_lists_the_builtin_for_both_languages() {
    let dir = TempDir::new().unwrap();
    riagen(dir.path())
        .arg("generators")
        .assert()
        .success()
        .stdout(predicate::str::contains("CodeDomClientCodeGenerator\tC#"))
        .stdout(predicate::str::contains("CodeDomClientCodeGenerator\tVB"));

    let json = stdout_of(riagen(dir.path()).args(["generators", "--json"]));
    let entries: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(entries.as_array().map(Vec::len), Some(2));
}

#[test]
fn worker_rejects_sessions_that_skip_initialize() {
    let dir = TempDir::new().unwrap();
    riagen(dir.path())
        .arg("shared-code-worker")
        .write_stdin("{\"type\":\"shutdown\"}\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("expected initialize"));
}

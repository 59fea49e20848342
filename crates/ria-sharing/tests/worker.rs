// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Share-kind answers in-process and through the worker protocol.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use ria_sharing::{
    serve, serve_worker, CodeMemberKey, CodeMemberShareKind, RemoteSharedCodeService,
    SharedCodeLookup, SharedCodeResponse, SharedCodeService, SharedCodeServiceParameters,
};
use std::io::{BufRead, BufReader, Cursor};

const CATALOG: &str = r#"{
  "assembly": "Acme.Web",
  "types": [
    { "name": "Order", "namespace": "Acme", "kind": "entity",
      "properties": [ { "name": "Id", "type": "int", "attributes": [ { "type": "Key" } ] } ] },
    { "name": "Money", "namespace": "Acme", "kind": "complex",
      "properties": [ { "name": "Amount", "type": "decimal" } ] },
    { "name": "Audit", "namespace": "Acme", "kind": "class" }
  ],
  "services": []
}"#;

const SYMBOLS: &str = r#"{
  "types": {
    "Acme.Order": { "members": { "Id": "/src/Order.cs" } },
    "Acme.Money": { "members": { "Amount": "/src/Money.shared.cs" } }
  }
}"#;

fn parameters(dir: &std::path::Path) -> SharedCodeServiceParameters {
    let catalog = dir.join("acme.json");
    std::fs::write(&catalog, CATALOG).unwrap();
    std::fs::write(dir.join("Acme.Web.symbols.json"), SYMBOLS).unwrap();
    SharedCodeServiceParameters {
        shared_source_files: vec!["/src/Money.shared.cs".into()],
        symbol_search_paths: vec![dir.display().to_string()],
        server_assembly_paths: vec![catalog.display().to_string()],
        client_assembly_paths: Vec::new(),
    }
}

#[test]
fn server_only_types_are_never_reported_shared() {
    let dir = tempfile::tempdir().unwrap();
    let service = SharedCodeService::from_parameters(&parameters(dir.path())).unwrap();

    let order = service.type_share_kind("Acme.Order");
    assert!(!order.is_shared());
    assert_eq!(order, CodeMemberShareKind::NOT_SHARED);

    // No symbols and no declared files: no evidence either way.
    assert_eq!(service.type_share_kind("Acme.Audit"), CodeMemberShareKind::UNKNOWN);

    let money = service.type_share_kind("Acme.Money");
    assert!(money.contains(CodeMemberShareKind::SHARED_BY_SOURCE));
    assert!(service
        .property_share_kind("Acme.Money", "Amount")
        .contains(CodeMemberShareKind::SHARED_BY_SOURCE));
}

#[test]
fn serve_answers_each_request_line() {
    let dir = tempfile::tempdir().unwrap();
    let service = SharedCodeService::from_parameters(&parameters(dir.path())).unwrap();
    let input = concat!(
        r#"{"type":"share_kind","key":{"member":"type","type_name":"Acme.Money"}}"#,
        "\n",
        "garbage\n",
        r#"{"type":"shutdown"}"#,
        "\n",
        r#"{"type":"share_kind","key":{"member":"type","type_name":"Acme.Order"}}"#,
        "\n",
    );
    let mut output = Vec::new();
    let served = serve(Cursor::new(input), &mut output, &service).unwrap();
    assert_eq!(served, 1);

    let responses: Vec<SharedCodeResponse> = BufReader::new(output.as_slice())
        .lines()
        .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
        .collect();
    assert_eq!(responses.len(), 3);
    assert_eq!(
        responses[0],
        SharedCodeResponse::ShareKind {
            kind: CodeMemberShareKind::SHARED_BY_SOURCE
        }
    );
    assert!(matches!(responses[1], SharedCodeResponse::Error { .. }));
    assert_eq!(responses[2], SharedCodeResponse::Goodbye);
}

#[test]
fn remote_service_matches_in_process_answers() {
    let dir = tempfile::tempdir().unwrap();
    let params = parameters(dir.path());
    let local = SharedCodeService::from_parameters(&params).unwrap();

    let (request_rx, request_tx) = std::io::pipe().unwrap();
    let (response_rx, response_tx) = std::io::pipe().unwrap();
    let worker = std::thread::spawn(move || serve_worker(BufReader::new(request_rx), response_tx));

    let remote =
        RemoteSharedCodeService::connect(BufReader::new(response_rx), request_tx, &params).unwrap();
    for key in [
        CodeMemberKey::type_key("Acme.Order"),
        CodeMemberKey::type_key("Acme.Money"),
        CodeMemberKey::type_key("Acme.Audit"),
        CodeMemberKey::property_key("Acme.Money", "Amount"),
        CodeMemberKey::method_key("Acme.Order", "Missing", Vec::new()),
    ] {
        assert_eq!(remote.share_kind(&key), local.share_kind(&key), "{key}");
    }
    remote.shutdown().unwrap();
    drop(remote);
    assert_eq!(worker.join().unwrap().unwrap(), 5);
}

#[test]
fn broken_workers_degrade_to_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let params = parameters(dir.path());
    // A canned transcript: ready, then the worker vanishes.
    let transcript = "{\"type\":\"ready\"}\n";
    let remote = RemoteSharedCodeService::connect(
        Cursor::new(transcript.as_bytes().to_vec()),
        Vec::new(),
        &params,
    )
    .unwrap();
    assert!(remote.type_share_kind("Acme.Money").is_unknown());
    assert!(remote.type_share_kind("Acme.Order").is_unknown());
}

#[test]
fn worker_reports_bad_parameters() {
    let params = SharedCodeServiceParameters {
        server_assembly_paths: vec!["/definitely/not/here.json".into()],
        ..SharedCodeServiceParameters::default()
    };
    let request = format!(
        "{}\n",
        serde_json::to_string(&ria_sharing::SharedCodeRequest::Initialize { parameters: params })
            .unwrap()
    );
    let mut output = Vec::new();
    assert!(serve_worker(Cursor::new(request), &mut output).is_err());
    let reply: SharedCodeResponse =
        serde_json::from_str(String::from_utf8(output).unwrap().trim()).unwrap();
    assert!(matches!(reply, SharedCodeResponse::Error { .. }));
}

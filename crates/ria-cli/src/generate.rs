// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `riagen generate`.

use crate::{prefs, GenerateArgs};
use anyhow::{bail, Context, Result};
use ria_codegen::{
    canonical_language, ClientCodeGenerationOptions, CodeGenerationHost, GeneratorRegistry, LoggingService,
    TracingLoggingService,
};
use ria_config::PrefsPort;
use ria_schema::Catalog;
use ria_sharing::{RemoteSharedCodeService, SharedCodeLookup, SharedCodeService, SharedCodeServiceParameters};
use std::fs;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitCode, Stdio};
use std::sync::Arc;
use tracing::{error, info, warn};

type WorkerLookup = RemoteSharedCodeService<BufReader<ChildStdout>, ChildStdin>;

/// A `riagen shared-code-worker` child and the lookup talking to it.
struct Worker {
    child: Child,
    lookup: Arc<WorkerLookup>,
}

impl Worker {
    fn spawn(parameters: &SharedCodeServiceParameters) -> Result<Self> {
        let exe = std::env::current_exe().context("cannot locate the riagen executable")?;
        let mut child = Command::new(exe)
            .arg("shared-code-worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn shared code worker")?;
        let stdin = child.stdin.take().context("worker stdin unavailable")?;
        let stdout = child.stdout.take().context("worker stdout unavailable")?;
        let lookup = match RemoteSharedCodeService::connect(BufReader::new(stdout), stdin, parameters) {
            Ok(lookup) => lookup,
            Err(err) => {
                // The child may still be waiting on input; reap it before bailing.
                let _ = child.kill();
                let _ = child.wait();
                return Err(err).context("shared code worker failed to initialize");
            }
        };
        info!(pid = child.id(), "shared code worker started");
        Ok(Self {
            child,
            lookup: Arc::new(lookup),
        })
    }

    fn finish(mut self) {
        if let Err(err) = self.lookup.shutdown() {
            warn!(error = %err, "shared code worker did not shut down cleanly");
        }
        drop(self.lookup);
        match self.child.wait() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%status, "shared code worker exited with failure"),
            Err(err) => warn!(error = %err, "failed to wait for shared code worker"),
        }
    }
}

fn sharing_parameters(args: &GenerateArgs, symbol_search_paths: &[String]) -> SharedCodeServiceParameters {
    SharedCodeServiceParameters {
        shared_source_files: args.shared_files.clone(),
        symbol_search_paths: symbol_search_paths.to_vec(),
        server_assembly_paths: vec![args.catalog.to_string_lossy().into_owned()],
        client_assembly_paths: args.client_assemblies.clone(),
    }
}

/// Writes `text` to `path` unless the file already holds the same bytes.
/// Returns whether the file was written.
fn write_output(path: &Path, text: &str) -> Result<bool> {
    let digest = blake3::hash(text.as_bytes());
    let digest_hex = hex::encode(digest.as_bytes());
    if let Ok(existing) = fs::read(path) {
        if blake3::hash(&existing) == digest {
            info!(path = %path.display(), digest = %digest_hex, "output unchanged");
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), digest = %digest_hex, bytes = text.len(), "output written");
    Ok(true)
}

pub(crate) fn run(args: &GenerateArgs, config_dir: Option<&Path>) -> Result<ExitCode> {
    let store = prefs::open(config_dir);
    let settings = prefs::effective(prefs::load(store.as_ref()), args);
    if args.save_prefs {
        if let Some(store) = &store {
            store.save_prefs(&settings);
        }
    }

    let Some(language) = canonical_language(&settings.language) else {
        bail!("unsupported language '{}'; expected C# or VB", settings.language);
    };
    let catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    let descriptions = catalog.descriptions();
    if descriptions.is_empty() {
        warn!(catalog = %args.catalog.display(), "catalog declares no DomainServices");
    }

    let parameters = sharing_parameters(args, &settings.symbol_search_paths);
    let worker = if settings.isolated {
        Some(Worker::spawn(&parameters)?)
    } else {
        None
    };
    let lookup: Arc<dyn SharedCodeLookup> = match &worker {
        Some(worker) => worker.lookup.clone(),
        None => Arc::new(SharedCodeService::from_registries(
            vec![Arc::clone(catalog.registry())],
            &parameters,
        )),
    };

    let host = CodeGenerationHost::new(Arc::new(TracingLoggingService::new()), lookup);
    let registry = GeneratorRegistry::with_builtin();
    let options = ClientCodeGenerationOptions {
        language: language.to_string(),
        client_root_namespace: args.client_root_namespace.clone(),
        server_root_namespace: args.server_root_namespace.clone(),
        client_project_path: None,
        use_full_type_names: args.full_type_names,
    };
    let generated = registry
        .find(language, settings.generator.as_deref())
        .and_then(|generator| generator.generate_code(&host, &descriptions, &options));
    let failed = host.has_logged_errors();
    drop(host);
    if let Some(worker) = worker {
        worker.finish();
    }
    let text = generated.context("code generation failed")?;

    if failed {
        error!(services = descriptions.len(), "generation logged errors; no output written");
        return Ok(ExitCode::FAILURE);
    }
    match &args.out {
        Some(path) => {
            write_output(path, &text)?;
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(text.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

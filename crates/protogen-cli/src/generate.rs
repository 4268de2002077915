//! Pipeline driver: load IR, transform packages in parallel, write artifacts.

use crate::config::Config;
use anyhow::{Context, Result};
use protogen_codegen::{ServiceNames, generate_service, render_proto, render_service};
use protogen_core::{
    CoreResult, Diagnostic, Level, Package, ScannedPackage, Transformer,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// Which artifacts to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub proto: bool,
    pub rpc: bool,
}

impl Targets {
    pub const PROTO: Targets = Targets {
        proto: true,
        rpc: false,
    };
    pub const RPC: Targets = Targets {
        proto: false,
        rpc: true,
    };
    pub const ALL: Targets = Targets {
        proto: true,
        rpc: true,
    };
}

/// Options of one generate invocation.
#[derive(Debug, Clone)]
pub struct Options {
    pub inputs: Vec<PathBuf>,
    pub out: PathBuf,
    pub config: Option<PathBuf>,
    pub targets: Targets,
    pub verbose: bool,
}

/// Outcome of transforming one package.
pub struct Outcome {
    pub result: CoreResult<Package>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn run(options: &Options) -> Result<()> {
    let config = match &options.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let transformer = config.transformer()?;

    let scanned = options
        .inputs
        .iter()
        .map(|path| load_package(path))
        .collect::<Result<Vec<_>>>()?;

    let outcomes = transform_all(&transformer, &scanned);

    for (source, outcome) in scanned.iter().zip(&outcomes) {
        print_diagnostics(&source.path, &outcome.diagnostics, options.verbose);
    }

    // A hard failure in any package means nothing gets written.
    let mut packages = Vec::with_capacity(outcomes.len());
    for (source, outcome) in scanned.iter().zip(outcomes) {
        let package = outcome
            .result
            .with_context(|| format!("Failed to transform package {:?}", source.path))?;
        packages.push(package);
    }
    check_distinct_outputs(&packages)?;

    for package in &packages {
        write_artifacts(package, &options.out, options.targets)?;
    }

    Ok(())
}

/// Read one scanned package from a JSON file.
pub fn load_package(path: &Path) -> Result<ScannedPackage> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read IR file: {path:?}"))?;

    ScannedPackage::from_json(&content).with_context(|| format!("Failed to parse IR file: {path:?}"))
}

/// Transform every package on its own thread.
///
/// Each run gets its own diagnostics collector; outcomes come back in input
/// order.
pub fn transform_all(transformer: &Transformer, packages: &[ScannedPackage]) -> Vec<Outcome> {
    thread::scope(|scope| {
        let handles: Vec<_> = packages
            .iter()
            .map(|scanned| {
                scope.spawn(move || {
                    let mut diagnostics = Vec::new();
                    let result = transformer.transform(scanned, &mut diagnostics);
                    Outcome {
                        result,
                        diagnostics,
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

fn print_diagnostics(path: &str, diagnostics: &[Diagnostic], verbose: bool) {
    for diagnostic in diagnostics {
        if diagnostic.level == Level::Warn || verbose {
            eprintln!("{path}: {diagnostic}");
        }
    }
}

/// Two inputs that map to the same schema package would overwrite each other.
fn check_distinct_outputs(packages: &[Package]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for package in packages {
        if let Some(previous) = seen.insert(package.name(), package.path()) {
            anyhow::bail!(
                "Import paths {:?} and {:?} both map to schema package {}",
                previous,
                package.path(),
                package.name()
            );
        }
    }
    Ok(())
}

/// Directory holding a package's artifacts.
pub fn package_dir(out: &Path, package: &Package) -> PathBuf {
    package
        .name()
        .split('.')
        .fold(out.to_path_buf(), |dir, segment| dir.join(segment))
}

/// Write the requested artifacts for one package.
pub fn write_artifacts(package: &Package, out: &Path, targets: Targets) -> Result<()> {
    let dir = package_dir(out, package);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create directory: {dir:?}"))?;

    if targets.proto {
        let path = dir.join("generated.proto");
        fs::write(&path, render_proto(package))
            .with_context(|| format!("Failed to write {path:?}"))?;
        tracing::info!(package = %package.name(), file = ?path, "wrote schema");
    }

    if targets.rpc {
        if package.rpcs().is_empty() {
            tracing::info!(package = %package.name(), "no exposed functions, skipping service glue");
        } else {
            let names = ServiceNames::for_package(package);
            let decls = generate_service(&names, package.rpcs(), package);
            let path = dir.join("service.rs");
            fs::write(&path, render_service(package, &decls))
                .with_context(|| format!("Failed to write {path:?}"))?;
            tracing::info!(package = %package.name(), file = ?path, "wrote service glue");
        }
    }

    Ok(())
}

//! Fast rebuild package resolution
//!
//! The video receiver package has shipped under more than one name. The
//! resolver walks an ordered candidate list and asks each [`MatchStrategy`]
//! in turn whether the candidate is present in the workspace or the external
//! project tree. The first candidate any strategy accepts wins.
//!
//! Finding nothing is an ordinary outcome (`Ok(None)`); failing to read the
//! inputs is an error.

use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::defaults;
use crate::error::ResolveError;

/// Inputs a strategy may inspect
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Applied configuration file in the workspace
    pub config_file: &'a Path,
    /// External project tree
    pub external_root: &'a Path,
}

/// A way of deciding whether a candidate names a real package
pub trait MatchStrategy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether `candidate` is present
    fn matches(&self, candidate: &str, ctx: &ResolveContext<'_>) -> Result<bool, ResolveError>;
}

/// Matches a line of the applied configuration whose first token is the candidate
///
/// The candidate must start the line and be followed by a space or tab, so
/// `foo` does not match `foobar=y`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigSymbolMatch;

impl MatchStrategy for ConfigSymbolMatch {
    fn name(&self) -> &'static str {
        "config"
    }

    fn matches(&self, candidate: &str, ctx: &ResolveContext<'_>) -> Result<bool, ResolveError> {
        let content = match std::fs::read_to_string(ctx.config_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(ResolveError::Io {
                    path: ctx.config_file.to_path_buf(),
                    error: e.to_string(),
                })
            }
        };

        let pattern = Regex::new(&format!(r"(?m)^{}[ \t]", regex::escape(candidate))).map_err(
            |e| ResolveError::InvalidCandidate {
                candidate: candidate.to_string(),
                error: e.to_string(),
            },
        )?;

        Ok(pattern.is_match(&content))
    }
}

/// Matches a `<candidate>.mk` file under the external project tree
#[derive(Debug, Clone, Copy)]
pub struct PackageFileMatch {
    max_depth: usize,
}

impl PackageFileMatch {
    /// Search at most `max_depth` directory levels below the root
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for PackageFileMatch {
    fn default() -> Self {
        Self::new(defaults::PACKAGE_SEARCH_DEPTH)
    }
}

impl MatchStrategy for PackageFileMatch {
    fn name(&self) -> &'static str {
        "package-file"
    }

    fn matches(&self, candidate: &str, ctx: &ResolveContext<'_>) -> Result<bool, ResolveError> {
        let root = ctx.external_root;
        if !root.is_dir() {
            return Ok(false);
        }

        let wanted = format!("{candidate}.mk");
        for entry in WalkDir::new(root).max_depth(self.max_depth) {
            let entry = entry.map_err(|e| ResolveError::Walk {
                root: root.to_path_buf(),
                error: e.to_string(),
            })?;
            if entry.file_type().is_file() && entry.file_name() == wanted.as_str() {
                tracing::debug!("Found package file {}", entry.path().display());
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Ordered candidates checked against ordered strategies
pub struct PackageResolver {
    candidates: Vec<String>,
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl PackageResolver {
    /// Resolver using the configuration and package-file strategies
    pub fn new(candidates: Vec<String>, search_depth: usize) -> Self {
        Self::with_strategies(
            candidates,
            vec![
                Box::new(ConfigSymbolMatch),
                Box::new(PackageFileMatch::new(search_depth)),
            ],
        )
    }

    /// Resolver with custom strategies
    pub fn with_strategies(
        candidates: Vec<String>,
        strategies: Vec<Box<dyn MatchStrategy>>,
    ) -> Self {
        Self {
            candidates,
            strategies,
        }
    }

    /// Candidate names in priority order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// First candidate accepted by any strategy, or `None`
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<String>, ResolveError> {
        if let Some(blank) = self.candidates.iter().find(|c| c.trim().is_empty()) {
            return Err(ResolveError::InvalidCandidate {
                candidate: blank.clone(),
                error: "empty package name".to_string(),
            });
        }
        for candidate in &self.candidates {
            for strategy in &self.strategies {
                if strategy.matches(candidate, ctx)? {
                    tracing::info!(
                        "Resolved fast rebuild package '{candidate}' via {}",
                        strategy.name()
                    );
                    return Ok(Some(candidate.clone()));
                }
            }
            tracing::debug!("Candidate '{candidate}' not found");
        }
        Ok(None)
    }

    /// Like [`resolve`](Self::resolve), but no match is an error naming every candidate
    pub fn resolve_required(&self, ctx: &ResolveContext<'_>) -> Result<String, ResolveError> {
        self.resolve(ctx)?.ok_or_else(|| ResolveError::NoMatch {
            candidates: self.candidates.clone(),
            config: ctx.config_file.to_path_buf(),
            external_root: ctx.external_root.to_path_buf(),
        })
    }
}

impl std::fmt::Debug for PackageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageResolver")
            .field("candidates", &self.candidates)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

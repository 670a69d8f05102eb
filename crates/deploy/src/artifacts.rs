//! Access to hardhat-style compiler artifacts.
//!
//! Layout:
//! - `<root>/contracts/<Source>.sol/<Name>.json`: bytecode and ABI
//! - `<root>/contracts/<Source>.sol/<Name>.dbg.json`: pointer to the build info
//! - `<root>/build-info/<id>.json`: compiler version and standard JSON input

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// A compiled contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    /// Path of the source file, relative to the project root (e.g. `contracts/FundMe.sol`).
    pub source_name: String,
    /// `0x`-prefixed creation bytecode.
    pub bytecode: String,
}

impl Artifact {
    /// Decode the creation bytecode.
    pub fn bytecode_bytes(&self) -> Result<Vec<u8>> {
        if self.bytecode.trim_start_matches("0x").is_empty() {
            anyhow::bail!(
                "Artifact for {} has no bytecode (abstract contract or interface?)",
                self.contract_name
            );
        }

        hex::decode(self.bytecode.trim_start_matches("0x"))
            .with_context(|| format!("Invalid bytecode in artifact for {}", self.contract_name))
    }

    /// Fully qualified name, as expected by block explorers (`contracts/FundMe.sol:FundMe`).
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// Compiler input and version used to build a contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Full compiler version, e.g. `0.8.24+commit.e11b9ed9`.
    pub solc_long_version: String,
    /// Standard JSON input given to the compiler.
    pub input: Value,
}

/// Reader over an artifacts directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the artifact of contract `name`.
    pub fn artifact(&self, name: &str) -> Result<Artifact> {
        let path = self.artifact_path(name)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))
    }

    /// Load the build info that produced contract `name`.
    pub fn build_info(&self, name: &str) -> Result<BuildInfo> {
        let artifact_path = self.artifact_path(name)?;
        let debug_path = artifact_path.with_extension("dbg.json");

        let content = std::fs::read_to_string(&debug_path)
            .with_context(|| format!("Failed to read {}", debug_path.display()))?;
        let debug: DebugFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", debug_path.display()))?;

        // The build info path is relative to the directory of the debug file.
        let parent = debug_path
            .parent()
            .context("Debug file path must have a parent directory")?;
        let build_info_path = parent.join(&debug.build_info);

        let content = std::fs::read_to_string(&build_info_path)
            .with_context(|| format!("Failed to read {}", build_info_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse build info {}", build_info_path.display()))
    }

    /// Find `<name>.json` below `<root>/contracts`.
    fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        let contracts = self.root.join("contracts");
        let file_name = format!("{}.json", name);

        find_file(&contracts, &file_name)?.with_context(|| {
            format!(
                "No artifact found for {} in {} (did you compile the contracts?)",
                name,
                contracts.display()
            )
        })
    }
}

fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list directory {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().is_some_and(|f| f == file_name) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempdir::TempDir;

    /// Write a minimal artifact tree for `name` under `root`.
    pub(crate) fn write_artifact(root: &Path, name: &str, bytecode: &str) {
        let dir = root.join("contracts").join(format!("{}.sol", name));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(format!("{}.json", name)),
            serde_json::json!({
                "_format": "hh-sol-artifact-1",
                "contractName": name,
                "sourceName": format!("contracts/{}.sol", name),
                "abi": [],
                "bytecode": bytecode,
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join(format!("{}.dbg.json", name)),
            serde_json::json!({
                "_format": "hh-sol-dbg-1",
                "buildInfo": "../../build-info/abc123.json",
            })
            .to_string(),
        )
        .unwrap();

        let build_info = root.join("build-info");
        std::fs::create_dir_all(&build_info).unwrap();
        std::fs::write(
            build_info.join("abc123.json"),
            serde_json::json!({
                "solcVersion": "0.8.24",
                "solcLongVersion": "0.8.24+commit.e11b9ed9",
                "input": {"language": "Solidity", "sources": {}},
            })
            .to_string(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_artifact() {
        let dir = TempDir::new("fundme-artifacts").unwrap();
        write_artifact(dir.path(), "FundMe", "0x6080");

        let store = ArtifactStore::new(dir.path());
        let artifact = store.artifact("FundMe").unwrap();

        assert_eq!(artifact.contract_name, "FundMe");
        assert_eq!(artifact.fully_qualified_name(), "contracts/FundMe.sol:FundMe");
        assert_eq!(artifact.bytecode_bytes().unwrap(), vec![0x60, 0x80]);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new("fundme-artifacts").unwrap();
        write_artifact(dir.path(), "FundMe", "0x6080");

        assert!(ArtifactStore::new(dir.path()).artifact("Missing").is_err());
    }

    #[test]
    fn test_load_build_info() {
        let dir = TempDir::new("fundme-artifacts").unwrap();
        write_artifact(dir.path(), "FundMe", "0x6080");

        let info = ArtifactStore::new(dir.path()).build_info("FundMe").unwrap();
        assert_eq!(info.solc_long_version, "0.8.24+commit.e11b9ed9");
        assert_eq!(info.input["language"], "Solidity");
    }

    #[test]
    fn test_empty_bytecode() {
        let dir = TempDir::new("fundme-artifacts").unwrap();
        write_artifact(dir.path(), "AggregatorV3Interface", "0x");

        let artifact = ArtifactStore::new(dir.path())
            .artifact("AggregatorV3Interface")
            .unwrap();
        assert!(artifact.bytecode_bytes().is_err());
    }

    #[test]
    fn test_missing_artifacts_dir() {
        let dir = TempDir::new("fundme-artifacts").unwrap();
        let err = ArtifactStore::new(dir.path().join("nope"))
            .artifact("FundMe")
            .unwrap_err();
        assert!(err.to_string().contains("did you compile"));
    }
}

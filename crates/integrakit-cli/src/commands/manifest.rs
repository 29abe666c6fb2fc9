// Manifest commands
// validate / build / schema for integration manifests

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::{Context, JsonResponse};
use crate::cli::ManifestCommands;
use integrakit_lib::services::manifest_schema;
use integrakit_lib::IntegrationDefinition;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateSummary {
    name: String,
    version: String,
}

pub fn execute(ctx: &Context, command: ManifestCommands) -> Result<()> {
    match command {
        ManifestCommands::Validate { file } => validate(ctx, &file),
        ManifestCommands::Build { file, out } => build(ctx, &file, out.as_deref()),
        ManifestCommands::Schema => {
            if ctx.json {
                JsonResponse::ok(manifest_schema()).print()
            } else {
                println!("{}", serde_json::to_string_pretty(manifest_schema())?);
                Ok(())
            }
        }
    }
}

/// Read a manifest file, YAML when the extension says so
pub fn read_manifest(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(value)
}

fn load(path: &Path) -> Result<IntegrationDefinition> {
    let manifest = read_manifest(path)?;
    Ok(IntegrationDefinition::from_manifest(manifest)?)
}

fn validate(ctx: &Context, file: &Path) -> Result<()> {
    let definition = load(file)?;
    if ctx.json {
        JsonResponse::ok(ValidateSummary {
            name: definition.name.clone(),
            version: definition.version.clone(),
        })
        .print()
    } else {
        println!("{}", "ok".green());
        Ok(())
    }
}

fn build(ctx: &Context, file: &Path, out: Option<&Path>) -> Result<()> {
    let definition = load(file)?;
    let manifest = definition.to_manifest()?;
    let rendered = serde_json::to_string_pretty(&manifest)?;

    match out {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote manifest to {}", path.display());
            if ctx.json {
                JsonResponse::ok(path.display().to_string()).print()?;
            } else {
                println!("Wrote {}", path.display());
            }
        }
        None if ctx.json => JsonResponse::ok(manifest).print()?,
        None => println!("{}", rendered),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_manifest_by_extension() {
        let tmp = TempDir::new().unwrap();
        let yaml = tmp.path().join("integration.yaml");
        fs::write(&yaml, "name: helpdesk\nversion: 0.2.0\n").unwrap();
        let json = tmp.path().join("integration.json");
        fs::write(&json, r#"{"name": "helpdesk", "version": "0.2.0"}"#).unwrap();

        assert_eq!(read_manifest(&yaml).unwrap(), read_manifest(&json).unwrap());
    }

    #[test]
    fn test_read_manifest_reports_path() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("broken.json");
        fs::write(&bad, "{").unwrap();
        let err = read_manifest(&bad).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}

// Folder walk (§4.3 "Algorithm", C3).

use super::interpolate::{combined_variables, interpolate};
use super::model::{
    Resource, ServiceHeader, ServiceParseResult, StackHeader, StackParseResult, TenantNetworking,
    UnresolvedReference,
};
use crate::error::PankaError;
use crate::Result;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// Only the `kind` field — used to pick which concrete variant to decode
/// into before committing to the full type (§4.3 step 3).
#[derive(Debug, Deserialize)]
struct KindPeek {
    kind: String,
}

/// Splits on lines consisting solely of `---`, discarding comment-only and
/// blank documents (§4.3 step 3).
fn split_documents(raw: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current = String::new();
    for line in raw.lines() {
        if line.trim_end() == "---" {
            docs.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    docs.push(current);

    docs.into_iter()
        .map(|doc| doc.trim().to_string())
        .filter(|doc| {
            !doc.is_empty()
                && doc
                    .lines()
                    .any(|line| !line.trim_start().starts_with('#') && !line.trim().is_empty())
        })
        .collect()
}

fn decode_component(
    doc: &str,
    path: &Path,
    variables: &HashMap<String, String>,
    warnings: &mut Vec<String>,
    service_doc_seen: &mut bool,
) -> Result<Option<Resource>> {
    let interpolated = interpolate(doc, variables, &HashMap::new());

    let peek: KindPeek = match serde_yaml::from_str(&interpolated) {
        Ok(p) => p,
        Err(source) => {
            return Err(PankaError::YamlSyntax {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let tagged = match peek.kind.as_str() {
        "Stack" => return Ok(None),
        "Service" => {
            if *service_doc_seen {
                return Err(PankaError::InvalidKind(format!(
                    "{}: a second Service document was found in this service folder",
                    path.display()
                )));
            }
            *service_doc_seen = true;
            return Ok(None);
        }
        "MicroService" | "Lambda" | "RDS" | "DynamoDB" | "S3" | "SQS" | "SNS"
        | "ComponentInfra" => &interpolated,
        other => {
            warnings.push(format!(
                "{}: unknown kind {other:?}, skipped",
                path.display()
            ));
            return Ok(None);
        }
    };

    let resource: Resource =
        serde_yaml::from_str(tagged).map_err(|source| PankaError::YamlSyntax {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(resource))
}

fn parse_service_dir(
    service_dir: &Path,
    service_name: &str,
    stack_name: &str,
    stack_vars: &HashMap<String, String>,
    warnings: &mut Vec<String>,
) -> Result<ServiceParseResult> {
    let service_yaml = service_dir.join("service.yaml");
    let mut header = if service_yaml.is_file() {
        let raw = fs::read_to_string(&service_yaml)?;
        let interpolated = interpolate(&raw, stack_vars, &HashMap::new());
        serde_yaml::from_str::<ServiceHeader>(&interpolated).map_err(|source| {
            PankaError::YamlSyntax {
                path: service_yaml.display().to_string(),
                source,
            }
        })?
    } else {
        ServiceHeader::synthesized(service_name, stack_name)
    };
    if header.metadata.stack.is_none() {
        header.metadata.stack = Some(stack_name.to_string());
    }

    let combined = combined_variables(stack_vars, service_name, &header.variables);

    let mut components = Vec::new();
    let mut config_files = HashMap::new();
    // `service.yaml` itself already counts as the folder's one Service
    // document; a second one turning up anywhere else in the folder is the
    // §4.3 step 3 "two Service docs in one folder" failure.
    let mut service_doc_seen = service_yaml.is_file();

    for entry in WalkDir::new(service_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PankaError::Io(e.into()))?;
        let path = entry.path();
        if path == service_yaml {
            continue;
        }
        if entry.file_type().is_dir() {
            if entry.file_name() == "config" {
                for file in WalkDir::new(path).min_depth(1).sort_by_file_name() {
                    let file = file.map_err(|e| PankaError::Io(e.into()))?;
                    if file.file_type().is_file() {
                        let name = file.file_name().to_string_lossy().to_string();
                        config_files.insert(name, fs::read(file.path())?);
                    }
                }
            }
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "yaml" && ext != "yml" {
            continue;
        }

        let raw = fs::read_to_string(path)?;
        for doc in split_documents(&raw) {
            if let Some(mut resource) =
                decode_component(&doc, path, &combined, warnings, &mut service_doc_seen)?
            {
                resource.fill_scope(stack_name, Some(service_name));
                components.push(resource);
            }
        }
    }

    Ok(ServiceParseResult {
        header,
        components,
        config_files,
    })
}

/// Walks `stack_path` and produces the full parse result (§4.3 steps 1-8).
pub fn parse_stack(
    stack_path: &Path,
    tenant_networking: Option<TenantNetworking>,
) -> Result<StackParseResult> {
    if !stack_path.exists() {
        return Err(PankaError::PathNotFound(stack_path.display().to_string()));
    }
    if !stack_path.is_dir() {
        return Err(PankaError::NotADirectory(stack_path.display().to_string()));
    }

    let stack_yaml = stack_path.join("stack.yaml");
    if !stack_yaml.is_file() {
        return Err(PankaError::MissingStackYaml(
            stack_path.display().to_string(),
        ));
    }

    let raw = fs::read_to_string(&stack_yaml)?;
    let peek: KindPeek = serde_yaml::from_str(&raw).map_err(|source| PankaError::YamlSyntax {
        path: stack_yaml.display().to_string(),
        source,
    })?;
    if peek.kind != "Stack" {
        return Err(PankaError::InvalidKind(format!(
            "stack.yaml kind is {:?}, expected \"Stack\"",
            peek.kind
        )));
    }
    let stack: StackHeader =
        serde_yaml::from_str(&raw).map_err(|source| PankaError::YamlSyntax {
            path: stack_yaml.display().to_string(),
            source,
        })?;
    let stack_name = stack
        .metadata
        .stack
        .clone()
        .unwrap_or_else(|| stack.metadata.name.clone());

    let mut warnings = Vec::new();
    let mut services = HashMap::new();
    let mut components = Vec::new();

    let services_dir = stack_path.join("services");
    if services_dir.is_dir() {
        let mut service_names: Vec<String> = WalkDir::new(&services_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        service_names.sort();

        for service_name in service_names {
            let service_dir = services_dir.join(&service_name);
            let result = parse_service_dir(
                &service_dir,
                &service_name,
                &stack_name,
                &stack.variables,
                &mut warnings,
            )?;
            components.extend(result.components.clone());
            services.insert(service_name, result);
        }
    }

    let mut seen_names: HashSet<String> = HashSet::new();
    for resource in &components {
        let name = resource.name().to_string();
        if !seen_names.insert(name.clone()) {
            return Err(PankaError::DuplicateComponentName {
                stack: stack_name.clone(),
                name,
            });
        }
    }

    let known_names: HashSet<&str> = components.iter().map(Resource::name).collect();
    let mut unresolved_references = Vec::new();
    for resource in &components {
        for dep in resource
            .depends_on()
            .iter()
            .map(String::as_str)
            .chain(resource.implicit_dependencies().iter().map(String::as_str))
        {
            if !known_names.contains(dep) {
                warnings.push(format!(
                    "{}: dependency {dep:?} does not resolve to a known component",
                    resource.name()
                ));
                unresolved_references.push(UnresolvedReference {
                    component: resource.name().to_string(),
                    target: dep.to_string(),
                });
            }
        }
    }

    if !warnings.is_empty() {
        for w in &warnings {
            warn!(stack = %stack_name, "{w}");
        }
    }

    Ok(StackParseResult {
        stack,
        services,
        components,
        tenant_networking,
        stack_path: stack_path.display().to_string(),
        warnings,
        unresolved_references,
    })
}

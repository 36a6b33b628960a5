//! Minimal CLI: declarations → Avro schemas
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;
use tracing::info;

use crate::decl::{declare_all, Declarations};
use crate::registry::InMemoryRegistry;
use crate::schema::{parse_schema, render, to_json};
use crate::settings::SchemaSettings;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// synthesize Avro record schemas from event type declarations
#[derive(Parser, Debug)]
#[command(name = "avro-fieldgen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// declare types from JSON documents and print their Avro schemas
    Schema(SchemaOut),
    /// parse a raw Avro schema and print its canonical form
    Check(CheckIn),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// wrap nullable classes in `["null", T]` unions instead of emitting required fields
    #[arg(long, default_value_t = false)]
    nullable: bool,

    /// emit plain `string` without the native-string marker
    #[arg(long, default_value_t = false)]
    plain_strings: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    /// file holding one Avro schema
    schema: PathBuf,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaOut {
    fn settings(&self) -> SchemaSettings {
        SchemaSettings::new(!self.nullable, !self.plain_strings)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let paths = resolve_file_path_patterns(&target.input_settings.input)?;
                let settings = target.settings();

                // one registry per document; documents don't see each other
                let results: Vec<(PathBuf, Result<IndexMap<String, Value>>)> = paths
                    .into_par_iter()
                    .map(|path| {
                        let out = schemas_for_file(&path, settings);
                        (path, out)
                    })
                    .collect();

                let mut output = serde_json::Map::new();
                let mut failed = 0usize;
                for (path, result) in results {
                    let path_str = path.to_string_lossy().to_string();
                    match result {
                        Ok(schemas) => {
                            info!(file = %path_str, types = schemas.len(), "synthesized");
                            output.insert(path_str, Value::Object(schemas.into_iter().collect()));
                        }
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {path_str}: {error:#}", "✗".red().bold());
                        }
                    }
                }

                let schema_src = serde_json::to_string_pretty(&Value::Object(output))?;
                write_output(target.out.as_deref(), &schema_src)?;
                if failed > 0 {
                    bail!("{failed} declaration file(s) failed");
                }
                Ok(())
            }
            Command::Check(target) => {
                let source = std::fs::read_to_string(&target.schema)
                    .with_context(|| format!("failed to read {}", target.schema.display()))?;
                let schema = parse_schema(&source)
                    .with_context(|| format!("invalid Avro schema in {}", target.schema.display()))?;
                println!("{}", render::render(&schema)?);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn schemas_for_file(path: &Path, settings: SchemaSettings) -> Result<IndexMap<String, Value>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file {}", path.display()))?;
    let doc = Declarations::from_json(&source)?;

    let mut registry = InMemoryRegistry::new();
    let handles = declare_all(&doc, settings, &mut registry)
        .with_context(|| format!("declaring types of {}", path.display()))?;
    let mut out = IndexMap::new();
    for handle in handles {
        if let Some(schema) = handle.schema() {
            out.insert(handle.name.clone(), to_json(schema)?);
        }
    }
    Ok(out)
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{src}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_settings() {
        let cli = CommandLineInterface::parse_from(["avro-fieldgen", "schema", "-i", "a.json", "--nullable"]);
        let Command::Schema(target) = &cli.cmd else { panic!("expected schema command") };
        assert_eq!(target.settings(), SchemaSettings::new(false, true));
        assert_eq!(target.input_settings.input, vec!["a.json"]);
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["does/not/exist.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("does/not/exist.json")]);
        assert!(resolve_file_path_patterns(["/nonexistent-dir-for-test/*.json"]).is_err());
    }

    #[test]
    fn file_output_matches_declared_types() {
        let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/orders.json");
        let settings = SchemaSettings::new(false, true);
        let out = schemas_for_file(&demo, settings).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), ["LineItem", "Order"]);

        let doc = Declarations::from_json(&std::fs::read_to_string(&demo).unwrap()).unwrap();
        let mut registry = InMemoryRegistry::new();
        for handle in declare_all(&doc, settings, &mut registry).unwrap() {
            assert_eq!(out[&handle.name], to_json(handle.schema().unwrap()).unwrap());
        }
    }

    #[test]
    fn document_settings_override_flags() {
        let path = std::env::temp_dir().join(format!("avro-fieldgen-settings-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"settings": {"prefer_non_null": true, "native_string": false},
                "types": [{"name": "T", "properties": [{"name": "s", "type": "String"}]}]}"#,
        )
        .unwrap();
        let out = schemas_for_file(&path, SchemaSettings::new(false, true));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(out.unwrap()["T"]["fields"][0]["type"], "string");
    }
}

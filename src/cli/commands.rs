//! Command dispatch: turns parsed arguments into service calls.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::PackOptions;
use crate::cli::args::{Cli, Commands, ConfigCommands, PackArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{PackChild, PackNode, Value};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{encode, write_atomic, InfraError};
use crate::util::path::display_relative;

pub fn execute(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Build {
            dir,
            format,
            indent,
            output,
            pack,
        } => {
            let mut settings = resolve_settings(dir, pack)?;
            if let Some(format) = format {
                settings.format = *format;
            }
            if let Some(indent) = indent {
                if *indent < 1 {
                    return Err(CliError::InvalidArgs(format!(
                        "--indent must be at least 1, got {indent}"
                    )));
                }
                settings.indent = *indent;
            }
            cmd_build(dir, settings, output.as_deref())
        }
        Commands::Tree { dir, pack } => cmd_tree(dir, resolve_settings(dir, pack)?),
        Commands::Config { command } => cmd_config(command),
        Commands::Completion { shell } => cmd_completion(*shell),
    }
}

/// Layered settings for `dir` with the explicit flags applied last.
fn resolve_settings(dir: &Path, pack: &PackArgs) -> CliResult<Settings> {
    let mut settings = Settings::load(Some(dir))?;
    if let Some(mode) = pack.mode {
        settings.mode = mode;
    }
    if let Some(merge) = pack.merge {
        settings.merge = merge;
    }
    if pack.includes {
        settings.includes = true;
    }
    if pack.convert_booleans {
        settings.convert_booleans = true;
    }
    if let Some(root) = &pack.pack_root {
        settings.pack_root = Some(root.clone());
    }
    settings.validate()?;
    debug!("effective settings: {:?}", settings);
    Ok(settings)
}

fn pack_options(container: &ServiceContainer, dir: &Path) -> PackOptions {
    let settings = &container.settings;
    let pack_root = settings
        .pack_root
        .clone()
        .unwrap_or_else(|| dir.to_path_buf());
    PackOptions::new(pack_root)
        .with_includes(settings.includes)
        .with_convert_booleans(settings.convert_booleans)
        .with_mode(settings.mode)
        .with_merge(settings.merge)
        .with_logger(Arc::clone(&container.logger))
}

#[instrument(level = "debug", skip(settings))]
fn cmd_build(dir: &Path, settings: Settings, output: Option<&Path>) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    let options = pack_options(&container, dir);

    let document = container.pack_service.compile(dir, &options)?;
    let text = encode(document, container.settings.format, container.settings.indent)?;

    match output {
        Some(path) => {
            write_atomic(path, &text)?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| InfraError::io("write to stdout", e))?;
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn cmd_tree(dir: &Path, settings: Settings) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    let options = pack_options(&container, dir);

    match container.pack_service.structure(dir, &options)? {
        Some(level) => output::info(&level_tree(dir.display().to_string(), &level, dir)),
        None => output::warning(&format!("{} has no content", dir.display())),
    }
    Ok(())
}

/// Render one level: its contributing sources, then its keys.
fn level_tree(label: String, level: &PackNode<Value>, base: &Path) -> Tree<String> {
    let sources: Vec<String> = level
        .source_paths()
        .iter()
        .map(|path| display_relative(path, base))
        .collect();
    let label = if sources.is_empty() {
        label
    } else {
        format!("{label}  [{}]", sources.join(", "))
    };

    let mut tree = Tree::new(label);
    for (key, entry) in level.children() {
        match &entry.child {
            PackChild::Level(child) => tree.push(level_tree(format!("{key}/"), child, base)),
            PackChild::Value(value) => tree.push(Tree::new(format!("{key}: {}", value.kind_name()))),
        };
    }
    tree
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = Settings::load(dir.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no config directory on this platform)".to_string());
            output::header("Config paths");
            output::detail(&format!("global: {global}"));
            output::detail(&format!(
                "local:  {}",
                local_config_path(Path::new("<pack_dir>")).display()
            ));
        }
    }
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MergePolicy, Scalar};

    #[test]
    fn given_flags_when_resolving_settings_then_flags_win() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(".yamlpack.toml"), "merge = \"shallow\"\n").unwrap();
        let pack = PackArgs {
            merge: Some(MergePolicy::Deep),
            includes: true,
            ..PackArgs::default()
        };

        let settings = resolve_settings(temp.path(), &pack).unwrap();

        assert_eq!(settings.merge, MergePolicy::Deep);
        assert!(settings.includes);
    }

    #[test]
    fn given_level_when_rendering_tree_then_lists_keys_and_sources() {
        let base = Path::new("/pack");
        let mut level = PackNode::<Value>::new();
        level.add_source(Path::new("/pack/a.yml"));
        level.merge_child(
            Scalar::from("a"),
            Scalar::from("a"),
            PackChild::Value(Value::empty_mapping()),
            MergePolicy::Shallow,
        );

        let rendered = level_tree("pack".into(), &level, base).to_string();

        assert!(rendered.starts_with("pack  [a.yml]"));
        assert!(rendered.contains("a: mapping"));
    }
}

//! The `compile` and `dump` commands.

use crate::{Cli, CompileArgs, DumpArgs};
use std::path::{Path, PathBuf};
use veril_compiler::{shutdown_compiler, start_compiler, Session};
use veril_config::CompileConfig;

/// Runs compilation; with `dump` set, also writes the design database.
///
/// Returns the process exit code: 0 on success, 1 on compile errors, 2 on
/// setup failure.
pub fn run_compile(cli: &Cli, args: &CompileArgs, dump: Option<&DumpArgs>) -> i32 {
    let config = match build_config(cli, args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("error: {msg}");
            return 2;
        }
    };

    let session = Session::new(config);
    let compiler = match start_compiler(&session) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    if !cli.quiet {
        eprint!("{}", session.render_diagnostics());
    }

    let mut code = if session.sink.has_errors() { 1 } else { 0 };

    if let Some(dump_args) = dump {
        match serde_json::to_string_pretty(&compiler.design) {
            Ok(json) => match &dump_args.output {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, json) {
                        eprintln!("error: cannot write `{path}`: {e}");
                        code = 2;
                    }
                }
                None => println!("{json}"),
            },
            Err(e) => {
                eprintln!("error: cannot serialize design: {e}");
                code = 2;
            }
        }
    }

    shutdown_compiler(compiler);
    code
}

/// Builds the configuration from CLI arguments or `veril.toml`.
fn build_config(cli: &Cli, args: &CompileArgs) -> Result<CompileConfig, String> {
    if !args.sources.is_empty() {
        let mut config =
            CompileConfig::from_sources(args.sources.iter().map(PathBuf::from).collect());
        config.project.top = args.top.clone();
        config.options.complain_undefined_macro = args.complain_undefined_macro;
        return Ok(config);
    }

    let project_dir = cli
        .project
        .clone()
        .map(PathBuf::from)
        .map_or_else(|| find_project_root(Path::new(".")), Ok)?;
    let mut config = veril_config::load_config(&project_dir).map_err(|e| e.to_string())?;
    if !args.top.is_empty() {
        config.project.top = args.top.clone();
    }
    if args.complain_undefined_macro {
        config.options.complain_undefined_macro = true;
    }
    // Sources in the config are relative to the project root.
    config.project.sources = config
        .project
        .sources
        .iter()
        .map(|s| project_dir.join(s))
        .collect();
    Ok(config)
}

/// Walks up from `start` looking for the nearest directory containing
/// `veril.toml`.
fn find_project_root(start: &Path) -> Result<PathBuf, String> {
    let mut current = start
        .canonicalize()
        .map_err(|e| format!("cannot resolve `{}`: {e}", start.display()))?;
    loop {
        if current.join("veril.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find veril.toml in {} or any parent directory",
                start.display()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_project_root_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("veril.toml"),
            "[project]\nname=\"t\"\nsources=[\"top.sv\"]\n",
        )
        .unwrap();
        let root = find_project_root(tmp.path()).unwrap();
        assert_eq!(root, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("veril.toml"),
            "[project]\nname=\"t\"\nsources=[\"top.sv\"]\n",
        )
        .unwrap();
        let sub = tmp.path().join("rtl");
        fs::create_dir_all(&sub).unwrap();
        let root = find_project_root(&sub).unwrap();
        assert_eq!(root, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = find_project_root(tmp.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("could not find veril.toml"));
    }

    #[test]
    fn cli_sources_build_adhoc_config() {
        let cli = Cli {
            quiet: true,
            project: None,
            command: crate::Command::Compile(CompileArgs {
                sources: vec!["a.sv".to_string()],
                top: vec!["top".to_string()],
                complain_undefined_macro: true,
            }),
        };
        let args = match &cli.command {
            crate::Command::Compile(a) => a,
            _ => unreachable!(),
        };
        let config = build_config(&cli, args).unwrap();
        assert_eq!(config.project.sources, vec![PathBuf::from("a.sv")]);
        assert_eq!(config.project.top, vec!["top"]);
        assert!(config.options.complain_undefined_macro);
    }

    #[test]
    fn project_config_resolves_relative_sources() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("veril.toml"),
            "[project]\nname=\"t\"\nsources=[\"rtl/top.sv\"]\n",
        )
        .unwrap();
        let cli = Cli {
            quiet: true,
            project: Some(tmp.path().to_str().unwrap().to_string()),
            command: crate::Command::Compile(CompileArgs {
                sources: vec![],
                top: vec![],
                complain_undefined_macro: false,
            }),
        };
        let args = match &cli.command {
            crate::Command::Compile(a) => a,
            _ => unreachable!(),
        };
        let config = build_config(&cli, args).unwrap();
        assert_eq!(config.project.sources, vec![tmp.path().join("rtl/top.sv")]);
    }
}

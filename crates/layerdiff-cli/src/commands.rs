use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use layerdiff_delta::{Delta, DeltaConfig, DiffOptions, DiffPatcher, SimilarTextDiffer};
use layerdiff_types::Value;
use tracing::debug;

use crate::cli::*;
use crate::format;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let output = cli.format;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &output),
        Command::Patch(args) => cmd_patch(args, false),
        Command::Unpatch(args) => cmd_patch(args, true),
        Command::Reverse(args) => cmd_reverse(args, &output),
        Command::Options => {
            print!("{}", DiffOptions::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn cmd_diff(args: DiffArgs, output: &OutputFormat) -> anyhow::Result<()> {
    match diff_files(&args)? {
        None => match output {
            OutputFormat::Text => println!("{} No changes.", "✓".green().bold()),
            OutputFormat::Json => println!("null"),
        },
        Some(delta) => print_delta(&delta, output)?,
    }
    Ok(())
}

fn cmd_patch(args: PatchArgs, undo: bool) -> anyhow::Result<()> {
    let value = patch_file(&args, undo)?;
    println!("{}", serde_json::to_string_pretty(&value.to_json()?)?);
    Ok(())
}

fn cmd_reverse(args: ReverseArgs, output: &OutputFormat) -> anyhow::Result<()> {
    let delta = read_delta(&args.delta)?;
    let reversed = DiffPatcher::default().reverse(&delta)?;
    print_delta(&reversed, output)
}

fn print_delta(delta: &Delta, output: &OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => {
            for line in format::lines(delta) {
                println!("{}", line.colored());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&delta.to_json()?)?),
    }
    Ok(())
}

// ---- File handling ----

pub fn diff_files(args: &DiffArgs) -> anyhow::Result<Option<Delta>> {
    let patcher = DiffPatcher::new(build_config(args)?);
    let left = read_value(&args.left)?;
    let right = read_value(&args.right)?;
    Ok(patcher.diff(&left, &right)?)
}

pub fn patch_file(args: &PatchArgs, undo: bool) -> anyhow::Result<Value> {
    let patcher = DiffPatcher::default();
    let mut value = read_value(&args.value)?;
    let delta = read_delta(&args.delta)?;
    if undo {
        patcher.unpatch(&mut value, &delta)?;
    } else {
        patcher.patch(&mut value, &delta)?;
    }
    Ok(value)
}

/// Options file first, then command-line overrides.
pub fn build_config(args: &DiffArgs) -> anyhow::Result<DeltaConfig> {
    let options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DiffOptions::from_toml_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => DiffOptions::default(),
    };
    let mut config = DeltaConfig::new(options);
    if args.no_detect_move {
        config = config.detect_move(false);
    }
    if let Some(key) = &args.object_hash {
        config = config.with_hash_key(key.clone());
    }
    if args.text {
        config = config.with_text_differ(SimilarTextDiffer);
    }
    debug!(?config, "diff config");
    Ok(config)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_value(path: &Path) -> anyhow::Result<Value> {
    Ok(Value::from_json(read_json(path)?)?)
}

fn read_delta(path: &Path) -> anyhow::Result<Delta> {
    Delta::from_json(read_json(path)?).with_context(|| format!("decoding delta {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn diff_args(left: PathBuf, right: PathBuf) -> DiffArgs {
        DiffArgs {
            left,
            right,
            config: None,
            object_hash: None,
            no_detect_move: false,
            text: false,
        }
    }

    #[test]
    fn diff_then_patch_through_files() {
        let dir = TempDir::new().unwrap();
        let left = write(&dir, "left.json", r#"{"name": "a", "tags": [1, 2, 3]}"#);
        let right = write(&dir, "right.json", r#"{"name": "b", "tags": [3, 1, 2]}"#);

        let delta = diff_files(&diff_args(left.clone(), right.clone())).unwrap().unwrap();
        let delta_path = write(&dir, "delta.json", &delta.to_json().unwrap().to_string());

        let args = PatchArgs {
            value: left.clone(),
            delta: delta_path.clone(),
        };
        let patched = patch_file(&args, false).unwrap();
        assert_eq!(patched, read_value(&right).unwrap());

        let args = PatchArgs {
            value: right,
            delta: delta_path,
        };
        let restored = patch_file(&args, true).unwrap();
        assert_eq!(restored, read_value(&left).unwrap());
    }

    #[test]
    fn identical_files_have_no_delta() {
        let dir = TempDir::new().unwrap();
        let left = write(&dir, "left.json", r#"[1, {"a": null}]"#);
        let right = write(&dir, "right.json", r#"[1, {"a": null}]"#);
        assert!(diff_files(&diff_args(left, right)).unwrap().is_none());
    }

    #[test]
    fn config_file_and_flags_combine() {
        let dir = TempDir::new().unwrap();
        let toml = write(
            &dir,
            "diff.toml",
            "match_by_position = true\n[text_diff]\nmin_length = 5\n",
        );
        let mut args = diff_args(PathBuf::from("l"), PathBuf::from("r"));
        args.config = Some(toml);
        args.no_detect_move = true;
        args.text = true;

        let config = build_config(&args).unwrap();
        assert!(config.options.match_by_position);
        assert!(!config.options.arrays.detect_move);
        assert_eq!(config.options.text_diff.min_length, 5);
        assert!(config.text_differ.is_some());
    }

    #[test]
    fn object_hash_flag_matches_by_key() {
        let dir = TempDir::new().unwrap();
        let left = write(&dir, "left.json", r#"[{"id": 1, "v": 1}, {"id": 2, "v": 1}]"#);
        let right = write(&dir, "right.json", r#"[{"id": 1, "v": 1}, {"id": 2, "v": 2}]"#);
        let mut args = diff_args(left, right);
        args.object_hash = Some("id".into());

        let delta = diff_files(&args).unwrap().unwrap();
        assert_eq!(
            delta.to_json().unwrap(),
            json!({"_t": "a", "1": {"v": [1.0, 2.0]}})
        );
    }

    #[test]
    fn bad_config_names_the_file() {
        let dir = TempDir::new().unwrap();
        let toml = write(&dir, "broken.toml", "match_by_position = \"yes\"");
        let mut args = diff_args(PathBuf::from("l"), PathBuf::from("r"));
        args.config = Some(toml);
        let err = build_config(&args).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }

    #[test]
    fn malformed_delta_is_rejected() {
        let dir = TempDir::new().unwrap();
        let value = write(&dir, "value.json", "{}");
        let delta = write(&dir, "delta.json", "[1, 2, 3, 4]");
        let args = PatchArgs { value, delta };
        assert!(patch_file(&args, false).is_err());
    }
}

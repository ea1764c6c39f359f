//! varconf CLI - Command-line interface for varconf configuration files
//!
//! Usage:
//!   varconf check config.yml
//!   varconf render config.yml --set HOST=localhost --use-env
//!   varconf vars config.yml

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use varconf_core::interpolation::{tokenize, Token};
use varconf_core::{Schema, SubstitutionMapping, Value, YamlLoader};

/// varconf - Configuration files with variable substitution
#[derive(Parser)]
#[command(name = "varconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quick YAML syntax check
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Substitute variables and print the resulting configuration
    Render {
        /// Configuration file to render
        file: PathBuf,

        /// Substitution values as KEY=VALUE pairs
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Use the process environment as the substitution mapping
        /// (explicit --set pairs take precedence)
        #[arg(short = 'e', long)]
        use_env: bool,

        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the variables referenced by configuration file(s)
    Vars {
        /// Configuration file(s) to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { files } => cmd_check(files),

        Commands::Render {
            file,
            set,
            use_env,
            format,
            output,
        } => cmd_render(file, set, use_env, &format, output),

        Commands::Vars { files } => cmd_vars(files),
    }
}

fn cmd_check(files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        let content = match std::fs::read_to_string(&file) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
                continue;
            }
        };

        match serde_yaml::from_str::<Value>(&content) {
            Ok(_) => {
                println!("{} {}: valid YAML", "✓".green(), file.display());
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn cmd_render(
    file: PathBuf,
    set: Vec<String>,
    use_env: bool,
    format: &str,
    output: Option<PathBuf>,
) -> ExitCode {
    let mapping = match build_mapping(&set, use_env) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    // An empty schema preserves every field, so rendering is a pure
    // substitution pass
    let mut loader = YamlLoader::new(Schema::builder().build());
    if let Some(mapping) = mapping {
        loader = loader.with_mapping(mapping);
    }

    let config = match loader.load(Some(file.as_path())) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(1);
        }
    };

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&config)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::to_string(&config).map_err(|e| e.to_string()),
        _ => {
            eprintln!("Unsupported format: {}. Use yaml or json.", format);
            return ExitCode::from(1);
        }
    };

    match rendered {
        Ok(content) => {
            if let Some(output_path) = output {
                if let Err(e) = std::fs::write(&output_path, &content) {
                    eprintln!("{}: {}", "Error writing file".red(), e);
                    return ExitCode::from(2);
                }
                eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
            } else {
                print!("{}", content);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_vars(files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        let content = match std::fs::read_to_string(&file) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
                continue;
            }
        };

        let data: Value = match serde_yaml::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
                continue;
            }
        };

        let mut names = BTreeSet::new();
        if let Err(e) = collect_variables(&data, &mut names) {
            eprintln!("{} {}: {}", "✗".red(), file.display(), e);
            all_valid = false;
            continue;
        }

        println!("{}:", file.display());
        for name in names {
            println!("  {}", name);
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Assemble the substitution mapping from --set pairs and/or the process
/// environment; None when neither source is requested
fn build_mapping(
    set: &[String],
    use_env: bool,
) -> Result<Option<SubstitutionMapping>, String> {
    if set.is_empty() && !use_env {
        return Ok(None);
    }

    let mut mapping = SubstitutionMapping::new();

    if use_env {
        mapping.extend(std::env::vars());
    }

    for pair in set {
        match pair.split_once('=') {
            Some((key, value)) => {
                mapping.insert(key.to_string(), value.to_string());
            }
            None => {
                return Err(format!("Invalid --set pair '{}', expected KEY=VALUE", pair));
            }
        }
    }

    Ok(Some(mapping))
}

/// Collect the names of all placeholders referenced by string values
fn collect_variables(
    value: &Value,
    names: &mut BTreeSet<String>,
) -> Result<(), varconf_core::Error> {
    match value {
        Value::String(s) => {
            if s.contains('$') {
                for token in tokenize(s)? {
                    if let Token::Placeholder { name, .. } = token {
                        names.insert(name);
                    }
                }
            }
        }
        Value::Sequence(seq) => {
            for item in seq {
                collect_variables(item, names)?;
            }
        }
        Value::Mapping(map) => {
            for item in map.values() {
                collect_variables(item, names)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_mapping_none_without_sources() {
        assert!(build_mapping(&[], false).unwrap().is_none());
    }

    #[test]
    fn test_build_mapping_set_pairs() {
        let mapping = build_mapping(&["A=1".into(), "B=x=y".into()], false)
            .unwrap()
            .unwrap();
        assert_eq!(mapping["A"], "1");
        // Only the first '=' separates key from value
        assert_eq!(mapping["B"], "x=y");
    }

    #[test]
    fn test_build_mapping_rejects_malformed_pair() {
        assert!(build_mapping(&["MISSING_EQUALS".into()], false).is_err());
    }

    #[test]
    fn test_build_mapping_set_overrides_env() {
        std::env::set_var("VARCONF_CLI_TEST_VAR", "from-env");
        let mapping = build_mapping(&["VARCONF_CLI_TEST_VAR=from-set".into()], true)
            .unwrap()
            .unwrap();
        assert_eq!(mapping["VARCONF_CLI_TEST_VAR"], "from-set");
        std::env::remove_var("VARCONF_CLI_TEST_VAR");
    }

    #[test]
    fn test_collect_variables() {
        let data: Value = serde_yaml::from_str(
            r#"
host: ${HOST}
port: $PORT
nested:
  secret: ${SECRET:?required}
  plain: no placeholders
  escaped: $$HOME
"#,
        )
        .unwrap();

        let mut names = BTreeSet::new();
        collect_variables(&data, &mut names).unwrap();

        let names: Vec<_> = names.into_iter().collect();
        assert_eq!(names, vec!["HOST", "PORT", "SECRET"]);
    }
}

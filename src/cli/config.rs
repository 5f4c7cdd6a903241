//! Config command handlers

use crate::cli::ConfigInitArgs;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../switchboard.example.toml");

/// Handle `switchboard config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!(
        "  Edit the [[workers]] entries, then run `switchboard serve -c {}`.",
        args.output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_config_init_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("switchboard.toml");

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };

        handle_config_init(&args).unwrap();

        assert!(output_path.exists());
        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[server]"));
        assert!(content.contains("[[workers]]"));
    }

    #[test]
    fn test_config_init_no_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("switchboard.toml");

        // Create existing file
        std::fs::write(&output_path, "existing").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };

        let result = handle_config_init(&args);
        assert!(result.is_err());

        // Original content preserved
        let content = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(content, "existing");
    }

    #[test]
    fn forced_init_writes_a_loadable_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("switchboard.toml");
        std::fs::write(&output_path, "old content").unwrap();

        handle_config_init(&ConfigInitArgs {
            output: output_path.clone(),
            force: true,
        })
        .unwrap();

        let config = crate::config::SwitchboardConfig::load(Some(output_path.as_path())).unwrap();
        config.validate().unwrap();
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.worker_count(), config.workers.len());
        assert!(!config.persistence.enabled);
    }
}

use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use crate::utils::sqpack_path;
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;

fn update_sqpack_path_in_config(path: Utf8PathBuf) -> Result<()> {
    let mut cfg = config::load_config();
    tracing::info!("Saving sqpack_path={}", path);
    cfg.sqpack_path = Some(path);
    config::save_config(&cfg).map_err(|e| miette::miette!("Failed to save config: {}", e))
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    match cfg.sqpack_path.as_ref() {
        Some(p) => {
            let status = if sqpack_path::is_valid_sqpack_path(p) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", "sqpack_path:".bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                "sqpack_path:".bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }

    println!();
    Ok(())
}

pub fn set_sqpack_path(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !sqpack_path::is_valid_sqpack_path(&path) {
        tracing::warn!("Rejected sqpack path {}", path);
        return Err(CliError::invalid_sqpack_path(path.into_std_path_buf()).into());
    }

    update_sqpack_path_in_config(path.clone())?;

    println!(
        "{}",
        "✓ sqpack path set successfully!".bright_green().bold()
    );
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn auto_detect_sqpack_path() -> Result<()> {
    println!(
        "{}",
        "Searching for FINAL FANTASY XIV installation...".bright_cyan()
    );
    println!();

    let detected = sqpack_path::auto_detect_sqpack_path();
    tracing::debug!("Auto-detect result: {:?}", detected);
    match detected {
        Some(detected_path) => {
            println!("{}", "✓ Found sqpack directory!".bright_green().bold());
            println!();
            println!(
                "  {} {}",
                "Path:".bright_white().bold(),
                detected_path.as_str().bright_green()
            );
            println!();

            update_sqpack_path_in_config(detected_path)?;

            println!(
                "{}",
                "✓ Configuration updated successfully!"
                    .bright_green()
                    .bold()
            );
        }
        None => {
            println!(
                "{}",
                "✗ Could not automatically detect the sqpack directory"
                    .bright_red()
                    .bold()
            );
            println!();
            println!(
                "  {} Use 'sqpack-inject config set-sqpack-path <path>' to set the path manually",
                "•".bright_cyan()
            );
            println!(
                "  {} The path should point to: ...\\game\\sqpack",
                "•".bright_cyan()
            );
        }
    }

    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    tracing::info!("Resetting config at {}", config_path);
    config::save_config(&AppConfig::default())
        .map_err(|e| miette::miette!("Failed to reset config: {}", e))?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    println!();

    Ok(())
}

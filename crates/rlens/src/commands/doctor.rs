//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;

use rlens_core::Config;

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "rlens Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check GitHub token
    print!("  GitHub token: ");
    match config.github.token {
        Some(_) => println!("{}", "✓ configured".green()),
        None => println!(
            "{}",
            "○ not set (unauthenticated rate limits apply)".yellow()
        ),
    }

    // Check generation credential
    print!("  Generation API key: ");
    match config.generation.api_key {
        Some(_) => println!("{}", "✓ configured".green()),
        None => {
            println!("{}", "✗ not set".red());
            issues.push("Generation API key missing; insights will be unavailable");
        }
    }

    // Endpoint summary
    println!("  Metadata API: {}", config.github.api_url);
    println!(
        "  Generation API: {} (model {})",
        config.generation.api_url, config.generation.model
    );

    println!();
    if issues.is_empty() {
        println!("{}", "✓ All checks passed".green());
    } else {
        println!("{}", format!("{} issue(s) found:", issues.len()).yellow());
        for issue in &issues {
            println!("  - {issue}");
        }
    }

    Ok(())
}

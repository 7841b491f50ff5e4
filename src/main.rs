use lexevo::config::Config;
use lexevo::find_patterns;
use std::fs;
use std::path::Path;
use std::process;

/// Loads samples from a text file, one sample per non-empty line.
///
/// # Arguments
/// * `path` - Path to the sample file
///
/// # Returns
/// * `Ok(Vec<String>)` - The sample texts in file order
/// * `Err(String)` - Error message if reading fails or the file is empty
fn load_samples(path: &Path) -> Result<Vec<String>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read sample file: {}", e))?;
    let samples: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if samples.is_empty() {
        return Err("Sample file contains no samples.".to_string());
    }
    Ok(samples)
}

fn main() {
    env_logger::init();
    log::info!("Booting lexevo...");

    let mut args = std::env::args().skip(1);
    let Some(samples_path) = args.next() else {
        log::error!("Usage: lexevo <samples-file> [config-file]");
        process::exit(1);
    };
    let config_path = args.next().unwrap_or_else(|| "config.toml".to_string());

    // 1. Load and validate configuration
    let config = match Config::load(Path::new(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        process::exit(1);
    }
    log::info!("Configuration loaded and validated.");

    // 2. Load samples
    let samples = match load_samples(Path::new(&samples_path)) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Sample preparation failed: {}", e);
            process::exit(1);
        }
    };
    log::info!("Loaded {} samples from '{}'.", samples.len(), samples_path);

    // 3. Run the search
    let texts: Vec<&str> = samples.iter().map(String::as_str).collect();
    let ranked = match find_patterns(&texts, &config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Pattern search failed: {}", e);
            process::exit(1);
        }
    };

    log::info!("--- Search Complete ---");
    println!("Best patterns for this execution:");
    for (i, (pattern, fitness)) in ranked.iter().enumerate() {
        println!("\n[Rank {}] Fitness: {:.4}", i + 1, fitness);
        println!("{}", pattern);
    }
}

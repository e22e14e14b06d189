use crate::config::types::FileConfig;
use crate::config::validation::validate_file;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Reads a `sitemapper.toml` file
///
/// Every key is optional. Only values that make sense on their own are
/// checked here (changefreq spelling, priority range); crawl settings are
/// validated after command-line overrides have been merged in.
///
/// ```no_run
/// use std::path::Path;
/// use sitemapper::config::load_config;
///
/// let file = load_config(Path::new("sitemapper.toml")).unwrap();
/// println!("Max depth: {:?}", file.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let (config, _) = read_and_parse(path)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of the file's bytes
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let bytes = fs::read(path)?;
    Ok(digest(&bytes))
}

/// Loads a file together with the digest logged at startup
///
/// The file is read once, so the hash always describes the content that
/// was parsed.
pub fn load_config_with_hash(path: &Path) -> Result<(FileConfig, String), ConfigError> {
    read_and_parse(path)
}

fn read_and_parse(path: &Path) -> Result<(FileConfig, String), ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    validate_file(&config)?;
    Ok((config, digest(content.as_bytes())))
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

//! Model downloader.
//!
//! Fetches missing model files for a tier from HuggingFace into the local
//! cache directory. Downloads stream to disk in chunks; the files run to
//! hundreds of megabytes.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{BatchError, Result};

use super::loader::{remote_url, REQUIRED_MODEL_FILES};
use super::tier::Tier;

/// Download read-buffer size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Per-file timeout. Generous because the decoder exports are large.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(3600);

/// Ensures all required model files for a tier are present, downloading
/// any that are missing.
pub fn ensure_models(model_dir: &Path, tier: Tier) -> Result<()> {
    fs::create_dir_all(model_dir).map_err(|e| {
        BatchError::model_download_failed(format!(
            "cannot create model directory {}: {}",
            model_dir.display(),
            e
        ))
    })?;

    let missing: Vec<&str> = REQUIRED_MODEL_FILES
        .iter()
        .copied()
        .filter(|file| !model_dir.join(file).exists())
        .collect();

    if missing.is_empty() {
        eprintln!("All model files present.");
        return Ok(());
    }

    eprintln!(
        "Downloading {} file(s) for the {} model...",
        missing.len(),
        tier
    );
    eprintln!("(This may take several minutes on first run)");
    eprintln!();

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| {
            BatchError::model_download_failed(format!("HTTP client: {}", e))
        })?;

    for file in &missing {
        fetch_file(&client, &remote_url(tier, file), &model_dir.join(file))?;
    }

    // config.json is optional; fetch it opportunistically and ignore failure.
    let config_path = model_dir.join("config.json");
    if !config_path.exists() {
        let _ = fetch_file(&client, &remote_url(tier, "config.json"), &config_path);
    }

    eprintln!();
    eprintln!("All models downloaded successfully.");
    Ok(())
}

/// Streams one remote file to disk, reporting progress every 10%.
fn fetch_file(client: &reqwest::blocking::Client, url: &str, dest: &Path) -> Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy();
    eprint!("  Downloading {}... ", filename);

    let mut response = client.get(url).send().map_err(|e| {
        BatchError::model_download_failed(format!("{}: {}", url, e))
    })?;

    if !response.status().is_success() {
        eprintln!("failed");
        return Err(BatchError::model_download_failed(format!(
            "HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(dest).map_err(|e| {
        BatchError::model_download_failed(format!("{}: {}", dest.display(), e))
    })?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut received: u64 = 0;
    let mut reported = 0;
    loop {
        let n = response.read(&mut buffer).map_err(|e| {
            BatchError::model_download_failed(format!("{}: {}", url, e))
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n]).map_err(|e| {
            BatchError::model_download_failed(format!("{}: {}", dest.display(), e))
        })?;

        received += n as u64;
        if total > 0 {
            let percent = (received * 100 / total) as usize;
            if percent >= reported + 10 {
                eprint!("{}%... ", percent);
                reported = percent;
            }
        }
    }

    eprintln!("done ({:.1} MB)", received as f64 / (1024.0 * 1024.0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_required_file_has_a_url() {
        for tier in [Tier::Small, Tier::Medium, Tier::Melody, Tier::Large] {
            for file in REQUIRED_MODEL_FILES {
                let url = remote_url(tier, file);
                assert!(url.starts_with("https://"), "bad url: {url}");
                assert!(url.ends_with(file), "bad url: {url}");
            }
        }
    }

    #[test]
    fn ensure_models_skips_download_when_present() {
        // Fabricate a "complete" model directory; no network involved.
        let dir = tempfile::tempdir().unwrap();
        for file in REQUIRED_MODEL_FILES {
            std::fs::write(dir.path().join(file), b"stub").unwrap();
        }
        std::fs::write(dir.path().join("config.json"), b"{}").unwrap();

        assert!(ensure_models(dir.path(), Tier::Small).is_ok());
    }
}

//! Dump the aquarium service's OpenAPI document.
//!
//! The document is built from the handler annotations alone, so no database
//! or device key is needed. It goes to stdout unless `--output <path>` is
//! given.

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use smart_aquarium_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn output_path(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    args.find(|a| a == "--output")?;
    args.next().map(PathBuf::from)
}

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serialising OpenAPI document")?;

    match output_path(std::env::args().skip(1)) {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("wrote {} ({} bytes)", path.display(), json.len());
        }
        None => std::io::stdout()
            .write_all(json.as_bytes())
            .context("writing to stdout")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn output_flag_takes_following_path() {
        assert_eq!(
            output_path(args(&["--output", "openapi.json"])),
            Some(PathBuf::from("openapi.json"))
        );
    }

    #[test]
    fn stdout_when_flag_absent_or_dangling() {
        assert_eq!(output_path(args(&[])), None);
        assert_eq!(output_path(args(&["--output"])), None);
    }

    #[test]
    fn document_lists_device_and_admin_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/sensor-data/"));
        assert!(doc.paths.paths.contains_key("/control-device/"));
    }
}

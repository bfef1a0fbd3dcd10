use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use unlayer_image::ExtractRequest;

/// Extract files and folders out of a container image tarball without
/// running the image.
#[derive(Clone, Debug, Parser)]
#[command(name = "unlayer", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Path to the container image (.tar or .tar.gz)
    #[arg(long, short = 'i')]
    pub image: PathBuf,

    /// Path inside the image to extract; 'dir/*' extracts the folder contents
    #[arg(long, short = 's', conflicts_with = "paths", required_unless_present = "paths")]
    pub src: Option<String>,

    /// Where the extracted file / folder should be placed
    #[arg(long, short = 'd', conflicts_with = "paths")]
    pub dest: Option<PathBuf>,

    /// Owner name applied to all extracted paths
    #[arg(long, conflicts_with = "paths")]
    pub owner: Option<String>,

    /// Group name applied to all extracted paths
    #[arg(long, conflicts_with = "paths")]
    pub group: Option<String>,

    /// JSON file with a list of requests: [{"src", "dest", "owner", "group"}]
    #[arg(long)]
    pub paths: Option<PathBuf>,

    /// Directory to change into before opening the image
    #[arg(long)]
    pub chdir: Option<PathBuf>,

    /// Re-extract even if previously extracted files exist
    #[arg(long, short = 'f')]
    pub force: bool,
}

impl App {
    /// Assemble the request batch from either `--src` or a `--paths` file,
    /// with the top-level `--force` applied to every request.
    pub fn requests(&self) -> Result<Vec<ExtractRequest>> {
        let mut requests = match &self.paths {
            Some(file) => {
                let raw = fs::read_to_string(file)
                    .with_context(|| format!("failed to read paths file: {}", file.display()))?;
                serde_json::from_str::<Vec<ExtractRequest>>(&raw)
                    .with_context(|| format!("invalid paths file: {}", file.display()))?
            }
            None => {
                let src = self.src.clone().context("one of --src / --paths is required")?;
                let mut request = ExtractRequest::new(src);
                request.dest = self.dest.clone();
                request.owner = self.owner.clone();
                request.group = self.group.clone();
                vec![request]
            }
        };

        if self.force {
            for request in &mut requests {
                request.force = true;
            }
        }
        Ok(requests)
    }

    /// Enforce what cannot be checked once the working directory is gone:
    /// without `--chdir`, the image and every destination must be absolute,
    /// and destinations must be explicit.
    pub fn validate(&self, requests: &[ExtractRequest]) -> Result<()> {
        if self.chdir.is_some() {
            return Ok(());
        }
        if !self.image.is_absolute() {
            bail!("usage of relative paths requires --chdir");
        }
        for request in requests {
            match &request.dest {
                None => bail!(
                    "extracting paths to root level without explicit use of --dest is not supported"
                ),
                Some(dest) if !dest.is_absolute() => {
                    bail!("usage of relative paths requires --chdir")
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> App {
        App::try_parse_from(std::iter::once("unlayer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn single_request_from_flags() {
        let app = parse(&[
            "--image", "/images/app.tar",
            "--src", "/usr/lib/os-release",
            "--dest", "/tmp/os-release",
        ]);
        let requests = app.requests().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].src, "/usr/lib/os-release");
        assert_eq!(requests[0].dest, Some(PathBuf::from("/tmp/os-release")));
    }

    #[test]
    fn src_or_paths_is_required() {
        let result = App::try_parse_from(["unlayer", "--image", "/images/app.tar"]);
        assert!(result.is_err());
    }

    #[test]
    fn src_conflicts_with_paths() {
        let result = App::try_parse_from([
            "unlayer",
            "--image", "/images/app.tar",
            "--src", "/etc/passwd",
            "--paths", "/tmp/paths.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn force_flag_applies_to_all_requests() {
        let app = parse(&[
            "--image", "/images/app.tar",
            "--src", "/usr/lib/*",
            "--dest", "/tmp/lib",
            "--force",
        ]);
        let requests = app.requests().unwrap();
        assert!(requests[0].force);
    }

    #[test]
    fn relative_image_requires_chdir() {
        let app = parse(&["--image", "app.tar", "--src", "/etc/passwd", "--dest", "/tmp/p"]);
        let requests = app.requests().unwrap();
        assert!(app.validate(&requests).is_err());
    }

    #[test]
    fn missing_dest_requires_chdir() {
        let app = parse(&["--image", "/images/app.tar", "--src", "/etc/passwd"]);
        let requests = app.requests().unwrap();
        assert!(app.validate(&requests).is_err());
    }

    #[test]
    fn relative_dest_requires_chdir() {
        let app = parse(&[
            "--image", "/images/app.tar",
            "--src", "/etc/passwd",
            "--dest", "passwd-copy",
        ]);
        let requests = app.requests().unwrap();
        assert!(app.validate(&requests).is_err());
    }

    #[test]
    fn chdir_lifts_the_absolute_path_requirements() {
        let app = parse(&[
            "--image", "app.tar",
            "--src", "/etc/passwd",
            "--chdir", "/images",
        ]);
        let requests = app.requests().unwrap();
        assert!(app.validate(&requests).is_ok());
    }

    #[test]
    fn paths_file_parses_into_requests() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.json");
        fs::write(
            &file,
            r#"[
                {"src": "/usr/bin/*", "dest": "/usr/local/bin", "owner": "root", "group": "root"},
                {"src": "/usr/lib/os-release"}
            ]"#,
        )
        .unwrap();

        let app = parse(&["--image", "/images/app.tar", "--paths", file.to_str().unwrap()]);
        let requests = app.requests().unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].owner.as_deref(), Some("root"));
        assert_eq!(requests[1].src, "/usr/lib/os-release");
    }
}

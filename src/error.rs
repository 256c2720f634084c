use thiserror::Error;

/// Failures of the package lifecycle that callers may want to tell apart.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<PackageError>()`
/// to branch on a kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    /// No releases exist, or the requested version is not one of them.
    #[error("Resolution failed for {package}: {reason}")]
    Resolution { package: String, reason: String },

    /// Every candidate filename and URL shape answered 404.
    #[error("No valid artifact found for {package} (tried: {})", .tried.join(", "))]
    NoValidArtifact { package: String, tried: Vec<String> },

    /// The downloaded archive has no recognizable install subtree.
    #[error("No install target found in {package}: {reason}")]
    NoInstallTarget { package: String, reason: String },

    /// A non-404 HTTP failure.
    #[error("Request to {url} failed with HTTP status {status}")]
    Transport { url: String, status: u16 },

    /// `add` of a package that is already installed without `--update`.
    #[error("Package {package} is already installed (version {version}). Use --update to replace it.")]
    AlreadyInstalled { package: String, version: String },

    #[error("Invalid repository URL '{0}'. Expected https://<host>/<owner>/<name>.")]
    InvalidUrl(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
}

impl PackageError {
    pub fn resolution(package: impl Into<String>, reason: impl Into<String>) -> Self {
        PackageError::Resolution {
            package: package.into(),
            reason: reason.into(),
        }
    }

    pub fn no_install_target(package: impl Into<String>, reason: impl Into<String>) -> Self {
        PackageError::NoInstallTarget {
            package: package.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_artifact_lists_every_attempt() {
        let err = PackageError::NoValidArtifact {
            package: "mini-media-player".into(),
            tried: vec!["a.js".into(), "b.js".into()],
        };
        assert_eq!(
            err.to_string(),
            "No valid artifact found for mini-media-player (tried: a.js, b.js)"
        );
    }

    #[test]
    fn test_error_survives_anyhow_round_trip() {
        let err: anyhow::Error = PackageError::Transport {
            url: "https://example.com".into(),
            status: 500,
        }
        .into();

        let err = err.context("Downloading artifact");
        assert_eq!(
            err.downcast_ref::<PackageError>(),
            Some(&PackageError::Transport {
                url: "https://example.com".into(),
                status: 500
            })
        );
    }
}

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use std::path::PathBuf;

use crate::{
    archive::ArchiveExtractorImpl,
    github::{Endpoints, GitHub},
    http::HttpClient,
    package::{DEFAULT_LOCK_FILE, InstallContext, InstallLayout},
    runtime::Runtime,
};

/// Global options as given on the command line (or through the environment).
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub config_root: Option<PathBuf>,
    pub package_file: Option<PathBuf>,
    pub api_url: Option<String>,
    pub raw_url: Option<String>,
    pub web_url: Option<String>,
}

pub struct Config {
    pub root: PathBuf,
    pub lock_path: PathBuf,
    pub github: GitHub,
    pub extractor: ArchiveExtractorImpl,
}

impl Config {
    pub fn new(runtime: &dyn Runtime, settings: Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!(
                "Using GITHUB_TOKEN for authentication ({} characters)",
                token.len()
            );
        }

        let client = Client::builder()
            .user_agent("unhacs-cli")
            .default_headers(headers)
            .build()?;

        let root = match settings.config_root {
            Some(root) => root,
            None => runtime.current_dir()?,
        };
        let lock_path = settings
            .package_file
            .unwrap_or_else(|| root.join(DEFAULT_LOCK_FILE));
        debug!("Using configuration root {:?}, lock file {:?}", root, lock_path);

        let endpoints = Endpoints::new(settings.api_url, settings.raw_url, settings.web_url);
        let github = GitHub::new(HttpClient::new(client), endpoints);

        Ok(Self {
            root,
            lock_path,
            github,
            extractor: ArchiveExtractorImpl::new(),
        })
    }

    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(&self.root)
    }

    pub fn install_context<'a>(&'a self, runtime: &'a dyn Runtime) -> InstallContext<'a> {
        InstallContext::new(runtime, &self.github, &self.extractor, self.layout())
    }
}

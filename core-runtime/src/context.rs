//! Host context handed to the core by the application shell.

use std::path::{Path, PathBuf};

/// Identity of the host application.
///
/// The shell creates one on start-up and passes it to the subsystems that
/// need to know who they are running for (for example, to build a
/// `User-Agent`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    app_name: String,
    app_version: String,
    data_dir: Option<PathBuf>,
}

impl HostContext {
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            data_dir: None,
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// `<app_name>/<app_version>`, or just the name when no version is set
    pub fn user_agent(&self) -> String {
        if self.app_version.is_empty() {
            self.app_name.clone()
        } else {
            format!("{}/{}", self.app_name, self.app_version)
        }
    }
}

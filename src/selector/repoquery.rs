use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{PackageIndex, QueryError};
use crate::config::IndexConfig;
use crate::process::ToolCommand;

/// `repoquery` backed package index
#[derive(Debug, Clone)]
pub struct Repoquery {
    program: String,
    repos: Vec<String>,
    arch: String,
    timeout: Duration,
}

impl Repoquery {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            program: config.program.clone(),
            repos: config.repos.clone(),
            arch: config.arch.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn command(&self, dependency: &str) -> ToolCommand {
        let mut command = ToolCommand::new(&self.program).arg("-q");
        if !self.repos.is_empty() {
            command = command.arg(format!("--repo={}", self.repos.join(",")));
        }
        if !self.arch.is_empty() {
            command = command.arg(format!("--arch={}", self.arch));
        }
        command
            .arg("--whatrequires")
            .arg(dependency)
            .timeout(self.timeout)
    }
}

#[async_trait]
impl PackageIndex for Repoquery {
    async fn what_requires(&self, dependency: &str) -> Result<Vec<String>, QueryError> {
        let command = self.command(dependency);
        let output = command.run().await.map_err(|source| QueryError::Tool {
            dependency: dependency.to_string(),
            source,
        })?;

        if !output.success() {
            warn!("'{}' failed:\n{}", command, output.combined());
            return Err(QueryError::Status {
                dependency: dependency.to_string(),
                code: output.code_display(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output.stdout.lines().map(str::to_string).collect())
    }
}

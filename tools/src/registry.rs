//! Tool Registry — read-only catalog of tools grouped by category

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

use crate::probe::InstallProbe;

/// Command used when a tool id is unknown or has no default invocation
pub const UNCONFIGURED_COMMAND: &str = "echo 'Tool command not configured'";

/// A single external utility the registry knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    /// Executable name, used for the installation probe
    pub command: &'static str,
    /// Default invocation run by `/api/execute` for this tool
    pub help_command: Option<&'static str>,
}

/// Named, iconified group of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub icon: &'static str,
    pub tools: &'static [Tool],
}

/// Tool as reported to clients, with a freshly probed `installed` flag
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolStatus {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub command: &'static str,
    pub installed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryStatus {
    pub name: &'static str,
    pub icon: &'static str,
    pub tools: Vec<ToolStatus>,
}

/// Immutable registry, built once at startup
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    categories: &'static [Category],
}

impl Registry {
    pub fn builtin() -> Self {
        Self::from_catalog(crate::catalog::BUILTIN_CATEGORIES)
    }

    pub fn from_catalog(categories: &'static [Category]) -> Self {
        Self { categories }
    }

    /// Categories in catalog order
    pub fn list_categories(&self) -> &'static [Category] {
        self.categories
    }

    /// All tools, categories flattened, in catalog order
    pub fn tools(&self) -> impl Iterator<Item = &'static Tool> {
        self.categories.iter().flat_map(|category| category.tools.iter())
    }

    pub fn tool_count(&self) -> usize {
        self.tools().count()
    }

    pub fn find_tool(&self, id: u32) -> Option<&'static Tool> {
        self.tools().find(|tool| tool.id == id)
    }

    /// Exact configured invocation for a registered tool
    pub fn resolve_command(&self, id: u32) -> Option<&'static str> {
        self.find_tool(id).and_then(|tool| tool.help_command)
    }

    /// Invocation for a raw (form-supplied) tool id, falling back to
    /// [`UNCONFIGURED_COMMAND`] for anything that does not resolve.
    ///
    /// Ids match on their exact decimal spelling: `" 1"`, `"01"` and `"+1"`
    /// are not tool 1.
    pub fn command_for(&self, raw_id: &str) -> &'static str {
        raw_id
            .parse::<u32>()
            .ok()
            .filter(|id| id.to_string() == raw_id)
            .and_then(|id| self.resolve_command(id))
            .unwrap_or(UNCONFIGURED_COMMAND)
    }

    /// Categories with every tool probed right now; nothing is cached
    pub async fn list_with_status(&self, probe: Arc<dyn InstallProbe>) -> Vec<CategoryStatus> {
        let mut probes = JoinSet::new();
        for (index, tool) in self.tools().enumerate() {
            let probe = Arc::clone(&probe);
            probes.spawn(async move { (index, probe.is_installed(tool.command).await) });
        }

        let mut installed = vec![false; self.tool_count()];
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((index, flag)) => installed[index] = flag,
                Err(e) => warn!("Installation probe task failed: {e}"),
            }
        }

        let mut flags = installed.into_iter();
        self.categories
            .iter()
            .map(|category| CategoryStatus {
                name: category.name,
                icon: category.icon,
                tools: category
                    .tools
                    .iter()
                    .map(|tool| ToolStatus {
                        id: tool.id,
                        name: tool.name,
                        description: tool.description,
                        command: tool.command,
                        installed: flags.next().unwrap_or(false),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Number of tools currently reported installed
    pub async fn installed_count(&self, probe: Arc<dyn InstallProbe>) -> usize {
        self.list_with_status(probe)
            .await
            .iter()
            .flat_map(|category| category.tools.iter())
            .filter(|tool| tool.installed)
            .count()
    }
}

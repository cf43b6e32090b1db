//! Install planner — maps a tool name to a package-install command line

use std::collections::HashMap;

/// Template used for names with no known install command
pub const DEFAULT_INSTALL_TEMPLATE: &str = "sudo apt install -y {name}";

const KNOWN_INSTALL_COMMANDS: &[(&str, &str)] = &[
    ("nmap", "sudo apt install -y nmap"),
    ("sqlmap", "sudo apt install -y sqlmap"),
    ("wireshark", "sudo apt install -y wireshark"),
    ("aircrack-ng", "sudo apt install -y aircrack-ng"),
    ("john", "sudo apt install -y john"),
];

/// Lookup table of install commands plus a fallback template
#[derive(Debug, Clone)]
pub struct InstallPlanner {
    commands: HashMap<String, String>,
    template: String,
}

impl Default for InstallPlanner {
    fn default() -> Self {
        Self::builtin()
    }
}

impl InstallPlanner {
    pub fn builtin() -> Self {
        Self {
            commands: KNOWN_INSTALL_COMMANDS
                .iter()
                .map(|(name, cmd)| (name.to_string(), cmd.to_string()))
                .collect(),
            template: DEFAULT_INSTALL_TEMPLATE.to_string(),
        }
    }

    /// Add or replace known install commands
    pub fn with_commands<I, K, V>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, cmd) in commands {
            self.commands.insert(name.into(), cmd.into());
        }
        self
    }

    /// Replace the fallback template; `{name}` is substituted with the tool name
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn is_known(&self, tool_name: &str) -> bool {
        self.commands.contains_key(tool_name)
    }

    /// Install command line for `tool_name`
    pub fn plan(&self, tool_name: &str) -> String {
        match self.commands.get(tool_name) {
            Some(cmd) => cmd.clone(),
            None => self.template.replace("{name}", tool_name),
        }
    }
}

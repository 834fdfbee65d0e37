//! Generates an Icinga2 `CheckCommand` object from the clap description of the command line.

use clap::ArgAction;

/// Environment variable which switches the binary into config generation.
pub const GENERATE_ENV: &str = "GENERATE_ICINGA_COMMAND";

pub struct CommandDescription {
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    name: String,
    var: String,
    description: Option<String>,
    is_flag: bool,
    repeat: bool,
    required: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("argument `{0}` has no long name")]
    MissingLongArgument(String),
}

impl CommandDescription {
    /// Collects the arguments of `cmd`, custom variables are named `<prefix>_<argument>`.
    pub fn from_command(cmd: &clap::Command, prefix: &str) -> Result<Self, ToIcingaCommandError> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let id = arg.get_id().as_str();
            if matches!(arg.get_action(), ArgAction::Help | ArgAction::Version) {
                continue;
            }

            let name = arg
                .get_long()
                .ok_or_else(|| ToIcingaCommandError::MissingLongArgument(id.to_owned()))?
                .to_owned();

            arguments.push(ArgumentDescription {
                var: format!("{prefix}_{}", name.replace('-', "_")),
                name,
                description: arg.get_help().map(|s| s.to_string()),
                is_flag: !arg.get_action().takes_values(),
                repeat: matches!(arg.get_action(), ArgAction::Append),
                required: arg.is_required_set(),
                default_value: arg
                    .get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .map(|s| s.to_string()),
            });
        }

        Ok(CommandDescription { arguments })
    }

    pub fn to_icinga_command(&self, name: &str, exe: &str) -> String {
        let mut out = format!("object CheckCommand \"{name}\" {{\n");
        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(exe)));
        out.push_str("  arguments = {\n");

        for arg in &self.arguments {
            out.push_str(&format!("    \"--{}\" = {{\n", arg.name));

            if arg.is_flag {
                out.push_str(&format!("      set_if = \"${}$\"\n", arg.var));
            } else {
                out.push_str(&format!("      value = \"${}$\"\n", arg.var));
            }
            if arg.repeat {
                out.push_str("      repeat_key = true\n");
            }
            if arg.required {
                out.push_str("      required = true\n");
            }
            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("    }\n");
        }
        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter_map(|arg| Some((&arg.var, arg.default_value.as_ref()?)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if !defaults.is_empty() {
            out.push('\n');
        }
        for (var, value) in defaults {
            out.push_str(&format!("  vars.{var} = \"{}\"\n", escape_string(value)));
        }

        out.push_str("}\n");
        out
    }
}

fn escape_string(s: &str) -> String {
    ["\\", "\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{c}")))
}

/// Returns the Icinga command configuration if the [GENERATE_ENV] environment variable is set.
pub fn icinga_command_config_from_env(
    name: &str,
    cmd: &clap::Command,
) -> Result<Option<String>, ToIcingaCommandError> {
    if std::env::var_os(GENERATE_ENV).is_none() {
        return Ok(None);
    }

    let exe = std::env::current_exe()?;
    let exe = exe
        .to_str()
        .ok_or(ToIcingaCommandError::InvalidExecutablePath)?;

    let prefix = name.replace('-', "_");
    let description = CommandDescription::from_command(cmd, &prefix)?;
    Ok(Some(description.to_icinga_command(name, exe)))
}

//! Topic help with examples and guidance for the speed tester

use crate::{config::env::EnvManager, types::Confidence};
use colored::*;

/// Help system for the CLI application
pub struct HelpSystem {
    platform: &'static str,
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpSystem {
    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS,
        }
    }

    /// Topic names accepted by `--help-topic`
    pub fn topics() -> &'static [&'static str] {
        &["config", "providers", "confidence", "examples", "output"]
    }

    /// Display the main help message with all available options
    pub fn display_main_help(&self, use_colors: bool) -> String {
        [
            self.format_header(use_colors),
            self.format_usage_section(use_colors),
            self.format_options_section(use_colors),
            self.format_examples_section(use_colors),
            self.format_environment_section(use_colors),
        ]
        .join("\n")
    }

    /// Display quick help for specific topics
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" | "env" | "environment" => Some(self.format_environment_section(use_colors)),
            "providers" | "provider" => Some(self.format_provider_help(use_colors)),
            "confidence" => Some(self.format_confidence_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            "output" | "formatting" => Some(self.format_output_help(use_colors)),
            _ => None,
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Café Speed Tester";
        let subtitle = "Multi-run WiFi speed measurement with confidence scoring";
        let version = format!("{} ({})", crate::VERSION, crate::GIT_COMMIT);

        if use_colors {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!("{}\n{}\nVersion: {} | Platform: {}\n", title, subtitle, version, self.platform)
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let mut usage = format!("{}\n", section_header("USAGE:", use_colors));
        for pattern in [
            "cst [OPTIONS]",
            "cst --location <NAME> [OPTIONS]",
            "cst --confidence-for <COUNT>",
            "cst --help-topic <TOPIC>",
        ] {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }
        usage
    }

    fn format_options_section(&self, use_colors: bool) -> String {
        let options = [
            OptionHelp {
                short: Some("n"),
                long: "runs",
                value: "<COUNT>",
                description: "Number of measurement runs per session (1-50)",
                example: Some("--runs 5"),
            },
            OptionHelp {
                short: None,
                long: "cooldown-ms",
                value: "<MS>",
                description: "Pause between runs in milliseconds",
                example: None,
            },
            OptionHelp {
                short: Some("t"),
                long: "timeout",
                value: "<SECS>",
                description: "Deadline for a single run (1-600)",
                example: None,
            },
            OptionHelp {
                short: Some("p"),
                long: "provider",
                value: "<KIND>",
                description: "auto, http or simulated",
                example: Some("--provider simulated --seed 7"),
            },
            OptionHelp {
                short: None,
                long: "endpoint",
                value: "<URL>",
                description: "Base URL of the HTTP speed-test endpoint",
                example: None,
            },
            OptionHelp {
                short: Some("l"),
                long: "location",
                value: "<NAME>",
                description: "Record the result under this location",
                example: Some("--location \"Ritual Coffee\""),
            },
            OptionHelp {
                short: None,
                long: "history-file",
                value: "<PATH>",
                description: "Where per-location history is stored",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "share",
                value: "",
                description: "Print a shareable one-paragraph summary",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "json",
                value: "",
                description: "Print the session report as JSON on stdout",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "verbose",
                value: "",
                description: "Show every run and its spread",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "no-color",
                value: "",
                description: "Disable colored output",
                example: None,
            },
        ];

        let mut output = format!("{}\n", section_header("OPTIONS:", use_colors));
        for option in options {
            output.push_str(&option.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ("Quick check", "cst", "Three runs against the default endpoint"),
            (
                "Rate a café",
                "cst --location \"Ritual Coffee\" --share",
                "Store the result and print text ready to paste",
            ),
            (
                "Offline demo",
                "cst --provider simulated --seed 7 --cooldown-ms 0",
                "Reproducible numbers without touching the network",
            ),
            ("Scripting", "cst --json --runs 5 > result.json", "Machine-readable report"),
        ];

        let mut output = format!("{}\n", section_header("EXAMPLES:", use_colors));
        for (title, command, description) in examples {
            if use_colors {
                output.push_str(&format!(
                    "  {}\n    {}\n    {}\n\n",
                    title.bright_white().bold(),
                    format!("$ {}", command).bright_yellow(),
                    description.white()
                ));
            } else {
                output.push_str(&format!("  {}\n    $ {}\n    {}\n\n", title, command, description));
            }
        }
        output
    }

    fn format_environment_section(&self, use_colors: bool) -> String {
        let mut output = format!("{}\n", section_header("ENVIRONMENT VARIABLES:", use_colors));
        output.push_str("Configuration priority: CLI arguments > Environment variables > .env file > Defaults\n\n");

        for (var_name, description, _example) in EnvManager::get_supported_env_vars() {
            if use_colors {
                output.push_str(&format!("  {}: {}\n", var_name.bright_yellow().bold(), description.white()));
            } else {
                output.push_str(&format!("  {}: {}\n", var_name, description));
            }
        }
        output
    }

    fn format_provider_help(&self, use_colors: bool) -> String {
        let mut output = format!("{}\n", section_header("MEASUREMENT PROVIDERS:", use_colors));
        output.push_str("  http       Measures ping, jitter, download and upload against --endpoint\n");
        output.push_str("  simulated  Generates plausible café numbers, reproducible with --seed\n");
        output.push_str("  auto       Probes the endpoint once and falls back to simulated if it is unreachable\n");
        output
    }

    fn format_confidence_help(&self, use_colors: bool) -> String {
        let mut output = format!("{}\n", section_header("CONFIDENCE:", use_colors));
        output.push_str("Confidence reflects how many tests back a number:\n\n");
        output.push_str(&format!(
            "  {:<7} fewer than {} tests\n",
            Confidence::Low.label(),
            Confidence::MEDIUM_THRESHOLD
        ));
        output.push_str(&format!(
            "  {:<7} {} to {} tests\n",
            Confidence::Medium.label(),
            Confidence::MEDIUM_THRESHOLD,
            Confidence::HIGH_THRESHOLD - 1
        ));
        output.push_str(&format!(
            "  {:<7} {} or more tests\n",
            Confidence::High.label(),
            Confidence::HIGH_THRESHOLD
        ));
        output.push_str("\nLocation history accumulates across sessions, so repeat visits raise confidence.\n");
        output
    }

    fn format_output_help(&self, use_colors: bool) -> String {
        let mut output = format!("{}\n", section_header("OUTPUT:", use_colors));
        output.push_str("  Progress lines and logs go to stderr; results go to stdout.\n");
        output.push_str("  --json prints the aggregate, every run and the spread as one JSON document.\n");
        output.push_str("  --share prints a single paragraph with the location and confidence.\n");
        output.push_str("  Colors follow NO_COLOR, FORCE_COLOR and TERM=dumb unless --color or --no-color is given.\n");
        output
    }
}

fn section_header(title: &str, use_colors: bool) -> String {
    if use_colors {
        title.bright_green().bold().to_string()
    } else {
        title.to_string()
    }
}

struct OptionHelp {
    short: Option<&'static str>,
    long: &'static str,
    value: &'static str,
    description: &'static str,
    example: Option<&'static str>,
}

impl OptionHelp {
    fn format(&self, use_colors: bool) -> String {
        let mut option_str = match self.short {
            Some(short) if use_colors => format!("  {}, ", format!("-{}", short).bright_cyan()),
            Some(short) => format!("  -{}, ", short),
            None => "      ".to_string(),
        };

        let long_with_value = if self.value.is_empty() {
            format!("--{}", self.long)
        } else {
            format!("--{} {}", self.long, self.value)
        };

        if use_colors {
            option_str.push_str(&format!("{:<24} {}", long_with_value.bright_cyan(), self.description.white()));
        } else {
            option_str.push_str(&format!("{:<24} {}", long_with_value, self.description));
        }

        if let Some(example) = self.example {
            if use_colors {
                option_str.push_str(&format!(
                    "\n{}{}",
                    " ".repeat(31),
                    format!("Example: {}", example).bright_blue().italic()
                ));
            } else {
                option_str.push_str(&format!("\n{}Example: {}", " ".repeat(31), example));
            }
        }

        option_str
    }
}

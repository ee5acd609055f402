//! Command line parsing
//!
//! `adebar-picker` with no arguments starts the form UI; `search` runs a
//! single picker search and prints the candidates.

/// Parsed command from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the form UI
    Ui,
    /// One search: search <picker> [field=value ...] [--html]
    Search {
        picker: String,
        filters: Vec<(String, String)>,
        html: bool,
    },
    /// Show help: help
    Help,
    /// Not understood; carries the message to print
    Invalid { message: String },
}

impl Command {
    /// Parse arguments (without the program name)
    pub fn parse(args: &[String]) -> Self {
        let Some(cmd) = args.first() else {
            return Command::Ui;
        };

        match cmd.as_str() {
            "ui" | "open" => Command::Ui,
            "search" | "s" => Self::parse_search(&args[1..]),
            "help" | "--help" | "-h" => Command::Help,
            other => Command::Invalid {
                message: format!("Unknown command: {}. Run 'adebar-picker help' for usage.", other),
            },
        }
    }

    fn parse_search(args: &[String]) -> Self {
        let mut picker = None;
        let mut filters = Vec::new();
        let mut html = false;

        for arg in args {
            if arg == "--html" {
                html = true;
            } else if let Some((name, value)) = arg.split_once('=') {
                if name.is_empty() {
                    return Command::Invalid {
                        message: format!("Filter without a field name: {}", arg),
                    };
                }
                filters.push((name.to_string(), value.to_string()));
            } else if picker.is_none() {
                picker = Some(arg.clone());
            } else {
                return Command::Invalid {
                    message: format!("Expected field=value, got: {}", arg),
                };
            }
        }

        match picker {
            Some(picker) => Command::Search {
                picker,
                filters,
                html,
            },
            None => Command::Invalid {
                message: "Usage: adebar-picker search <picker> [field=value ...] [--html]"
                    .to_string(),
            },
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r#"adebar-picker - entity picker for the adebar forms

Usage: adebar-picker [command]

Commands:
  (none), ui                               Start the form UI
  search <picker> [field=value ...] [--html]
                                           Search with a configured picker and print the rows
  help                                     Show this help

Examples:
  adebar-picker search participants firstname=Anna city=Berlin
  adebar-picker search counselors lastname=Meier --html

Environment:
  ADEBAR_BASE_URL, ADEBAR_CSRF_TOKEN, ADEBAR_SEARCH_TIMEOUT_SECS,
  ADEBAR_FORM_ACTION, ADEBAR_EVENT_ID, RUST_LOG"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_args_starts_ui() {
        assert_eq!(Command::parse(&[]), Command::Ui);
    }

    #[test]
    fn test_parse_search() {
        match Command::parse(&args(&["search", "participants", "firstname=Anna", "city=", "--html"])) {
            Command::Search {
                picker,
                filters,
                html,
            } => {
                assert_eq!(picker, "participants");
                assert_eq!(
                    filters,
                    vec![
                        ("firstname".to_string(), "Anna".to_string()),
                        ("city".to_string(), String::new()),
                    ]
                );
                assert!(html);
            }
            other => panic!("Expected Search command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_without_picker() {
        match Command::parse(&args(&["search", "city=Berlin"])) {
            Command::Invalid { message } => assert!(message.starts_with("Usage")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown() {
        match Command::parse(&args(&["launch"])) {
            Command::Invalid { message } => assert!(message.contains("launch")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(Command::parse(&args(&["-h"])), Command::Help);
    }
}

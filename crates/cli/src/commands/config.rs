use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use amica_core::config::{AppConfig, LoadOptions};
use toml::Value;

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: 2,
                output: format!("config validation failed: {error}"),
            }
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    let entries: Vec<(&str, &str, String)> = vec![
        ("llm.provider", "AMICA_LLM_PROVIDER", format!("{:?}", config.llm.provider)),
        ("llm.model", "AMICA_LLM_MODEL", config.llm.model.clone()),
        (
            "llm.base_url",
            "AMICA_LLM_BASE_URL",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        ),
        ("llm.api_key", "AMICA_LLM_API_KEY", api_key.to_string()),
        ("llm.timeout_secs", "AMICA_LLM_TIMEOUT_SECS", config.llm.timeout_secs.to_string()),
        (
            "services.reminder_parser_url",
            "AMICA_SERVICES_REMINDER_PARSER_URL",
            config.services.reminder_parser_url.clone(),
        ),
        (
            "services.ai_query_url",
            "AMICA_SERVICES_AI_QUERY_URL",
            config.services.ai_query_url.clone(),
        ),
        (
            "services.timeout_secs",
            "AMICA_SERVICES_TIMEOUT_SECS",
            config.services.timeout_secs.to_string(),
        ),
        ("logging.level", "AMICA_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "AMICA_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, value) in entries {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("amica.toml"), PathBuf::from("config/amica.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

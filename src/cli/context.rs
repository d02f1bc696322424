use std::sync::Arc;

use script_store::FileScriptStore;

use crate::cli::output::OutputFormat;
use crate::config::AppConfig;

pub struct CliContext {
    config: Arc<AppConfig>,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: AppConfig, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            output,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn store(&self) -> FileScriptStore {
        FileScriptStore::new(&self.config.store.path)
    }
}

use std::sync::Arc;

use crate::config::Config;
use crate::parser::{ParseError, ParserFactory, ParserManager};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ParserManager>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(manager: ParserManager, config: Config) -> Self {
        Self {
            manager: Arc::new(manager),
            config: Arc::new(config),
        }
    }

    /// Builds the parser registries from `config`.
    pub fn from_config(config: Config) -> Result<Self, ParseError> {
        let manager = ParserFactory::new(config.clone()).initialize()?;
        Ok(Self::new(manager, config))
    }
}

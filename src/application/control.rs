//! # Operator Control Surface
//!
//! Start/stop and config reload, triggered from outside the poll task (CLI,
//! HTTP console). The active flag is a plain atomic the poll loop reads on
//! every cycle without pausing; "stop" is a soft pause, not a shutdown.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::config::AppConfig;
use crate::domain::error::BotError;

pub struct BotControl {
    active: AtomicBool,
    canned: RwLock<Arc<HashMap<String, String>>>,
    config_path: PathBuf,
}

impl BotControl {
    pub fn new(config_path: PathBuf, canned: HashMap<String, String>) -> Self {
        Self {
            active: AtomicBool::new(true),
            canned: RwLock::new(Arc::new(normalize(canned))),
            config_path,
        }
    }

    /// Triggered by the operator console, not from within the poll task.
    #[allow(dead_code)]
    pub fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
        tracing::info!("bot resumed");
    }

    #[allow(dead_code)]
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        tracing::info!("bot paused");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Snapshot of the canned command table; cheap to clone per message.
    pub fn canned(&self) -> Arc<HashMap<String, String>> {
        self.canned
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Re-reads the config file and hot-swaps the canned command table.
    /// Credentials and the running long-poll session are left untouched.
    #[allow(dead_code)]
    pub fn reload(&self) -> Result<usize, BotError> {
        let config = AppConfig::load(&self.config_path)?;
        let table = Arc::new(normalize(config.commands));
        let count = table.len();
        *self
            .canned
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = table;
        tracing::info!(count, "canned command table reloaded");
        Ok(count)
    }
}

/// Classification lowercases inbound text, so the table keys must be
/// lowercase too.
fn normalize(commands: HashMap<String, String>) -> HashMap<String, String> {
    commands
        .into_iter()
        .map(|(label, reply)| (label.to_lowercase(), reply))
        .collect()
}

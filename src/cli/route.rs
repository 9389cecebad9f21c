//! CLI route: single route table and run context.

use crate::cli::parse::{Commands, FrameRegistration};
use crate::cli::presentation::{
    format_config_json, format_config_toml, format_deliveries_json, format_deliveries_text,
    Delivery,
};
use crate::config::{ConfigLoader, FrameMapConfig};
use crate::error::FrameMapError;
use crate::map::FrameIdMap;
use crate::resolver::FrameRegistry;
use crate::task::{OwnerThread, TaskPoster};
use crate::types::FrameKey;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

/// Runtime context for CLI execution: the effective configuration.
pub struct RunContext {
    config: FrameMapConfig,
}

impl RunContext {
    /// Load and validate configuration from the layered sources.
    pub fn new(config_path: Option<&Path>) -> Result<Self, FrameMapError> {
        let config = ConfigLoader::load(config_path)?;
        config.ensure_valid()?;
        Ok(Self { config })
    }

    pub fn from_config(config: FrameMapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrameMapConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, FrameMapError> {
        match command {
            Commands::Resolve {
                frames,
                seed,
                destroyed,
                keys,
                format,
            } => {
                // Reject the format before spawning the owning thread.
                let json = match format.as_str() {
                    "json" => true,
                    "text" => false,
                    other => {
                        return Err(FrameMapError::InvalidKey(format!(
                            "unknown output format '{}' (expected text or json)",
                            other
                        )))
                    }
                };
                let deliveries = self.resolve(frames, *seed, destroyed, keys)?;
                if json {
                    format_deliveries_json(&deliveries)
                } else {
                    Ok(format_deliveries_text(&deliveries))
                }
            }
            Commands::Config { format } => match format.as_str() {
                "toml" => format_config_toml(&self.config),
                "json" => format_config_json(&self.config),
                other => Err(FrameMapError::InvalidKey(format!(
                    "unknown output format '{}' (expected toml or json)",
                    other
                ))),
            },
        }
    }

    /// Run the requests through a map backed by a dedicated owning thread and
    /// report every callback in the order it fired.
    pub fn resolve(
        &self,
        frames: &[FrameRegistration],
        seed: bool,
        destroyed: &[FrameKey],
        keys: &[FrameKey],
    ) -> Result<Vec<Delivery>, FrameMapError> {
        let registry = Arc::new(FrameRegistry::new());
        let owner = Arc::new(OwnerThread::spawn(self.config.owner.thread_name.clone())?);
        let map = FrameIdMap::with_config(
            registry.clone(),
            owner.clone(),
            self.config.dispatch.clone(),
        );

        // Lifecycle events happen on the owning thread, ahead of any resolution task.
        let handle = map.owner_handle();
        let lifecycle_registry = Arc::clone(&registry);
        let frames = frames.to_vec();
        let destroyed = destroyed.to_vec();
        owner.post(Box::new(move || {
            for frame in &frames {
                lifecycle_registry.register(frame.key, frame.ids);
                if seed {
                    handle.seed(frame.key, frame.ids);
                }
            }
            for key in &destroyed {
                lifecycle_registry.unregister(*key);
                handle.invalidate(*key);
            }
        }))?;
        if seed {
            // Seeds must land before the first request to be observed synchronously.
            Self::wait_for_owner(&owner)?;
        }

        let deliveries = Rc::new(RefCell::new(Vec::new()));
        for (request, key) in keys.iter().copied().enumerate() {
            let in_call = Rc::new(Cell::new(true));
            let observed = Rc::clone(&in_call);
            let sink = Rc::clone(&deliveries);
            map.resolve_async(key, move |ids| {
                sink.borrow_mut().push(Delivery {
                    request,
                    key,
                    ids,
                    synchronous: observed.get(),
                });
            })?;
            in_call.set(false);
        }
        debug!(
            requests = keys.len(),
            outstanding = map.outstanding_resolutions(),
            "Requests issued"
        );

        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        runtime.block_on(async {
            while map.outstanding_resolutions() > 0 {
                map.wait_for_completions().await?;
            }
            Ok::<(), FrameMapError>(())
        })?;
        owner.shutdown()?;

        info!(
            deliveries = deliveries.borrow().len(),
            cached = map.cache_len(),
            "Resolution finished"
        );
        let result = deliveries.borrow().clone();
        Ok(result)
    }

    fn wait_for_owner(owner: &OwnerThread) -> Result<(), FrameMapError> {
        let (sender, receiver) = std::sync::mpsc::channel();
        owner.post(Box::new(move || {
            let _ = sender.send(());
        }))?;
        receiver.recv().map_err(|_| {
            FrameMapError::OwnerUnavailable(format!("owning thread '{}' stopped", owner.name()))
        })
    }
}

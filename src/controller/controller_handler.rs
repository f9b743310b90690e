use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::clinic::ClinicService;
use crate::configuration::config::Config;
use crate::configuration::types::StorageBackend;
use crate::error_handling::types::*;
use crate::session_management::SessionGate;
use crate::storage::file_storage::FileStorage;
use crate::storage::memory_storage::MemoryStorage;
use crate::storage::record_store::RecordStore;
use crate::storage::storage_trait::KeyValueStore;
use crate::web_interface::WebServer;

/// Wires storage, the session gate and the web interface together.
pub struct Controller {
    pub config: Config,
    service: ClinicService,
    web_server: WebServer,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing controller");
        config.validate()?;

        let backend = Self::open_backend(&config)?;
        let store = RecordStore::new(backend);
        let gate = SessionGate::restore(store.clone()).map_err(|e| {
            error!("Unable to restore the saved session: {}", e);
            ControllerError::InitializationFailed(format!("session restore: {}", e))
        })?;

        let service = ClinicService::new(store);
        let web_server = WebServer::new(service.clone(), gate, config.public_base_url());

        Ok(Self {
            config,
            service,
            web_server,
        })
    }

    fn open_backend(config: &Config) -> Result<Arc<dyn KeyValueStore>, ControllerError> {
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage, nothing will be persisted");
                Ok(Arc::new(MemoryStorage::new()))
            }
            StorageBackend::File => {
                let storage = match &config.storage_path {
                    Some(path) => {
                        debug!("Opening file storage at {}", path.display());
                        FileStorage::new(path)?
                    }
                    None => FileStorage::new_default()?,
                };
                Ok(Arc::new(storage))
            }
        }
    }

    pub fn service(&self) -> &ClinicService {
        &self.service
    }

    pub fn web_server(&self) -> &WebServer {
        &self.web_server
    }

    /// Serves the web interface until it fails or Ctrl-C is received.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        info!("Starting controller");
        let addr = SocketAddr::new(self.config.bind_ip()?, self.config.web_ui_port);

        let result = tokio::select! {
            served = self.web_server.start(addr) => served.map_err(ControllerError::from),
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Received Ctrl-C"),
                    Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
                }
                Ok(())
            }
        };

        info!("Shutting down");
        result
    }
}

use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use log::{error, info};
use tokio::sync::Mutex;
use warp::{Filter, Reply};

use super::routes::*;
use crate::clinic::ClinicService;
use crate::error_handling::types::WebError;
use crate::session_management::SessionGate;

/// Web server for the clinic HTTP API and home page
pub struct WebServer {
    service: ClinicService,
    gate: SharedGate,
    public_base_url: String,
}

impl WebServer {
    pub fn new(service: ClinicService, gate: SessionGate, public_base_url: String) -> Self {
        Self {
            service,
            gate: Arc::new(Mutex::new(gate)),
            public_base_url,
        }
    }

    /// Shared handle on the operator session.
    pub fn gate(&self) -> SharedGate {
        self.gate.clone()
    }

    /// Every route of the API, with JSON errors for rejections.
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        let service = self.service.clone();
        let gate = self.gate.clone();

        let pages = dashboard_route().or(assets_route());

        let session = login_route(gate.clone())
            .or(logout_route(gate.clone()))
            .or(session_route(gate.clone()));

        let admin = list_doctors_route(service.clone(), gate.clone())
            .or(add_doctor_route(service.clone(), gate.clone()))
            .or(delete_doctor_route(service.clone(), gate.clone()));

        let doctor = queue_route(service.clone(), gate.clone())
            .or(manual_entry_route(service.clone(), gate.clone()))
            .or(patient_detail_route(service.clone(), gate.clone()))
            .or(save_record_route(service.clone(), gate.clone()))
            .or(email_route(service.clone(), gate.clone()))
            .or(registration_url_route(gate, self.public_base_url.clone()));

        pages
            .or(session)
            .or(admin)
            .or(register_route(service.clone()))
            .or(doctor)
            .or(events_route(service.store().clone()))
            .recover(handle_rejection)
    }

    /// Serve until the future is dropped.
    pub async fn start(&self, addr: SocketAddr) -> Result<(), WebError> {
        // Probe first so a taken port is reported instead of panicking inside warp.
        let probe = TcpListener::bind(addr).map_err(|e| {
            error!("Unable to bind the web interface to {}: {}", addr, e);
            WebError::BindFailed(format!("{}: {}", addr, e))
        })?;
        drop(probe);

        info!("Web interface listening on http://{}", addr);
        info!(
            "Patient registration page: {}",
            crate::clinic::registration_url(&self.public_base_url)
        );
        warp::serve(self.routes()).run(addr).await;
        Ok(())
    }
}

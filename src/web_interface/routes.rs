use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use log::{debug, error, warn};
use rust_embed::RustEmbed;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use uuid::Uuid;
use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use super::types::{ApiError, DeleteResponse, EmailResponse, LoginRequest, RegistrationUrlResponse};
use crate::clinic::{
    registration_url, ClinicService, DoctorForm, ManualEntryForm, RecordForm, RegistrationForm,
};
use crate::error_handling::types::{AuthError, ClinicError};
use crate::session_management::SessionGate;
use crate::storage::events::StoreEvent;
use crate::storage::record_store::RecordStore;

/// The one operator session shared by every request.
pub type SharedGate = Arc<Mutex<SessionGate>>;

const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets"]
struct Assets;

/// Embedded static file and its content type.
pub fn asset(path: &str) -> Option<(Cow<'static, [u8]>, String)> {
    let file = Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Some((file.data, mime.to_string()))
}

/// HTTP status for a failed clinic operation.
pub fn status_for(err: &ClinicError) -> StatusCode {
    match err {
        ClinicError::Validation(_) | ClinicError::MissingEmail => StatusCode::BAD_REQUEST,
        ClinicError::Auth(AuthError::InvalidCredentials) | ClinicError::Auth(AuthError::NotLoggedIn) => {
            StatusCode::UNAUTHORIZED
        }
        ClinicError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
        ClinicError::PatientNotFound(_) | ClinicError::NoRecords(_) => StatusCode::NOT_FOUND,
        ClinicError::Storage(_) | ClinicError::Auth(AuthError::StorageError(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &ClinicError) -> reply::Response {
    let status = status_for(err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected with {}: {}", status, err);
    }
    reply::with_status(
        reply::json(&ApiError {
            message: err.to_string(),
        }),
        status,
    )
    .into_response()
}

fn respond<T: Serialize>(result: Result<T, ClinicError>, status: StatusCode) -> reply::Response {
    match result {
        Ok(value) => reply::with_status(reply::json(&value), status).into_response(),
        Err(err) => error_response(&err),
    }
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Store events as they are published. Ends when the store is dropped.
///
/// A subscriber that falls behind skips the missed events; each event only
/// says which collection to reload, so the next one brings it up to date.
pub fn store_event_stream(rx: broadcast::Receiver<StoreEvent>) -> impl Stream<Item = StoreEvent> {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((event, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).map(|| match asset("index.html") {
        Some((data, _)) => reply::html(String::from_utf8_lossy(&data).into_owned()).into_response(),
        None => reply::with_status("Clinic Desk is running", StatusCode::OK).into_response(),
    })
}

/// GET /assets/<file>
pub fn assets_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("assets")
        .and(warp::path::tail())
        .and(warp::get())
        .and_then(|tail: warp::path::Tail| async move {
            match asset(tail.as_str()) {
                Some((data, mime)) => Ok::<_, Rejection>(
                    reply::with_header(data.into_owned(), "Content-Type", mime).into_response(),
                ),
                None => Err(warp::reject::not_found()),
            }
        })
}

/// POST /login
pub fn login_route(gate: SharedGate) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and_then(move |request: LoginRequest| {
            let gate = gate.clone();
            async move {
                let mut gate = gate.lock().await;
                let result = gate
                    .login(&request.username, &request.password)
                    .map_err(ClinicError::from);
                Ok::<_, Rejection>(respond(result, StatusCode::OK))
            }
        })
}

/// POST /logout
pub fn logout_route(gate: SharedGate) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("logout")
        .and(warp::path::end())
        .and(warp::post())
        .and_then(move || {
            let gate = gate.clone();
            async move {
                let mut gate = gate.lock().await;
                let result = gate.logout().map_err(ClinicError::from);
                Ok::<_, Rejection>(match result {
                    Ok(()) => reply::with_status(reply::reply(), StatusCode::NO_CONTENT).into_response(),
                    Err(err) => error_response(&err),
                })
            }
        })
}

/// GET /session, `null` when logged out
pub fn session_route(gate: SharedGate) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("session")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(reply::json(&gate.current()))
            }
        })
}

/// GET /admin/doctors
pub fn list_doctors_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "doctors")
        .and(warp::get())
        .and_then(move || {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(respond(service.list_doctors(&gate), StatusCode::OK))
            }
        })
}

/// POST /admin/doctors
pub fn add_doctor_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "doctors")
        .and(warp::post())
        .and(json_body())
        .and_then(move |form: DoctorForm| {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(respond(service.add_doctor(&gate, form), StatusCode::CREATED))
            }
        })
}

/// DELETE /admin/doctors/:id
pub fn delete_doctor_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "doctors" / Uuid)
        .and(warp::delete())
        .and_then(move |id: Uuid| {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                let result = service
                    .delete_doctor(&gate, id)
                    .map(|removed| DeleteResponse { removed });
                Ok::<_, Rejection>(respond(result, StatusCode::OK))
            }
        })
}

/// POST /patient/register
pub fn register_route(service: ClinicService) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("patient" / "register")
        .and(warp::post())
        .and(json_body())
        .and_then(move |form: RegistrationForm| {
            let service = service.clone();
            async move {
                Ok::<_, Rejection>(respond(service.register_patient(form), StatusCode::CREATED))
            }
        })
}

/// GET /doctor/queue
pub fn queue_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("doctor" / "queue")
        .and(warp::get())
        .and_then(move || {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(respond(service.queue(&gate), StatusCode::OK))
            }
        })
}

/// POST /doctor/patients
pub fn manual_entry_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("doctor" / "patients")
        .and(warp::post())
        .and(json_body())
        .and_then(move |form: ManualEntryForm| {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(respond(
                    service.add_patient_manually(&gate, form),
                    StatusCode::CREATED,
                ))
            }
        })
}

/// GET /doctor/patients/:id
pub fn patient_detail_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("doctor" / "patients" / Uuid)
        .and(warp::get())
        .and_then(move |id: Uuid| {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(respond(service.patient_detail(&gate, id), StatusCode::OK))
            }
        })
}

/// POST /doctor/patients/:id/records
pub fn save_record_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("doctor" / "patients" / Uuid / "records")
        .and(warp::post())
        .and(json_body())
        .and_then(move |id: Uuid, form: RecordForm| {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                Ok::<_, Rejection>(respond(
                    service.save_medical_record(&gate, id, form),
                    StatusCode::CREATED,
                ))
            }
        })
}

/// GET /doctor/patients/:id/email
pub fn email_route(
    service: ClinicService,
    gate: SharedGate,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("doctor" / "patients" / Uuid / "email")
        .and(warp::get())
        .and_then(move |id: Uuid| {
            let service = service.clone();
            let gate = gate.clone();
            async move {
                let gate = gate.lock().await;
                let result = service.email_draft(&gate, id).map(EmailResponse::from);
                Ok::<_, Rejection>(respond(result, StatusCode::OK))
            }
        })
}

/// GET /doctor/registration-url
pub fn registration_url_route(
    gate: SharedGate,
    public_base_url: String,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("doctor" / "registration-url")
        .and(warp::get())
        .and_then(move || {
            let gate = gate.clone();
            let url = registration_url(&public_base_url);
            async move {
                let gate = gate.lock().await;
                let result = gate
                    .require_doctor()
                    .map(|_| RegistrationUrlResponse { url })
                    .map_err(ClinicError::from);
                Ok::<_, Rejection>(respond(result, StatusCode::OK))
            }
        })
}

/// GET /events (server-sent events, one per store write)
pub fn events_route(store: RecordStore) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("events")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            let events = store_event_stream(store.subscribe()).map(|event| {
                Ok::<_, Infallible>(
                    warp::sse::Event::default()
                        .event(event.name())
                        .data(event.name()),
                )
            });
            warp::sse::reply(warp::sse::keep_alive().stream(events))
        })
}

/// Turns unmatched routes and malformed bodies into JSON errors.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
    };
    Ok(reply::with_status(reply::json(&ApiError { message }), status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::types::{StorageError, ValidationError};
    use crate::storage::memory_storage::MemoryStorage;
    use crate::storage::types::NewDoctor;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ClinicError::Validation(ValidationError::MissingFields(vec!["name"]))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(&AuthError::Forbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(&ClinicError::PatientNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&StorageError::WriteFailed.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_index_is_embedded() {
        let (data, mime) = asset("index.html").unwrap();
        assert_eq!(mime, "text/html");
        assert!(String::from_utf8_lossy(&data).contains("Clinic Desk"));
        assert!(asset("missing.html").is_none());
    }

    #[tokio::test]
    async fn test_event_stream_follows_writes() {
        let store = RecordStore::new(Arc::new(MemoryStorage::new()));
        let mut events = Box::pin(store_event_stream(store.subscribe()));
        store
            .add_doctor(NewDoctor {
                name: "Dr. N".into(),
                username: "n".into(),
                password: "p".into(),
                specialty: None,
            })
            .unwrap();
        assert_eq!(events.next().await, Some(StoreEvent::DoctorsChanged));

        drop(store);
        assert_eq!(events.next().await, None);
    }
}

//! The enrollment HTTP server
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::{
    config::Config,
    crypto::{AnchorClassifier, CertificateAuthority, Pkcs7Backend},
    decoder::{self, EnrollmentRequest},
    eligibility::EligibilityGate,
    envelope::EnvelopeVerifier,
    error::EnrollmentError,
    phase::{Endpoint, PhaseDisambiguator},
    profile::{ProfileService, StaticProfileService},
    response::{self, Outcome},
};
use actix_web::{
    dev::Server, http::Method, middleware, web, App, HttpRequest, HttpResponse, HttpServer,
};
use log::{info, warn};
use std::sync::Arc;

pub const ENROLL_PATH: &str = "/mdm/enroll";
pub const OTA_ENROLL_PATH: &str = "/ota/enroll";
/// Phases 2 and 3 of OTA enrollment are both POSTed here.
pub const OTA_PHASE2_PHASE3_PATH: &str = "/ota/phase23";

/// Everything a request handler needs.  Built once and shared read-only
/// between workers.
pub struct EnrollmentState {
    disambiguator: PhaseDisambiguator,
    gate: Option<EligibilityGate>,
    profiles: Arc<dyn ProfileService>,
}

impl EnrollmentState {
    pub fn new(
        disambiguator: PhaseDisambiguator,
        gate: Option<EligibilityGate>,
        profiles: Arc<dyn ProfileService>,
    ) -> Self {
        EnrollmentState {
            disambiguator,
            gate,
            profiles,
        }
    }

    /// Load trust anchors and profiles named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, EnrollmentError> {
        let device_authority =
            CertificateAuthority::from_pem_files(&config.device_ca_certificates)?;
        let enrollment_authority = if config.enrollment_ca_certificates.is_empty() {
            None
        } else {
            Some(CertificateAuthority::from_pem_files(
                &config.enrollment_ca_certificates,
            )?)
        };
        let disambiguator = PhaseDisambiguator::new(
            EnvelopeVerifier::new(Arc::new(Pkcs7Backend::new())),
            Arc::new(AnchorClassifier::new(device_authority, enrollment_authority)),
        );
        let gate = config
            .minimum_build_version
            .as_deref()
            .map(EligibilityGate::new)
            .transpose()?;
        let profiles = Arc::new(StaticProfileService::from_config(config)?);
        Ok(EnrollmentState::new(disambiguator, gate, profiles))
    }

    /// Run one request through verification, classification, decoding and
    /// the eligibility gate, and return the profile to send back.
    pub fn handle(
        &self,
        endpoint: Endpoint,
        method: &Method,
        body: &[u8],
    ) -> Result<Vec<u8>, EnrollmentError> {
        let classified = self.disambiguator.classify_request(endpoint, method, body)?;
        let request = decoder::decode_classified(classified)?;
        if let (EnrollmentRequest::Dep(dep), Some(gate)) = (&request, &self.gate) {
            gate.check(&dep.os_version, &dep.version)?;
        }
        self.profiles.profile_for(&request)
    }
}

fn respond(
    state: &EnrollmentState,
    endpoint: Endpoint,
    method: &Method,
    body: &[u8],
) -> Result<HttpResponse, EnrollmentError> {
    let profile = state.handle(endpoint, method, body).map_err(|err| {
        warn!("enrollment-server::server {:?} request failed:{}", endpoint, err);
        err
    })?;
    Ok(response::encode(Outcome::Profile(&profile)).into_http_response())
}

async fn enroll(
    request: HttpRequest,
    body: web::Bytes,
    state: web::Data<EnrollmentState>,
) -> Result<HttpResponse, EnrollmentError> {
    respond(&state, Endpoint::Enroll, request.method(), &body)
}

async fn ota_enroll(
    request: HttpRequest,
    state: web::Data<EnrollmentState>,
) -> Result<HttpResponse, EnrollmentError> {
    respond(&state, Endpoint::OtaEnroll, request.method(), &[])
}

async fn ota_phase2_phase3(
    request: HttpRequest,
    body: web::Bytes,
    state: web::Data<EnrollmentState>,
) -> Result<HttpResponse, EnrollmentError> {
    respond(&state, Endpoint::OtaPhase2Phase3, request.method(), &body)
}

/// Register the enrollment routes.  The enrollment endpoint accepts every
/// method so that anything but GET and POST gets a proper rejection.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.route(ENROLL_PATH, web::route().to(enroll))
        .route(OTA_ENROLL_PATH, web::get().to(ota_enroll))
        .route(OTA_PHASE2_PHASE3_PATH, web::post().to(ota_phase2_phase3));
}

pub fn server(config: &Config) -> Result<Server, EnrollmentError> {
    let state = web::Data::new(EnrollmentState::from_config(config)?);
    info!("enrollment-server::server binding to {}", config.listen_address);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(app_config)
    })
    .bind(&config.listen_address)?
    .run();
    Ok(server)
}

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{self, SecurityConfig};
use crate::database::Database;
use crate::handlers::{accounts, crud, entreprise, equipment, staff, system, transport};
use crate::middleware::session_middleware;
use crate::resources;

/// Shared by every handler. The database is the only state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

pub fn app(state: AppState) -> Router {
    let config = config::config();

    let api = Router::new()
        // Public session routes
        .route("/logIn", post(accounts::log_in))
        .route("/logOut", post(accounts::log_out))
        .route("/signUp", post(entreprise::sign_up))
        .merge(protected_routes().route_layer(from_fn(session_middleware)));

    let mut router = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }

    router.with_state(state)
}

fn protected_routes() -> Router<AppState> {
    let mut router = Router::new()
        // Accounts
        .route("/addAccount", post(accounts::add_account))
        .route("/updateAccount", put(accounts::update_account))
        .route("/deleteAccount", delete(accounts::delete_account))
        .route("/getAccounts", get(accounts::get_accounts))
        // Entreprise
        .route("/addEntreprise", post(entreprise::add_entreprise))
        .route("/updateEntreprise", put(entreprise::update_entreprise))
        .route("/deleteEntreprise", delete(entreprise::delete_entreprise))
        .route("/getAllEntreprises", get(entreprise::get_all_entreprises))
        // Staff
        .route("/getAllStaff", get(staff::get_all_staff))
        .route("/updateStaff", put(staff::update_staff))
        // Transport
        .route("/addTransport", post(transport::add_transport))
        .route("/deleteTransport", delete(transport::delete_transport))
        .route("/addStaffToTransport", post(transport::add_staff_to_transport))
        .route(
            "/removeStaffFromTransport/:staff_id/:transport_id",
            delete(transport::remove_staff_from_transport),
        )
        .route("/addCarToTransport", post(transport::add_car_to_transport))
        .route("/removeCarFromTransport", delete(transport::remove_car_from_transport))
        // Equipment
        .route("/addEquipment", post(equipment::add_equipment))
        .route("/updateEquipment", put(equipment::update_equipment))
        .route("/deleteEquipment", delete(equipment::delete_equipment))
        .route("/getAllEquipment", get(equipment::get_all_equipment))
        .route("/getAvailableEquipment", get(equipment::get_available_equipment))
        .route("/getCategories", get(equipment::get_categories))
        .route("/getEventEquipment/:ID", get(equipment::get_event_equipment))
        .route("/reserveEquipment", post(equipment::reserve_equipment))
        .route("/unreserveEquipment", post(equipment::unreserve_equipment))
        .route("/addEquipmentToEvent", post(equipment::add_equipment_to_event))
        .route(
            "/removeEquipmentToEvent/:ID_equipment/:ID_event",
            delete(equipment::remove_equipment_from_event),
        )
        .route("/getReservedEquipmentForEvent/:ID", get(equipment::get_reserved_equipment_for_event))
        .route("/getAvailableEquipmentForEvent", get(equipment::get_available_equipment_for_event))
        .route("/getAvailableAgencyEquipment", get(equipment::get_available_agency_equipment))
        .route(
            "/getAvailabeEventEquipment/:start_date/:end_date",
            get(equipment::get_available_event_equipment),
        )
        .route("/getEquipmentUse/:timestamp", get(equipment::get_equipment_use))
        .route("/getcategoryUse/:timestamp", get(equipment::get_category_use))
        .route("/getHistoryEquipment/:timestamp", get(equipment::get_history_equipment));

    for resource in resources::all() {
        router = router.merge(crud::routes(resource));
    }
    router
}

/// The session travels in a cookie, so origins have to be explicit for
/// credentials to be allowed.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

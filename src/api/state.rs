use crate::{api::security::JwtSecurityService, dao::store::ConfiguredStore, service::analytics::AnalyticsService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * Bearer token validation.
     */
    pub jwt_service: JwtSecurityService,
    /**
     * Dashboard aggregations over the configured document store.
     */
    pub analytics_service: AnalyticsService<ConfiguredStore>,
}

impl AppState {
    pub fn new(jwt_service: JwtSecurityService, analytics_service: AnalyticsService<ConfiguredStore>) -> Self {
        AppState { jwt_service, analytics_service }
    }
}

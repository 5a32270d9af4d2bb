use crate::config::AppConfig;
use crate::llm::LlmManager;
use crate::schema::EmployeeSchema;
use crate::session::SessionStore;
use crate::store::EmployeeStore;
use std::sync::Arc;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub schema: Arc<EmployeeSchema>,
    pub llm_manager: LlmManager,
    pub store: Arc<dyn EmployeeStore>,
    pub sessions: SessionStore,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, llm_manager: LlmManager, store: Arc<dyn EmployeeStore>) -> Self {
        let schema = Arc::new(config.schema.clone());
        let sessions = SessionStore::new(&config.session);

        Self {
            config,
            schema,
            llm_manager,
            store,
            sessions,
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.startup_time)
            .num_seconds()
    }
}

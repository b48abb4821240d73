use crate::access::IpAllowList;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use harvest::{IntakeOrchestrator, SizeRulebook};
use metrics_exporter_prometheus::PrometheusHandle;
use rulebook::VarietyCatalog;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Intake pipeline (shared across requests)
    pub intake: Arc<IntakeOrchestrator>,

    /// Who may submit
    pub allow_list: IpAllowList,

    /// Size table and variety catalog backing the form options endpoint
    pub rules: SizeRulebook,
    pub catalog: VarietyCatalog,

    /// Prometheus render handle, present once a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state, opening the configured stores.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let intake_config = config
            .intake_config()
            .map_err(|err| ServerError::Config(err.to_string()))?;
        let intake = IntakeOrchestrator::from_config(&intake_config)
            .map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self::with_intake(config, intake))
    }

    /// State over an already-built orchestrator.
    pub fn with_intake(config: ServerConfig, intake: IntakeOrchestrator) -> Self {
        let allow_list = IpAllowList::new(&config.allowed_ips);
        let rules = *intake.normalizer().rules();
        Self {
            config: Arc::new(config),
            intake: Arc::new(intake),
            allow_list,
            rules,
            catalog: VarietyCatalog::standard(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

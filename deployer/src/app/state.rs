//! Application state shared by the steps

use std::sync::Arc;

use crate::app::options::CliArgs;
use crate::azure::cli::AzCli;
use crate::process::runner::{CommandRunner, SystemRunner};
use crate::runtime::docker::DockerCli;
use crate::runtime::ContainerRuntime;
use crate::storage::layout::StorageLayout;
use crate::storage::session::Session;
use crate::storage::settings::Settings;

/// Everything a step needs: configuration, session and external tools
pub struct AppState {
    pub layout: StorageLayout,
    pub settings: Settings,
    pub session: Session,
    pub args: CliArgs,
    pub az: AzCli,
    pub runtime: Arc<dyn ContainerRuntime>,
}

impl AppState {
    /// State backed by the real `az` and `docker` binaries
    pub fn new(layout: StorageLayout, settings: Settings, session: Session, args: CliArgs) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let az = AzCli::new(settings.tools.az.clone(), runner.clone());
        let runtime = Arc::new(DockerCli::new(settings.tools.docker.clone(), runner));
        Self::with_backends(layout, settings, session, args, az, runtime)
    }

    /// State with injected backends
    pub fn with_backends(
        layout: StorageLayout,
        settings: Settings,
        session: Session,
        args: CliArgs,
        az: AzCli,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            layout,
            settings,
            session,
            args,
            az,
            runtime,
        }
    }
}

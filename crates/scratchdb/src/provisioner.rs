mod instance;
pub use instance::InstanceState;
use instance::ProvisionedInstance;

use crate::{Connect, Database, ScratchName, ServiceFactory};
use scratchdb_core::{
    driver::ScratchOptions, BackendConfig, Driver, Error, ProvisionPhase, Result,
    TeardownFailure, TeardownPhase,
};

use std::sync::Arc;

/// Creates one scratch database per configured backend and tears them all
/// down again.
///
/// Every backend gets a database with the same [`ScratchName`]. Setup runs the
/// backends one after the other, in configuration order, and stops at the
/// first failure. Instances set up before the failure stay alive; call
/// [`Provisioner::teardown`] to remove them.
pub struct Provisioner<S> {
    driver: Arc<dyn Driver>,
    factory: Box<dyn ServiceFactory<S>>,
    backends: Vec<Backend>,
    name: ScratchName,

    /// Instances whose scratch database was created, in configuration order.
    instances: Vec<ProvisionedInstance<S>>,

    /// Set by the first `setup` or `teardown`.
    started: bool,
}

#[derive(Debug)]
struct Backend {
    config: BackendConfig,

    /// Resolved at construction
    system_database: String,
}

#[derive(Debug, Default)]
pub struct Builder {
    configs: Vec<BackendConfig>,
    driver: Option<Arc<dyn Driver>>,
    scratch_name: Option<ScratchName>,
}

impl Builder {
    /// Adds a backend. Backends are provisioned in the order they are added.
    pub fn backend(&mut self, config: BackendConfig) -> &mut Self {
        self.configs.push(config);
        self
    }

    pub fn backends(&mut self, configs: impl IntoIterator<Item = BackendConfig>) -> &mut Self {
        self.configs.extend(configs);
        self
    }

    /// Replaces the built-in [`Connect`] driver, for engines without a
    /// built-in driver.
    pub fn driver(&mut self, driver: impl Driver) -> &mut Self {
        self.driver = Some(Arc::new(driver));
        self
    }

    /// Uses a fixed scratch database name instead of generating one.
    pub fn scratch_name(&mut self, name: ScratchName) -> &mut Self {
        self.scratch_name = Some(name);
        self
    }

    pub fn build<S>(&mut self, factory: impl ServiceFactory<S> + 'static) -> Result<Provisioner<S>> {
        let backends = self
            .configs
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let system_database = config
                    .resolve_system_database()
                    .map_err(|err| {
                        err.context(Error::config(format!(
                            "backend #{index} ({})",
                            config.engine
                        )))
                    })?
                    .to_string();

                Ok(Backend {
                    config: config.clone(),
                    system_database,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let driver = self
            .driver
            .clone()
            .unwrap_or_else(|| Arc::new(Connect));

        let name = self
            .scratch_name
            .clone()
            .unwrap_or_else(ScratchName::generate);

        tracing::debug!(%name, backends = backends.len(), "provisioner created");

        Ok(Provisioner {
            driver,
            factory: Box::new(factory),
            backends,
            name,
            instances: vec![],
            started: false,
        })
    }
}

impl Provisioner<()> {
    /// Starts configuring a provisioner. The service type is picked by
    /// [`Builder::build`].
    pub fn builder() -> Builder {
        Builder::default()
    }
}

impl<S: Send + 'static> Provisioner<S> {
    /// Creates a provisioner for `configs` using the built-in drivers.
    ///
    /// Fails with a configuration error when a backend's system database
    /// cannot be resolved.
    pub fn new(
        factory: impl ServiceFactory<S> + 'static,
        configs: impl IntoIterator<Item = BackendConfig>,
    ) -> Result<Self> {
        Builder::default().backends(configs).build(factory)
    }

    /// Name shared by every scratch database of this provisioner.
    ///
    /// Useful for removing orphaned databases by hand after a failed
    /// teardown.
    pub fn scratch_name(&self) -> &ScratchName {
        &self.name
    }

    /// Services of the instances that reached [`InstanceState::Ready`], in
    /// configuration order.
    ///
    /// Services stay available after teardown, but their databases are gone.
    pub fn storage_services(&self) -> Vec<&S> {
        self.instances
            .iter()
            .filter_map(|instance| instance.service.as_ref())
            .collect()
    }

    /// Scratch database handles of the instances that reached
    /// [`InstanceState::Ready`], in configuration order.
    pub fn databases(&self) -> Vec<&Database> {
        self.instances
            .iter()
            .filter(|instance| instance.service.is_some())
            .filter_map(|instance| instance.database.as_ref())
            .collect()
    }

    /// State of every instance whose scratch database was created.
    pub fn states(&self) -> Vec<InstanceState> {
        self.instances.iter().map(|instance| instance.state()).collect()
    }

    /// Provisions every backend, in configuration order.
    ///
    /// A provisioner can only be set up once. On failure the returned error
    /// is a provision error naming the backend and the step that failed.
    pub async fn setup(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::invalid_lifecycle(
                "setup can only run once per provisioner",
            ));
        }
        self.started = true;

        tracing::info!(name = %self.name, backends = self.backends.len(), "setting up scratch databases");

        for index in 0..self.backends.len() {
            self.setup_backend(index).await?;
        }

        Ok(())
    }

    async fn setup_backend(&mut self, index: usize) -> Result<()> {
        let backend = &self.backends[index];
        let config = &backend.config;
        let name = self.name.as_str();
        let provision = |phase| move |err: Error| err.context(Error::provision(index, phase));

        let mut instance = ProvisionedInstance::new(index);

        let mut admin = self
            .driver
            .connect(config, &backend.system_database)
            .await
            .map_err(provision(ProvisionPhase::AdminConnect))?;
        instance.advance(InstanceState::AdminOpen)?;

        if let Err(err) = admin.create_database(name).await {
            if let Err(close_err) = admin.close().await {
                tracing::warn!(index, error = %close_err, "failed to close system database connection");
            }
            return Err(provision(ProvisionPhase::Create)(err));
        }
        instance.advance(InstanceState::ScratchCreated)?;

        tracing::info!(index, engine = %config.engine, database = name, "created scratch database");

        // From here on, teardown owns dropping the database
        let slot = self.instances.len();
        self.instances.push(instance);
        let instance = &mut self.instances[slot];

        admin
            .close()
            .await
            .map_err(provision(ProvisionPhase::AdminClose))?;

        let options = ScratchOptions::for_config(config);
        let connection = self
            .driver
            .connect_scratch(config, name, &options)
            .await
            .map_err(provision(ProvisionPhase::Migrate))?;

        let database = Database::new(name, config.engine, config.entities.clone(), connection);
        instance.database = Some(database.clone());
        instance.advance(InstanceState::Migrated)?;

        let service = self
            .factory
            .build(database, config)
            .await
            .map_err(provision(ProvisionPhase::Service))?;

        instance.service = Some(service);
        instance.advance(InstanceState::Ready)
    }

    /// Closes every scratch connection and drops every scratch database.
    ///
    /// A failure on one instance never stops the others from being torn
    /// down. Every failed step is logged and collected into the returned
    /// teardown error. Instances whose database could not be dropped are
    /// retried by the next call.
    pub async fn teardown(&mut self) -> Result<()> {
        self.started = true;

        let mut failures = vec![];

        for instance in &mut self.instances {
            if instance.state().is_dropped() {
                continue;
            }

            let backend = &self.backends[instance.index()];
            teardown_instance(
                &*self.driver,
                backend,
                self.name.as_str(),
                instance,
                &mut failures,
            )
            .await;
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::teardown(failures))
        }
    }
}

async fn teardown_instance<S>(
    driver: &dyn Driver,
    backend: &Backend,
    name: &str,
    instance: &mut ProvisionedInstance<S>,
    failures: &mut Vec<TeardownFailure>,
) {
    let index = instance.index();
    let mut record = |phase: TeardownPhase, error: Error| {
        tracing::warn!(index, %phase, %error, "teardown step failed");
        failures.push(TeardownFailure::new(index, phase, error));
    };

    if let Err(err) = instance.advance(InstanceState::ScratchClosing) {
        record(TeardownPhase::ScratchClose, err);
        return;
    }

    if let Some(database) = &instance.database {
        if let Err(err) = database.close().await {
            record(TeardownPhase::ScratchClose, err);
        }
    }

    let mut admin = match driver.connect(&backend.config, &backend.system_database).await {
        Ok(admin) => admin,
        Err(err) => {
            record(TeardownPhase::AdminConnect, err);
            return;
        }
    };

    if let Err(err) = instance.advance(InstanceState::AdminReopened) {
        record(TeardownPhase::AdminConnect, err);
    } else {
        match admin.drop_database(name).await {
            Ok(()) => {
                tracing::info!(index, database = name, "dropped scratch database");
                if let Err(err) = instance.advance(InstanceState::Dropped) {
                    record(TeardownPhase::Drop, err);
                }
            }
            Err(err) => record(TeardownPhase::Drop, err),
        }
    }

    if let Err(err) = admin.close().await {
        record(TeardownPhase::AdminClose, err);
    }
}

impl<S> Drop for Provisioner<S> {
    fn drop(&mut self) {
        let remaining = self
            .instances
            .iter()
            .filter(|instance| !instance.state().is_dropped())
            .count();

        if remaining > 0 {
            tracing::warn!(
                name = %self.name,
                remaining,
                "provisioner dropped before its scratch databases were torn down"
            );
        }
    }
}

impl<S> core::fmt::Debug for Provisioner<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Provisioner")
            .field("driver", &self.driver)
            .field("name", &self.name)
            .field("backends", &self.backends)
            .field("states", &self.instances.iter().map(|i| i.state()).collect::<Vec<_>>())
            .finish()
    }
}

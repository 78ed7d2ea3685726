//! Planning and applying declared resources against persisted state

use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::data::ResourceData;
use crate::error::{CloudError, Result};
use crate::provider::{CloudProvider, ResourceConfig, ResourceSet, parse_address};
use crate::state::{GlobalState, ResourceState, ResourceStatus, StateManager};
use serde_json::{Map, Value};
use std::time::Instant;

/// Computes and executes plans for one provider
pub struct Planner<'a, P: CloudProvider> {
    provider: &'a P,
}

impl<'a, P: CloudProvider> Planner<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    fn stored(&self, resource_type: &str, stored: &ResourceState) -> Result<ResourceData> {
        let schema = self.provider.resource_schema(resource_type)?;
        Ok(
            ResourceData::from_state(schema, stored.id.clone(), stored.attributes.clone())
                .with_timeouts(self.provider.timeouts()),
        )
    }

    /// Declared configuration with schema defaults filled in
    fn desired(&self, resource: &ResourceConfig) -> Result<Map<String, Value>> {
        let schema = self.provider.resource_schema(&resource.resource_type)?;
        let mut config = resource.config.clone();
        schema.apply_defaults(&mut config);
        Ok(config)
    }

    /// Re-reads every stored resource. Resources deleted outside of the
    /// host are dropped from the state; their addresses are returned.
    pub async fn refresh_state(&self, state: &mut GlobalState) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        let addresses: Vec<String> = state.resources.keys().cloned().collect();

        for address in addresses {
            let Some(stored) = state.get_resource(&address).cloned() else {
                continue;
            };
            let mut d = self.stored(&stored.resource_type, &stored)?;

            let alive = self.provider.exists(&stored.resource_type, &mut d).await?
                && self.provider.refresh(&stored.resource_type, &mut d).await?;

            if alive {
                let status = match stored.status {
                    ResourceStatus::Tainted => ResourceStatus::Tainted,
                    _ => ResourceStatus::Ready,
                };
                state.set_resource(
                    address,
                    ResourceState {
                        id: d.id().to_string(),
                        status,
                        attributes: d.into_attributes(),
                        updated_at: chrono::Utc::now(),
                        ..stored
                    },
                );
            } else {
                tracing::info!(address = %address, "resource vanished, removing from state");
                state.remove_resource(&address);
                removed.push(address);
            }
        }

        Ok(removed)
    }

    /// Validates every declared resource and diffs it against the state
    pub fn plan(&self, desired: &ResourceSet, state: &GlobalState) -> Result<Plan> {
        let mut actions = Vec::new();

        for resource in desired.iter() {
            let address = resource.address();
            let config = self.desired(resource)?;
            self.provider
                .validate(&resource.resource_type, &config)
                .map_err(|e| match e {
                    CloudError::Validation(msg) => {
                        CloudError::Validation(format!("{}: {}", address, msg))
                    }
                    other => other,
                })?;

            let Some(stored) = state.get_resource(&address) else {
                actions.push(Action::new(
                    ActionType::Create,
                    &resource.resource_type,
                    &address,
                    "",
                ));
                continue;
            };

            if stored.status == ResourceStatus::Tainted {
                actions.push(Action::new(
                    ActionType::Replace,
                    &resource.resource_type,
                    &address,
                    &stored.id,
                ));
                continue;
            }

            let schema = self.provider.resource_schema(&resource.resource_type)?;
            let replace = schema.replacement_keys(&stored.attributes, &config);
            let changed = schema.changed_keys(&stored.attributes, &config);

            let action = if !replace.is_empty() {
                Action::new(ActionType::Replace, &resource.resource_type, &address, &stored.id)
                    .with_changed(replace)
            } else if !changed.is_empty() {
                Action::new(ActionType::Update, &resource.resource_type, &address, &stored.id)
                    .with_changed(changed)
            } else {
                Action::new(ActionType::NoOp, &resource.resource_type, &address, &stored.id)
            };
            actions.push(action);
        }

        for (address, stored) in &state.resources {
            if desired.get(address).is_none() {
                actions.push(Action::new(
                    ActionType::Delete,
                    &stored.resource_type,
                    address,
                    &stored.id,
                ));
            }
        }

        Ok(Plan::new(actions))
    }

    /// Plan deleting every stored resource
    pub fn destroy_plan(&self, state: &GlobalState) -> Plan {
        Plan::new(
            state
                .resources
                .iter()
                .map(|(address, stored)| {
                    Action::new(ActionType::Delete, &stored.resource_type, address, &stored.id)
                })
                .collect(),
        )
    }

    /// Executes the plan action by action. A failed action is recorded and
    /// the remaining actions still run; the state is saved after each one.
    pub async fn apply(
        &self,
        plan: &Plan,
        desired: &ResourceSet,
        state: &mut GlobalState,
        store: &StateManager,
    ) -> Result<ApplyResult> {
        let started = Instant::now();
        let mut result = ApplyResult::new();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                continue;
            }

            tracing::info!(address = %action.address, action = %action.action_type, "applying");
            match self.apply_action(action, desired, state).await {
                Ok(()) => result.add_success(action.id.clone(), action.description.clone()),
                Err(e) => {
                    tracing::error!(address = %action.address, error = %e, "action failed");
                    result.add_failure(action.id.clone(), format!("{}: {}", action.address, e));
                }
            }
            store.save(state).await?;
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn apply_action(
        &self,
        action: &Action,
        desired: &ResourceSet,
        state: &mut GlobalState,
    ) -> Result<()> {
        let resource_type = action.resource_type.as_str();
        let declared = || {
            desired.get(&action.address).ok_or_else(|| {
                CloudError::StateError(format!("{} is not declared", action.address))
            })
        };

        match action.action_type {
            ActionType::NoOp => Ok(()),
            ActionType::Create => self.create(resource_type, declared()?, state).await,
            ActionType::Update => {
                let resource = declared()?;
                let stored = self.stored_state(state, &action.address)?;
                let schema = self.provider.resource_schema(resource_type)?;
                let mut d = ResourceData::planned(
                    schema,
                    stored.id.clone(),
                    stored.attributes.clone(),
                    self.desired(resource)?,
                )
                .with_timeouts(self.provider.timeouts());

                self.provider.update(resource_type, &mut d).await?;
                state.set_resource(
                    action.address.clone(),
                    ResourceState {
                        attributes: d.into_attributes(),
                        status: ResourceStatus::Ready,
                        updated_at: chrono::Utc::now(),
                        ..stored
                    },
                );
                Ok(())
            }
            ActionType::Replace => {
                let resource = declared()?;
                self.delete(resource_type, &action.address, state).await?;
                self.create(resource_type, resource, state).await
            }
            ActionType::Delete => self.delete(resource_type, &action.address, state).await,
        }
    }

    fn stored_state(&self, state: &GlobalState, address: &str) -> Result<ResourceState> {
        state
            .get_resource(address)
            .cloned()
            .ok_or_else(|| CloudError::StateError(format!("{} is not in state", address)))
    }

    async fn create(
        &self,
        resource_type: &str,
        resource: &ResourceConfig,
        state: &mut GlobalState,
    ) -> Result<()> {
        let schema = self.provider.resource_schema(resource_type)?;
        let mut d = ResourceData::for_create(schema, self.desired(resource)?)
            .with_timeouts(self.provider.timeouts());

        match self.provider.create(resource_type, &mut d).await {
            Ok(()) => {
                let id = d.id().to_string();
                state.set_resource(
                    resource.address(),
                    ResourceState::new(id, resource_type)
                        .with_status(ResourceStatus::Ready)
                        .with_attributes(d.into_attributes()),
                );
                Ok(())
            }
            Err(e) => {
                // The remote object exists even though a later step failed
                if !d.id().is_empty() {
                    let id = d.id().to_string();
                    state.set_resource(
                        resource.address(),
                        ResourceState::new(id, resource_type)
                            .with_status(ResourceStatus::Tainted)
                            .with_attributes(d.into_attributes()),
                    );
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, resource_type: &str, address: &str, state: &mut GlobalState) -> Result<()> {
        let stored = self.stored_state(state, address)?;
        let mut d = self.stored(resource_type, &stored)?;
        self.provider.delete(resource_type, &mut d).await?;
        state.remove_resource(address);
        Ok(())
    }

    /// Brings an existing remote object under management at `address`
    pub async fn import(&self, address: &str, raw_id: &str, state: &mut GlobalState) -> Result<()> {
        let (resource_type, _) = parse_address(address).ok_or_else(|| {
            CloudError::Validation(format!("invalid resource address {:?}, expected type.name", address))
        })?;

        if state.get_resource(address).is_some() {
            return Err(CloudError::StateError(format!(
                "{} is already managed",
                address
            )));
        }

        let d = self.provider.import(resource_type, raw_id).await?;
        let id = d.id().to_string();
        state.set_resource(
            address.to_string(),
            ResourceState::new(id, resource_type)
                .with_status(ResourceStatus::Ready)
                .with_attributes(d.into_attributes()),
        );
        Ok(())
    }

    /// Runs a declared data source lookup
    pub async fn read_data(&self, source: &ResourceConfig) -> Result<ResourceData> {
        self.provider
            .read_data_source(&source.resource_type, &source.config)
            .await
    }
}

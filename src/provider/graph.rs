//! Instance graph construction.
//!
//! Builds one component: resolve constructor dependencies, construct, assign
//! properties, run the lifecycle driver, publish. Every nested build goes
//! through the same construction stack, which is how cycles are detected.

use std::sync::Arc;
use std::time::Instant;

use crate::definition::{Definition, PropertyValue};
use crate::error::{BoxError, DiError, DiResult};
use crate::instance::{AnyArc, Args, Components, Instance, Resolved};
use crate::internal::ConstructionStack;
use crate::lifecycle::{self, LifecycleState};
use crate::request::DependencyRequest;
use crate::scope::Scope;

use super::resolver::{self, Selection};
use super::scope::Claim;
use super::ContainerInner;

impl ContainerInner {
    /// Instance for the definition in `slot`, honoring its scope.
    pub(crate) fn instance_for(&self, slot: usize, stack: &mut ConstructionStack) -> DiResult<Instance> {
        let definition = self.registry.at(slot);
        match definition.scope() {
            Scope::Singleton => {
                if let Some(instance) = self.singletons.get(slot) {
                    tracing::trace!(name = definition.name(), "singleton cache hit");
                    return Ok(instance);
                }
                match self.singletons.claim(slot)? {
                    Claim::Ready(instance) => Ok(instance),
                    Claim::Build(build) => {
                        let instance = self.create(slot, stack)?;
                        Ok(build.publish(instance))
                    }
                    Claim::Reentered => Err(DiError::Circular(stack.path_through([definition.name()]))),
                    Claim::Deadlock(slots) => {
                        let names = slots.iter().map(|&s| self.registry.at(s).name());
                        tracing::debug!(name = definition.name(), "cross-thread build cycle");
                        Err(DiError::Circular(stack.path_through(names)))
                    }
                }
            }
            Scope::Transient => self.create(slot, stack),
        }
    }

    /// Resolves `request` into instances, building whatever is missing.
    pub(crate) fn resolve(&self, request: &DependencyRequest, site: &str, stack: &mut ConstructionStack) -> DiResult<Resolved> {
        match resolver::select(&self.registry, request, site)? {
            Selection::One(slot) => self.instance_for(slot, stack).map(Resolved::Instance),
            Selection::Absent => {
                tracing::trace!(%request, site, "optional dependency absent");
                Ok(Resolved::Absent)
            }
            Selection::All(slots) => {
                let mut components = Components::with_capacity(slots.len());
                for slot in slots {
                    components.push(self.instance_for(slot, stack)?);
                }
                Ok(Resolved::Collection(components))
            }
        }
    }

    fn create(&self, slot: usize, stack: &mut ConstructionStack) -> DiResult<Instance> {
        let definition = self.registry.at(slot).clone();
        let name = definition.name();
        let scope = definition.scope();

        stack.within(name, |stack| {
            tracing::debug!(name, ?scope, depth = stack.depth(), "creating component");
            let started = self.observers.has_observers().then(|| {
                self.observers.creating(name, scope);
                Instant::now()
            });

            let result = self.construct(&definition, slot, stack);

            match (&result, started) {
                (Ok(_), Some(started)) => self.observers.created(name, scope, started.elapsed()),
                (Err(err), Some(_)) => self.observers.creation_failed(name, err),
                _ => {}
            }
            if let Err(err) = &result {
                tracing::debug!(name, error = %err, "component creation failed");
            }
            result
        })
    }

    fn construct(&self, definition: &Arc<Definition>, slot: usize, stack: &mut ConstructionStack) -> DiResult<Instance> {
        let name = definition.name();
        let owned = definition.scope().is_container_owned();
        let failed = |source: BoxError| DiError::ConstructionFailed {
            name: name.to_string(),
            source,
        };

        let mut values = Vec::with_capacity(definition.dependencies().len());
        for (index, request) in definition.dependencies().iter().enumerate() {
            let site = format!("constructor argument #{} of '{}'", index, name);
            let value = self.resolve(request, &site, stack).map_err(|e| e.creating(name))?;
            values.push(value);
        }

        let mut component = definition.create(&Args::new(name, values)).map_err(failed)?;
        if owned {
            self.singletons.set_state(slot, LifecycleState::Constructed);
        }

        for binding in definition.property_bindings() {
            let site = format!("property '{}' of '{}'", binding.name, name);
            let value = self
                .property_value(&binding.value, &site, stack)
                .map_err(|e| e.creating(name))?;
            (binding.assign)(component.as_mut(), value).map_err(failed)?;
        }
        if owned {
            self.singletons.set_state(slot, LifecycleState::Populated);
        }

        lifecycle::initialize(definition, component.as_mut(), &self.post_processors)?;

        let value: AnyArc = Arc::from(component);
        if owned {
            self.singletons.set_state(slot, LifecycleState::Initialized);
            self.singletons.completed(value.clone(), definition.clone());
        }
        Ok(Instance::new(value, definition.clone()))
    }

    fn property_value(&self, value: &PropertyValue, site: &str, stack: &mut ConstructionStack) -> DiResult<Resolved> {
        match value {
            PropertyValue::Literal(text) => Ok(Resolved::Text(text.clone())),
            PropertyValue::Dependency(request) => self.resolve(request, site, stack),
            PropertyValue::External { key, default } => match self.values.get(key) {
                Some(found) => Ok(Resolved::Text(found)),
                None => match default {
                    Some(default) => {
                        tracing::trace!(key = key.as_str(), site, "external value defaulted");
                        Ok(Resolved::Text(default.clone()))
                    }
                    None => Err(DiError::MissingExternalValue {
                        key: key.clone(),
                        site: site.to_string(),
                    }),
                },
            },
        }
    }
}

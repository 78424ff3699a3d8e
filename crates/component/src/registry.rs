// Component registry
//
// Populated once at start-up, read-only afterwards. Lookups return shared
// component handles; executions keep their component alive.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::component::Component;
use crate::definition::ComponentDefinition;
use crate::error::ComponentError;
use crate::execution::Execution;
use crate::record::Record;

/// Loaded components indexed by id and uid.
#[derive(Debug, Default)]
pub struct Registry {
	by_id: HashMap<String, Arc<Component>>,
	by_uid: HashMap<Uuid, Arc<Component>>,
	/// Registration order
	order: Vec<Arc<Component>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a component.
	///
	/// Registering a component with the same id and uid again is a no-op
	/// that returns the existing handle. Any other id or uid clash is a
	/// `DuplicateComponent` error.
	pub fn register(&mut self, component: Component) -> Result<Arc<Component>, ComponentError> {
		let id = component.id().to_string();
		let uid = component.uid();
		if let Some(existing) = self.by_id.get(&id) {
			if existing.uid() == uid {
				debug!(target: "component", %id, "component already registered");
				return Ok(Arc::clone(existing));
			}
			return Err(ComponentError::DuplicateComponent(id));
		}
		if self.by_uid.contains_key(&uid) {
			return Err(ComponentError::DuplicateComponent(uid.to_string()));
		}

		let component = Arc::new(component);
		self.by_id.insert(id.clone(), Arc::clone(&component));
		self.by_uid.insert(uid, Arc::clone(&component));
		self.order.push(Arc::clone(&component));
		info!(target: "component", %id, %uid, "registered component");
		Ok(component)
	}

	pub fn get(&self, id: &str) -> Option<&Arc<Component>> {
		self.by_id.get(id)
	}

	pub fn get_by_uid(&self, uid: &Uuid) -> Option<&Arc<Component>> {
		self.by_uid.get(uid)
	}

	/// Definitions in registration order.
	pub fn definitions(&self) -> impl Iterator<Item = &ComponentDefinition> {
		self.order.iter().map(|c| c.definition())
	}

	/// Definitions in registration order, hiding tombstoned ones unless
	/// `include_tombstoned` is set.
	pub fn definitions_filtered(&self, include_tombstoned: bool) -> impl Iterator<Item = &ComponentDefinition> {
		self
			.definitions()
			.filter(move |def| include_tombstoned || !def.tombstone)
	}

	/// Whether `field` (a dotted path) of component `id`'s setup holds a secret.
	pub fn is_secret_field(&self, id: &str, field: &str) -> Result<bool, ComponentError> {
		self
			.get(id)
			.map(|c| c.definition().is_secret_field(field))
			.ok_or_else(|| ComponentError::ComponentNotFound(id.to_string()))
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Bind `task` of component `id` to `setup`.
	pub fn create_execution(
		&self,
		id: &str,
		setup: &Record,
		task: &str,
		system_variables: Record,
	) -> Result<Execution, ComponentError> {
		let component = self
			.get(id)
			.ok_or_else(|| ComponentError::ComponentNotFound(id.to_string()))?;
		component.create_execution(setup, task, system_variables)
	}
}

/// Process-wide holder for the registry.
///
/// `init` runs the registration routine exactly once; every later caller
/// gets the same registry.
#[derive(Debug, Default)]
pub struct RegistryStore {
	cell: OnceCell<Arc<Registry>>,
}

impl RegistryStore {
	pub const fn new() -> Self {
		Self { cell: OnceCell::new() }
	}

	/// Initialise the registry with `register`, or return the registry an
	/// earlier call produced. A failed routine leaves the store empty.
	pub fn init<F>(&self, register: F) -> Result<Arc<Registry>, ComponentError>
	where
		F: FnOnce(&mut Registry) -> Result<(), ComponentError>,
	{
		self
			.cell
			.get_or_try_init(|| {
				let mut registry = Registry::new();
				register(&mut registry)?;
				info!(target: "component", components = registry.len(), "component registry initialised");
				Ok(Arc::new(registry))
			})
			.map(Arc::clone)
	}

	/// The registry, once initialised.
	pub fn get(&self) -> Option<Arc<Registry>> {
		self.cell.get().map(Arc::clone)
	}
}

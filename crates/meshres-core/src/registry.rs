//! The type registry: which resource types exist and how they behave.
//!
//! Registration happens once at startup; every request then resolves its type
//! here. The registry is an explicit object handed to the service so tests can
//! build isolated instances.

use std::{
  collections::HashMap,
  fmt,
  sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  resource::{Resource, Tenancy, Type},
};

/// Partition or namespace value filled in when a scope requires one and the
/// request left it empty.
pub const DEFAULT_TENANCY: &str = "default";
/// Peer name filled in when the request left it empty.
pub const LOCAL_PEER: &str = "local";

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The tenancy level a type lives at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
  /// One instance per name across the whole cluster.
  Cluster,
  Partition,
  #[default]
  Namespace,
}

impl Scope {
  /// Fill empty tenancy fields with defaults and reject fields the scope does
  /// not allow.
  pub fn normalize(self, tenancy: &mut Tenancy) -> Result<()> {
    if tenancy.peer_name.is_empty() {
      tenancy.peer_name = LOCAL_PEER.to_owned();
    }
    match self {
      Scope::Cluster => {
        if !tenancy.partition.is_empty() || !tenancy.namespace.is_empty() {
          return Err(Error::InvalidResource(
            "cluster-scoped resources must not set a partition or namespace".into(),
          ));
        }
      }
      Scope::Partition => {
        if !tenancy.namespace.is_empty() {
          return Err(Error::InvalidResource(
            "partition-scoped resources must not set a namespace".into(),
          ));
        }
        if tenancy.partition.is_empty() {
          tenancy.partition = DEFAULT_TENANCY.to_owned();
        }
      }
      Scope::Namespace => {
        if tenancy.partition.is_empty() {
          tenancy.partition = DEFAULT_TENANCY.to_owned();
        }
        if tenancy.namespace.is_empty() {
          tenancy.namespace = DEFAULT_TENANCY.to_owned();
        }
      }
    }
    Ok(())
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

pub type ValidateHook = Arc<dyn Fn(&Resource) -> Result<(), String> + Send + Sync>;
pub type MutateHook = Arc<dyn Fn(&mut Resource) + Send + Sync>;

/// The schema descriptor for one resource type.
#[derive(Clone)]
pub struct Registration {
  pub ty:       Type,
  pub scope:    Scope,
  /// Run against the resource body on every write.
  pub validate: Option<ValidateHook>,
  /// Applied to the resource body before `validate`.
  pub mutate:   Option<MutateHook>,
}

impl Registration {
  pub fn new(ty: Type) -> Self {
    Self { ty, scope: Scope::default(), validate: None, mutate: None }
  }

  pub fn with_scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn with_validate(
    mut self,
    hook: impl Fn(&Resource) -> Result<(), String> + Send + Sync + 'static,
  ) -> Self {
    self.validate = Some(Arc::new(hook));
    self
  }

  pub fn with_mutate(
    mut self,
    hook: impl Fn(&mut Resource) + Send + Sync + 'static,
  ) -> Self {
    self.mutate = Some(Arc::new(hook));
    self
  }

  /// Run the mutate hook, then the validate hook.
  pub fn prepare(&self, res: &mut Resource) -> Result<()> {
    if let Some(mutate) = &self.mutate {
      mutate(res);
    }
    if let Some(validate) = &self.validate {
      validate(res).map_err(Error::InvalidResource)?;
    }
    Ok(())
  }
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registration")
      .field("ty", &self.ty)
      .field("scope", &self.scope)
      .field("validate", &self.validate.is_some())
      .field("mutate", &self.mutate.is_some())
      .finish()
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Maps exact (group, group-version, kind) triples to registrations.
#[derive(Debug, Default)]
pub struct Registry {
  types: RwLock<HashMap<Type, Registration>>,
}

impl Registry {
  pub fn new() -> Self { Self::default() }

  /// Add a type. Registering the same triple twice is an error.
  pub fn register(&self, registration: Registration) -> Result<()> {
    let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
    if types.contains_key(&registration.ty) {
      return Err(Error::AlreadyRegistered(registration.ty));
    }
    tracing::debug!(ty = %registration.ty, scope = ?registration.scope, "registered resource type");
    types.insert(registration.ty.clone(), registration);
    Ok(())
  }

  pub fn resolve(&self, ty: &Type) -> Option<Registration> {
    self
      .types
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(ty)
      .cloned()
  }

  /// Like [`Registry::resolve`], but a miss is an [`Error::TypeNotRegistered`].
  pub fn require(&self, ty: &Type) -> Result<Registration> {
    self.resolve(ty).ok_or_else(|| Error::TypeNotRegistered(ty.clone()))
  }

  /// All registered types, sorted.
  pub fn types(&self) -> Vec<Type> {
    let mut out: Vec<Type> = self
      .types
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .keys()
      .cloned()
      .collect();
    out.sort();
    out
  }
}

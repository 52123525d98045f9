//! Route table: which module handles which messages and packets.
//!
//! Registrations happen once, through [`RouteTableBuilder`], when the
//! application starts. [`RouteTableBuilder::build`] consumes the builder, so
//! a built [`RouteTable`] has no way to add, remove or replace a route.

use std::collections::BTreeMap;

use marketlink_types::{MarketError, Module, Result};

/// Collects module registrations before the table is frozen.
#[derive(Default)]
pub struct RouteTableBuilder {
    modules: BTreeMap<&'static str, Box<dyn Module>>,
    ports: BTreeMap<String, &'static str>,
}

impl RouteTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` as the handler for every message whose
    /// `route()` is `route`.
    ///
    /// # Errors
    /// Returns [`MarketError::DuplicateRoute`] if `route` is already taken.
    pub fn register(mut self, route: &'static str, module: impl Module + 'static) -> Result<Self> {
        if self.modules.contains_key(route) {
            return Err(MarketError::DuplicateRoute(route.to_string()));
        }
        self.modules.insert(route, Box::new(module));
        Ok(self)
    }

    /// Deliver relay callbacks for packets sent from `port` to the module
    /// registered under `route`.
    ///
    /// # Errors
    /// - `UnknownRoute` if no module is registered under `route`
    /// - `Configuration` if `port` is already bound
    pub fn bind_port(mut self, port: impl Into<String>, route: &'static str) -> Result<Self> {
        let port = port.into();
        if !self.modules.contains_key(route) {
            return Err(MarketError::UnknownRoute(route.to_string()));
        }
        if let Some(existing) = self.ports.get(&port) {
            return Err(MarketError::Configuration(format!(
                "port {port} already bound to route {existing}"
            )));
        }
        self.ports.insert(port, route);
        Ok(self)
    }

    /// Freeze the registrations.
    #[must_use]
    pub fn build(self) -> RouteTable {
        tracing::info!(
            routes = ?self.modules.keys().collect::<Vec<_>>(),
            ports = ?self.ports,
            "Route table built"
        );
        RouteTable {
            modules: self.modules,
            ports: self.ports,
        }
    }
}

/// Immutable route → module and port → route bindings.
pub struct RouteTable {
    modules: BTreeMap<&'static str, Box<dyn Module>>,
    ports: BTreeMap<String, &'static str>,
}

impl RouteTable {
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Registered routes in sorted order.
    pub fn routes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modules.keys().copied()
    }

    #[must_use]
    pub fn contains(&self, route: &str) -> bool {
        self.modules.contains_key(route)
    }

    /// Route bound to `port`, if any.
    #[must_use]
    pub fn route_for_port(&self, port: &str) -> Option<&'static str> {
        self.ports.get(port).copied()
    }

    /// The module registered under `route`.
    ///
    /// # Errors
    /// Returns [`MarketError::UnknownRoute`] if nothing is registered.
    pub fn module_mut(&mut self, route: &str) -> Result<&mut (dyn Module + 'static)> {
        match self.modules.get_mut(route) {
            Some(module) => Ok(module.as_mut()),
            None => Err(MarketError::UnknownRoute(route.to_string())),
        }
    }

    /// The module that owns packets sent from `port`.
    ///
    /// # Errors
    /// Returns [`MarketError::UnknownRoute`] naming the port if it is unbound.
    pub fn module_for_port_mut(&mut self, port: &str) -> Result<&mut (dyn Module + 'static)> {
        let route = self
            .route_for_port(port)
            .ok_or_else(|| MarketError::UnknownRoute(format!("port:{port}")))?;
        self.module_mut(route)
    }

    /// Every module, in route order.
    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut (dyn Module + 'static)> + '_ {
        self.modules.values_mut().map(|m| &mut **m)
    }
}

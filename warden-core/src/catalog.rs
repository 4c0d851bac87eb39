//! The route catalog: an explicit registration API for the endpoint
//! synchronizer.
//!
//! Instead of reflecting over the framework's routing table, each
//! handler declares its path template, HTTP methods, and owning
//! `(module, submodule, action)` at wire-up time. The synchronizer
//! reads the catalog; nothing in the hot path does.

/// Sentinel module assigned to routes that declare no owner.
pub const SYSTEM_MODULE: &str = "SYSTEM";

/// One registered route: a path template, the methods its handler
/// implements, and optional RBAC ownership metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub path: String,
    pub methods: Vec<String>,
    pub handler: String,
    pub module: Option<String>,
    pub submodule: Option<String>,
    pub action: Option<String>,
}

impl RouteSpec {
    pub fn new(path: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            path: path.into(),
            methods: methods.iter().map(|m| m.to_uppercase()).collect(),
            handler: String::new(),
            module: None,
            submodule: None,
            action: None,
        }
    }

    /// Name of the handling function, for operator-facing listings.
    pub fn handler(mut self, name: impl Into<String>) -> Self {
        self.handler = name.into();
        self
    }

    pub fn module(mut self, code: impl Into<String>) -> Self {
        self.module = Some(code.into());
        self
    }

    pub fn submodule(mut self, code: impl Into<String>) -> Self {
        self.submodule = Some(code.into());
        self
    }

    /// Explicit action required to invoke this route, overriding the
    /// HTTP-method default.
    pub fn action(mut self, code: impl Into<String>) -> Self {
        self.action = Some(code.into());
        self
    }

    /// The owning module, falling back to the [`SYSTEM_MODULE`]
    /// sentinel when the handler declared none.
    pub fn effective_module(&self) -> &str {
        self.module.as_deref().unwrap_or(SYSTEM_MODULE)
    }
}

/// Collects every [`RouteSpec`] an application wires up.
#[derive(Debug, Default)]
pub struct RouteCatalog {
    entries: Vec<RouteSpec>,
}

impl RouteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: RouteSpec) {
        self.entries.push(spec);
    }

    /// Open a nested scope; every route registered through it gets
    /// `prefix` prepended. Scopes nest, mirroring nested routers.
    pub fn scope(&mut self, prefix: impl Into<String>) -> CatalogScope<'_> {
        CatalogScope {
            catalog: self,
            prefix: prefix.into(),
        }
    }

    pub fn entries(&self) -> &[RouteSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A prefix-applying view over a [`RouteCatalog`].
pub struct CatalogScope<'a> {
    catalog: &'a mut RouteCatalog,
    prefix: String,
}

impl CatalogScope<'_> {
    pub fn register(&mut self, mut spec: RouteSpec) {
        spec.path = join_paths(&self.prefix, &spec.path);
        self.catalog.register(spec);
    }

    pub fn scope(&mut self, prefix: impl Into<String>) -> CatalogScope<'_> {
        CatalogScope {
            catalog: &mut *self.catalog,
            prefix: join_paths(&self.prefix, &prefix.into()),
        }
    }
}

fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path == "/" || path.is_empty() {
        return prefix.to_string();
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_are_uppercased() {
        let spec = RouteSpec::new("/things", &["get", "Post"]);
        assert_eq!(spec.methods, vec!["GET", "POST"]);
    }

    #[test]
    fn scopes_concatenate_prefixes() {
        let mut catalog = RouteCatalog::new();
        {
            let mut api = catalog.scope("/api");
            api.register(RouteSpec::new("/enquiries", &["GET"]));
            let mut nested = api.scope("/enquiries");
            nested.register(RouteSpec::new("/{id}", &["GET"]));
        }
        catalog.register(RouteSpec::new("/health", &["GET"]));

        let paths: Vec<&str> = catalog.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/enquiries", "/api/enquiries/{id}", "/health"]);
    }

    #[test]
    fn missing_module_falls_back_to_sentinel() {
        let spec = RouteSpec::new("/internal", &["GET"]);
        assert_eq!(spec.effective_module(), SYSTEM_MODULE);
        let owned = RouteSpec::new("/api/enquiries", &["GET"]).module("CRM");
        assert_eq!(owned.effective_module(), "CRM");
    }
}

//! Route registrations, including the RBAC ownership metadata the
//! endpoint synchronizer persists.

use warden::prelude::{RouteCatalog, RouteSpec};

pub fn build_catalog() -> RouteCatalog {
    let mut catalog = RouteCatalog::new();
    {
        let mut api = catalog.scope("/api");
        api.register(
            RouteSpec::new("/enquiries", &["GET", "POST"])
                .handler("enquiries::collection")
                .module("CRM")
                .submodule("LEADS"),
        );
        api.register(
            RouteSpec::new("/enquiries/{id}", &["GET", "PUT", "DELETE"])
                .handler("enquiries::item")
                .module("CRM")
                .submodule("LEADS"),
        );
    }
    catalog.register(RouteSpec::new("/healthz", &["GET"]).handler("health"));
    catalog
}

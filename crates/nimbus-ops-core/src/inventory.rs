//! Inventory filtering and projection engine
//!
//! Pure functions over the server/application tree fetched from the
//! platform: a type-tag filter and two output projections (domain-centric
//! and server-centric). No network, no state.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::platform::{App, Server};

/// Type tags covered by the "wordpress" alias filter
pub const WORDPRESS_TAGS: &[&str] = &["wordpress", "woocommerce", "wordpressmu"];

/// Application type filter
///
/// `all` 匹配所有类型；`wordpress` 是别名组；其余按类型精确匹配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppFilter {
    All,
    Wordpress,
    Exact(String),
}

impl AppFilter {
    /// Parse a CLI filter keyword (case-insensitive)
    pub fn parse(keyword: &str) -> Self {
        match keyword.to_lowercase().as_str() {
            "all" => AppFilter::All,
            "wordpress" => AppFilter::Wordpress,
            other => AppFilter::Exact(other.to_string()),
        }
    }

    /// Test an application type tag against the filter
    pub fn matches(&self, app_type: &str) -> bool {
        let tag = app_type.to_lowercase();
        match self {
            AppFilter::All => true,
            AppFilter::Wordpress => WORDPRESS_TAGS.contains(&tag.as_str()),
            AppFilter::Exact(expected) => tag == *expected,
        }
    }

    /// Keyword embedded in artifact filenames
    pub fn keyword(&self) -> &str {
        match self {
            AppFilter::All => "all",
            AppFilter::Wordpress => "wordpress",
            AppFilter::Exact(tag) => tag,
        }
    }
}

/// Web root is a pure function of the backing database name
pub fn webroot(db_name: &str) -> String {
    format!("/home/master/applications/{}/public_html", db_name)
}

/// Domain key for an application: custom cname wins over the generated FQDN
pub fn domain_for(app: &App) -> &str {
    match &app.cname {
        Some(cname) if !cname.trim().is_empty() => cname,
        _ => &app.app_fqdn,
    }
}

/// SSH command line for a server
pub fn ssh_command(server: &Server) -> String {
    format!("ssh {}@{}", server.master_user, server.public_ip)
}

/// Domain-centric projection value
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DomainEntry {
    pub ip: String,
    pub master_user: String,
    pub ssh_command: String,
    pub database: String,
    pub app_type: String,
    pub webroot: String,
}

/// Application entry inside the server-centric projection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppEntry {
    pub domain: String,
    pub database: String,
    pub app_type: String,
    pub webroot: String,
}

/// Server-centric projection value, keyed by public IP
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerEntry {
    pub master_user: String,
    pub ssh_command: String,
    pub apps: Vec<AppEntry>,
}

/// Project the inventory into a flat domain-keyed map
///
/// Only running servers are projected; an ssh-command against a stopped
/// server is meaningless. Duplicate domain keys: the later application in
/// inventory order silently overwrites the earlier one. Keys are emitted
/// sorted, so a fixed inventory and filter always serialize byte-identically.
pub fn domain_projection(servers: &[Server], filter: &AppFilter) -> BTreeMap<String, DomainEntry> {
    let mut map = BTreeMap::new();

    for server in servers.iter().filter(|s| s.is_running()) {
        for app in server.apps.iter().filter(|a| filter.matches(&a.application)) {
            map.insert(
                domain_for(app).to_string(),
                DomainEntry {
                    ip: server.public_ip.clone(),
                    master_user: server.master_user.clone(),
                    ssh_command: ssh_command(server),
                    database: app.mysql_db_name.clone(),
                    app_type: app.application.clone(),
                    webroot: webroot(&app.mysql_db_name),
                },
            );
        }
    }

    map
}

/// Project the inventory into a server-grouped map of applications
///
/// Servers whose filtered application list is empty are omitted entirely,
/// as are servers that are not running.
pub fn server_projection(servers: &[Server], filter: &AppFilter) -> BTreeMap<String, ServerEntry> {
    let mut map = BTreeMap::new();

    for server in servers.iter().filter(|s| s.is_running()) {
        let apps: Vec<AppEntry> = server
            .apps
            .iter()
            .filter(|a| filter.matches(&a.application))
            .map(|app| AppEntry {
                domain: domain_for(app).to_string(),
                database: app.mysql_db_name.clone(),
                app_type: app.application.clone(),
                webroot: webroot(&app.mysql_db_name),
            })
            .collect();

        if !apps.is_empty() {
            map.insert(
                server.public_ip.clone(),
                ServerEntry {
                    master_user: server.master_user.clone(),
                    ssh_command: ssh_command(server),
                    apps,
                },
            );
        }
    }

    map
}

/// Domain list for the plain-text artifact (sorted, deduplicated)
pub fn domain_list(servers: &[Server], filter: &AppFilter) -> Vec<String> {
    domain_projection(servers, filter).into_keys().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(tag: &str, cname: &str, fqdn: &str, db: &str) -> App {
        App {
            application: tag.to_string(),
            cname: Some(cname.to_string()),
            app_fqdn: fqdn.to_string(),
            mysql_db_name: db.to_string(),
        }
    }

    fn server(id: &str, ip: &str, status: &str, apps: Vec<App>) -> Server {
        Server {
            id: id.to_string(),
            public_ip: ip.to_string(),
            master_user: format!("master_{id}"),
            status: status.to_string(),
            apps,
        }
    }

    fn fixture() -> Vec<Server> {
        vec![
            server(
                "1",
                "203.0.113.10",
                "running",
                vec![
                    app("wordpress", "", "wp1.nimbusapps.net", "db_wp1"),
                    app("woocommerce", "shop.example.com", "shop.nimbusapps.net", "db_shop"),
                ],
            ),
            server(
                "2",
                "203.0.113.11",
                "running",
                vec![
                    app("phpstack", "", "api.nimbusapps.net", "db_api"),
                    app("wordpressmu", "", "mu.nimbusapps.net", "db_mu"),
                ],
            ),
        ]
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(AppFilter::parse("ALL"), AppFilter::All);
        assert_eq!(AppFilter::parse("WordPress"), AppFilter::Wordpress);
        assert_eq!(
            AppFilter::parse("PhpStack"),
            AppFilter::Exact("phpstack".to_string())
        );
    }

    #[test]
    fn test_exact_filter_is_case_normalized() {
        let filter = AppFilter::parse("phpstack");
        assert!(filter.matches("PHPStack"));
        assert!(!filter.matches("wordpress"));
    }

    #[test]
    fn test_wordpress_alias_equals_union_of_exact_tags() {
        let servers = fixture();
        let alias = domain_projection(&servers, &AppFilter::Wordpress);

        let mut union = BTreeMap::new();
        for tag in WORDPRESS_TAGS {
            union.extend(domain_projection(&servers, &AppFilter::Exact(tag.to_string())));
        }

        assert_eq!(alias, union);
        assert_eq!(alias.len(), 3);
    }

    #[test]
    fn test_projection_cardinality_invariant() {
        let servers = fixture();
        for keyword in ["all", "wordpress", "phpstack", "nodejs"] {
            let filter = AppFilter::parse(keyword);
            let by_domain = domain_projection(&servers, &filter);
            let by_server: usize = server_projection(&servers, &filter)
                .values()
                .map(|s| s.apps.len())
                .sum();
            assert_eq!(by_domain.len(), by_server, "filter {keyword}");
        }
    }

    #[test]
    fn test_cname_precedence_and_fqdn_fallback() {
        let servers = fixture();
        let map = domain_projection(&servers, &AppFilter::All);
        assert!(map.contains_key("shop.example.com"));
        assert!(!map.contains_key("shop.nimbusapps.net"));
        assert!(map.contains_key("wp1.nimbusapps.net"));
        assert!(map.keys().all(|k| !k.is_empty()));
    }

    #[test]
    fn test_webroot_is_derived_from_database() {
        let map = domain_projection(&fixture(), &AppFilter::All);
        let entry = &map["wp1.nimbusapps.net"];
        assert_eq!(entry.webroot, "/home/master/applications/db_wp1/public_html");
        assert_eq!(entry.ssh_command, "ssh master_1@203.0.113.10");
    }

    #[test]
    fn test_duplicate_domain_last_write_wins() {
        let servers = vec![
            server("1", "203.0.113.10", "running",
                vec![app("wordpress", "dup.example.com", "a.nimbusapps.net", "db_a")]),
            server("2", "203.0.113.11", "running",
                vec![app("phpstack", "dup.example.com", "b.nimbusapps.net", "db_b")]),
        ];

        let map = domain_projection(&servers, &AppFilter::All);
        assert_eq!(map.len(), 1);
        assert_eq!(map["dup.example.com"].database, "db_b");
    }

    #[test]
    fn test_empty_result_is_valid() {
        let map = domain_projection(&fixture(), &AppFilter::parse("magento"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_stopped_servers_are_excluded() {
        // One running server with a wordpress app (empty cname), one stopped
        // server with a phpstack app, filter "all": only the running server
        // appears, and the domains list carries its generated FQDN.
        let servers = vec![
            server("1", "203.0.113.10", "running",
                vec![app("wordpress", "", "site1.example.com", "db_site1")]),
            server("2", "203.0.113.11", "stopped",
                vec![app("phpstack", "", "site2.example.com", "db_site2")]),
        ];

        let filter = AppFilter::parse("all");
        let by_server = server_projection(&servers, &filter);
        assert_eq!(by_server.len(), 1);
        assert_eq!(by_server["203.0.113.10"].apps.len(), 1);
        assert_eq!(by_server["203.0.113.10"].apps[0].domain, "site1.example.com");

        assert_eq!(domain_list(&servers, &filter), vec!["site1.example.com"]);
    }

    #[test]
    fn test_servers_without_matches_are_omitted() {
        let servers = fixture();
        let by_server = server_projection(&servers, &AppFilter::parse("phpstack"));
        assert_eq!(by_server.len(), 1);
        assert!(by_server.contains_key("203.0.113.11"));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let servers = fixture();
        let a = serde_json::to_string(&domain_projection(&servers, &AppFilter::All)).unwrap();
        let b = serde_json::to_string(&domain_projection(&servers, &AppFilter::All)).unwrap();
        assert_eq!(a, b);
    }
}

//! robots.txt parsing and the scrape permission check.
//!
//! Rules are grouped per user agent with `*` as the fallback group. `Allow`
//! wins over `Disallow` on a prefix match. An unreachable or absent
//! robots.txt permits fetching.

use std::collections::HashMap;

use reqwest::Client;
use url::Url;

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    groups: HashMap<String, Group>,
    wildcard: Group,
}

#[derive(Debug, Clone, Default)]
struct Group {
    disallow: Vec<String>,
    allow: Vec<String>,
}

impl RobotsRules {
    /// Parses robots.txt content. Unknown directives are ignored.
    pub fn parse(content: &str) -> Self {
        let mut rules = Self::default();
        let mut agents: Vec<String> = Vec::new();
        let mut group = Group::default();
        let mut group_has_rules = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_ascii_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a fresh group;
                    // consecutive agent lines share the group that follows.
                    if group_has_rules {
                        rules.store(&agents, std::mem::take(&mut group));
                        agents.clear();
                        group_has_rules = false;
                    }
                    agents.push(value.to_ascii_lowercase());
                }
                "disallow" => {
                    if !value.is_empty() {
                        group.disallow.push(value.to_string());
                    }
                    group_has_rules = true;
                }
                "allow" => {
                    if !value.is_empty() {
                        group.allow.push(value.to_string());
                    }
                    group_has_rules = true;
                }
                _ => {}
            }
        }
        rules.store(&agents, group);
        rules
    }

    fn store(&mut self, agents: &[String], group: Group) {
        for agent in agents {
            if agent == "*" {
                self.wildcard = group.clone();
            } else {
                self.groups.insert(agent.clone(), group.clone());
            }
        }
    }

    /// Whether `user_agent` may fetch `path`.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let agent = user_agent.to_ascii_lowercase();
        let group = self
            .groups
            .get(&agent)
            .or_else(|| {
                self.groups
                    .iter()
                    .find(|(name, _)| agent.contains(name.as_str()))
                    .map(|(_, group)| group)
            })
            .unwrap_or(&self.wildcard);

        if group.allow.iter().any(|prefix| path.starts_with(prefix)) {
            return true;
        }
        !group
            .disallow
            .iter()
            .any(|prefix| prefix == "/" || path.starts_with(prefix))
    }
}

/// Fetches and parses robots.txt for the origin behind `url`.
///
/// Any failure (network, status, body) yields permissive default rules.
pub async fn fetch_rules(client: &Client, url: &Url) -> RobotsRules {
    let mut robots_url = url.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    match client.get(robots_url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => RobotsRules::parse(&body),
            Err(_) => RobotsRules::default(),
        },
        _ => RobotsRules::default(),
    }
}

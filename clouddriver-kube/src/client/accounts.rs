use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::config::{AccountConfig, Config};
use crate::error::{Error, Result};

/// Connection details of one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub context: Option<String>,
    /// Set for namespace-scoped accounts.
    pub namespace: Option<String>,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountFilter {
    All,
    Application(String),
    Project(String),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Names of accounts matching `filter`, sorted.
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<String>>;

    async fn get_account(&self, name: &str) -> Result<Account>;

    async fn project_applications(&self, project: &str) -> Result<Vec<String>>;
}

/// Account store backed by the `accounts` and `projects` config sections.
#[derive(Clone, Debug, Default)]
pub struct StaticAccountStore {
    accounts: BTreeMap<String, AccountConfig>,
    projects: BTreeMap<String, Vec<String>>,
}

impl StaticAccountStore {
    pub fn new(accounts: Vec<AccountConfig>, projects: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.name.clone(), a)).collect(),
            projects,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.accounts.clone(), config.projects.clone())
    }

    fn serves(account: &AccountConfig, application: &str) -> bool {
        account.applications.is_empty() || account.applications.iter().any(|a| a == application)
    }

    fn project(&self, project: &str) -> Result<&Vec<String>> {
        self.projects
            .get(project)
            .ok_or_else(|| Error::invalid("project", format!("unknown project {project}")))
    }
}

#[async_trait]
impl AccountStore for StaticAccountStore {
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<String>> {
        let names: BTreeSet<&String> = match filter {
            AccountFilter::All => self.accounts.keys().collect(),
            AccountFilter::Application(app) => self
                .accounts
                .values()
                .filter(|a| Self::serves(a, app))
                .map(|a| &a.name)
                .collect(),
            AccountFilter::Project(project) => {
                let apps = self.project(project)?;
                self.accounts
                    .values()
                    .filter(|a| apps.iter().any(|app| Self::serves(a, app)))
                    .map(|a| &a.name)
                    .collect()
            }
        };
        Ok(names.into_iter().cloned().collect())
    }

    async fn get_account(&self, name: &str) -> Result<Account> {
        let account = self
            .accounts
            .get(name)
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))?;
        Ok(Account {
            name: account.name.clone(),
            context: account.context.clone().or_else(|| Some(account.name.clone())),
            namespace: account.namespace.clone(),
        })
    }

    async fn project_applications(&self, project: &str) -> Result<Vec<String>> {
        let mut apps = self.project(project)?.clone();
        apps.sort();
        apps.dedup();
        Ok(apps)
    }
}

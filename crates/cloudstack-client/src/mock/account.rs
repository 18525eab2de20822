//! Domain and account operations for MockCloudStackClient

use super::{MockCloudStackClient, MockOperation};
use crate::error::CloudStackError;
use crate::models::*;

impl MockCloudStackClient {
    /// Add a domain and return its id (for test setup)
    pub fn add_domain(&self, name: &str, path: &str) -> String {
        let id = self.next_id("domain");
        self.domains.lock().unwrap().push(Domain {
            id: id.clone(),
            name: name.to_string(),
            path: path.to_string(),
        });
        id
    }

    /// Register an account with a user in the given domain (for test setup)
    pub fn add_account(&self, domain_id: &str, account: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert((domain_id.to_string(), account.to_string()));
    }
}

pub async fn get_domain_id(client: &MockCloudStackClient, domain: &str) -> Result<(String, usize), CloudStackError> {
    client.record(MockOperation::GetDomainId)?;
    let domains = client.domains.lock().unwrap();
    let matches: Vec<&Domain> = domains
        .iter()
        .filter(|d| d.name == domain || d.path.eq_ignore_ascii_case(domain))
        .collect();
    match matches.first() {
        Some(first) => Ok((first.id.clone(), matches.len())),
        None => Err(CloudStackError::no_match("Domain", domain)),
    }
}

pub async fn scoped_client(client: &MockCloudStackClient, domain: &str, account: &str) -> Result<MockCloudStackClient, CloudStackError> {
    client.record(MockOperation::NewClientInDomainAndAccount)?;
    let domain_ids: Vec<String> = client
        .domains
        .lock()
        .unwrap()
        .iter()
        .filter(|d| d.name == domain || d.path.eq_ignore_ascii_case(domain))
        .map(|d| d.id.clone())
        .collect();
    let [domain_id] = domain_ids.as_slice() else {
        return Err(CloudStackError::InvalidRequest(format!(
            "expected 1 domain with name {}, but got {}",
            domain,
            domain_ids.len()
        )));
    };

    if !client
        .accounts
        .lock()
        .unwrap()
        .contains(&(domain_id.clone(), account.to_string()))
    {
        return Err(CloudStackError::no_match("user in account", account));
    }

    let mut scoped = client.clone();
    scoped.scope = Some((domain.to_string(), account.to_string()));
    Ok(scoped)
}

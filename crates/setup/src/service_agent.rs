//! Provider-managed service agents that need access to the key.

/// A service whose agent must be able to use the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAgent {
    /// Discovery Engine (the product's data store).
    DiscoveryEngine,
    /// Cloud Storage.
    CloudStorage,
}

impl ServiceAgent {
    /// All agents, in provisioning order.
    pub const ALL: [Self; 2] = [Self::DiscoveryEngine, Self::CloudStorage];

    /// API the agent belongs to.
    #[must_use]
    pub fn service(self) -> &'static str {
        match self {
            Self::DiscoveryEngine => "discoveryengine.googleapis.com",
            Self::CloudStorage => "storage.googleapis.com",
        }
    }

    /// Domain of the agent's service account.
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            Self::DiscoveryEngine => "gcp-sa-discoveryengine.iam.gserviceaccount.com",
            Self::CloudStorage => "gs-project-accounts.iam.gserviceaccount.com",
        }
    }

    /// Service agent email for a project number.
    #[must_use]
    pub fn email(self, project_number: &str) -> String {
        format!("service-{project_number}@{}", self.domain())
    }

    /// IAM member identifier for a project number.
    #[must_use]
    pub fn member(self, project_number: &str) -> String {
        format!("serviceAccount:{}", self.email(project_number))
    }
}

impl std::fmt::Display for ServiceAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiscoveryEngine => write!(f, "Discovery Engine"),
            Self::CloudStorage => write!(f, "Cloud Storage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_emails() {
        assert_eq!(
            ServiceAgent::DiscoveryEngine.email("123456"),
            "service-123456@gcp-sa-discoveryengine.iam.gserviceaccount.com"
        );
        assert_eq!(
            ServiceAgent::CloudStorage.email("123456"),
            "service-123456@gs-project-accounts.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_member_prefix() {
        assert_eq!(
            ServiceAgent::CloudStorage.member("42"),
            "serviceAccount:service-42@gs-project-accounts.iam.gserviceaccount.com"
        );
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    /// Natural-person tax id (CPF).
    pub tax_id: String,
    pub name: String,
    /// Legal-entity tax ids (CNPJ) the user is affiliated with.
    pub company_tax_ids: Vec<String>,
}

/// Credential and identity lookups used by the interactive flow.
pub trait UserDirectory: Send + Sync {
    fn user_by_username(&self, username: &str) -> Option<User>;

    fn user_by_tax_id(&self, tax_id: &str) -> Option<User>;

    fn verify_password(&self, user: &User, password: &str) -> bool;
}

/// A fixed set of users sharing one password.
#[derive(Debug, Clone)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, User>,
    password: String,
}

impl InMemoryUserDirectory {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            users: HashMap::new(),
            password: password.into(),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.username.clone(), user);
        self
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn user_by_username(&self, username: &str) -> Option<User> {
        self.users.get(username).cloned()
    }

    fn user_by_tax_id(&self, tax_id: &str) -> Option<User> {
        self.users.values().find(|u| u.tax_id == tax_id).cloned()
    }

    fn verify_password(&self, _user: &User, password: &str) -> bool {
        self.password == password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryUserDirectory {
        InMemoryUserDirectory::new("pass").with_user(User {
            username: "bob@mail.com".to_string(),
            email: "bob@mail.com".to_string(),
            tax_id: "78628584099".to_string(),
            name: "Mr. Bob".to_string(),
            company_tax_ids: vec!["27737785000136".to_string()],
        })
    }

    #[test]
    fn test_lookups() {
        let users = directory();
        assert_eq!(users.user_by_username("bob@mail.com").unwrap().name, "Mr. Bob");
        assert_eq!(users.user_by_tax_id("78628584099").unwrap().username, "bob@mail.com");
        assert!(users.user_by_username("alice@mail.com").is_none());
        assert!(users.user_by_tax_id("00000000000").is_none());
    }

    #[test]
    fn test_password_check() {
        let users = directory();
        let bob = users.user_by_username("bob@mail.com").unwrap();
        assert!(users.verify_password(&bob, "pass"));
        assert!(!users.verify_password(&bob, "wrong"));
    }
}

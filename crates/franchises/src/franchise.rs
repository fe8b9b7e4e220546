use serde::{Deserialize, Serialize};

use slicehouse_core::{DomainError, DomainResult, FranchiseId, StoreId, UserId, validate};

/// A franchise with its admins and stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Franchise {
    pub id: FranchiseId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admins: Vec<FranchiseAdmin>,
    #[serde(default)]
    pub stores: Vec<Store>,
}

impl Franchise {
    /// Public view: admin identities are only shown to system admins.
    pub fn without_admins(mut self) -> Self {
        self.admins.clear();
        self
    }
}

/// Public identity of a franchise admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseAdmin {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub franchise_id: FranchiseId,
    pub name: String,
}

/// Reference to a prospective admin by e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRef {
    pub email: String,
}

/// Franchise creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewFranchise {
    pub name: Option<String>,
    #[serde(default)]
    pub admins: Vec<AdminRef>,
}

impl NewFranchise {
    /// Returns the trimmed name.
    pub fn validate(&self) -> DomainResult<&str> {
        let name = validate::required("name", self.name.as_deref())?;
        if self.admins.iter().any(|a| a.email.trim().is_empty()) {
            return Err(DomainError::validation("admin email is required"));
        }
        Ok(name)
    }
}

/// Store creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewStore {
    pub name: Option<String>,
}

impl NewStore {
    pub fn validate(&self) -> DomainResult<&str> {
        validate::required("name", self.name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_view_hides_admins() {
        let f = Franchise {
            id: FranchiseId::new(1),
            name: "pizzaPocket".into(),
            admins: vec![FranchiseAdmin {
                id: UserId::new(3),
                name: "pizza franchisee".into(),
                email: "f@jwt.com".into(),
            }],
            stores: vec![Store {
                id: StoreId::new(1),
                franchise_id: FranchiseId::new(1),
                name: "SLC".into(),
            }],
        };

        let json = serde_json::to_value(f.without_admins()).unwrap();
        assert!(json.get("admins").is_none());
        assert_eq!(json["stores"][0]["franchiseId"], 1);
    }

    #[test]
    fn creation_requires_name() {
        let req: NewFranchise = serde_json::from_value(serde_json::json!({
            "admins": [{ "email": "a@test.com" }]
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req = NewFranchise { name: Some(" pizzaPocket ".into()), admins: vec![] };
        assert_eq!(req.validate().unwrap(), "pizzaPocket");
    }
}

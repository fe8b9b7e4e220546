use serde::{Deserialize, Serialize};

use slicehouse_core::{DomainError, DomainResult, MenuItemId, validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: f64,
}

/// Menu item creation request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewMenuItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
}

impl NewMenuItem {
    /// Missing title, description or price is a client error.
    pub fn validate(&self) -> DomainResult<()> {
        validate::required("title", self.title.as_deref())?;
        validate::required("description", self.description.as_deref())?;
        match self.price {
            Some(p) if p.is_finite() && p >= 0.0 => Ok(()),
            Some(_) => Err(DomainError::validation("price must be a non-negative number")),
            None => Err(DomainError::validation("price is required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_price_is_a_validation_error() {
        let item = NewMenuItem {
            title: Some("Veggie".into()),
            description: Some("A garden of delight".into()),
            image: Some("pizza1.png".into()),
            price: None,
        };
        assert_eq!(item.validate(), Err(DomainError::validation("price is required")));
    }

    #[test]
    fn image_is_optional() {
        let item = NewMenuItem {
            title: Some("Pepperoni".into()),
            description: Some("Spicy treat".into()),
            image: None,
            price: Some(0.0042),
        };
        assert!(item.validate().is_ok());
    }
}

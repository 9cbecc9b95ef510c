//! Domain types for the storefront

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_MEMBER")]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Member => "ROLE_MEMBER",
        }
    }

    pub fn parse(s: &str) -> Role {
        match s {
            "ROLE_ADMIN" => Role::Admin,
            _ => Role::Member,
        }
    }
}

/// Account provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Email,
    Oauth,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Email => "email",
            Provider::Oauth => "oauth",
        }
    }

    pub fn parse(s: &str) -> Provider {
        match s {
            "oauth" => Provider::Oauth,
            _ => Provider::Email,
        }
    }
}

/// Storefront user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Bcrypt hash, never serialized onto the wire
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub provider: Provider,
    pub first_name: String,
    pub last_name: String,
}

/// Catalog brand
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
}

/// Catalog category; carries back-references to its products
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    #[serde(default)]
    pub products: Vec<String>,
}

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub is_active: bool,
    /// Owning brand id
    pub brand: String,
    /// Owning category slug
    pub category: String,
    pub image_url: String,
    pub rating: i64,
}

/// Generate a fresh entity id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Derive a URL slug from a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

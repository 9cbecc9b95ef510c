//! Seed helpers: valid minimal fixture entities with relationships satisfied
//!
//! Every helper takes the context explicitly and a small override struct;
//! unspecified fields get sane defaults with unique ids, so repeated calls
//! in one test produce independent entities.

use shopfront_common::{new_id, slugify, Brand, Category, Product, Provider, Role, User};

use crate::context::TestContext;
use crate::error::E2eResult;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "P@ssw0rd!";

// Minimum bcrypt cost keeps seeding fast; these hashes never leave a test run
const SEED_BCRYPT_COST: u32 = 4;

#[derive(Debug, Default, Clone)]
pub struct UserOverrides {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub provider: Option<Provider>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Seed a user; defaults to the admin account the login tests expect.
/// Returns the created user for assertions.
pub fn seed_admin(ctx: &TestContext, overrides: UserOverrides) -> E2eResult<User> {
    let password = overrides
        .password
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());
    let password_hash = bcrypt::hash(&password, SEED_BCRYPT_COST)
        .map_err(|e| crate::error::E2eError::FixtureSetup(format!("bcrypt: {}", e)))?;

    let user = User {
        id: new_id(),
        email: overrides
            .email
            .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        password_hash,
        role: overrides.role.unwrap_or(Role::Admin),
        provider: overrides.provider.unwrap_or(Provider::Email),
        first_name: overrides.first_name.unwrap_or_else(|| "Admin".to_string()),
        last_name: overrides.last_name.unwrap_or_else(|| "User".to_string()),
    };
    ctx.db().insert_user(&user)?;
    Ok(user)
}

/// Seed a brand
pub fn seed_brand(ctx: &TestContext, name: Option<&str>) -> E2eResult<Brand> {
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| format!("Brand {}", &new_id()[..8]));
    let brand = Brand {
        id: new_id(),
        slug: slugify(&name),
        name,
        is_active: true,
    };
    ctx.db().insert_brand(&brand)?;
    Ok(brand)
}

/// Seed a category
pub fn seed_category(ctx: &TestContext, name: Option<&str>) -> E2eResult<Category> {
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| format!("Category {}", &new_id()[..8]));
    let category = Category {
        id: new_id(),
        slug: slugify(&name),
        name,
        is_active: true,
        products: vec![],
    };
    ctx.db().insert_category(&category)?;
    Ok(category)
}

#[derive(Debug, Default, Clone)]
pub struct ProductOverrides {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub is_active: Option<bool>,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
    pub rating: Option<i64>,
}

/// Everything one seeded product touches
#[derive(Debug, Clone)]
pub struct SeededProduct {
    pub brand: Brand,
    pub category: Category,
    pub product: Product,
}

/// Seed a product with its required brand and category, and attach the
/// product to the category's back-reference list.
pub fn seed_product(ctx: &TestContext, overrides: ProductOverrides) -> E2eResult<SeededProduct> {
    let brand = seed_brand(ctx, overrides.brand_name.as_deref())?;
    let category = seed_category(ctx, overrides.category_name.as_deref())?;

    let product = Product {
        id: new_id(),
        sku: overrides
            .sku
            .unwrap_or_else(|| format!("SKU-{}", &new_id()[..8])),
        name: overrides.name.unwrap_or_else(|| "Campus Tee".to_string()),
        description: overrides
            .description
            .unwrap_or_else(|| "Comfort tee".to_string()),
        price: overrides.price.unwrap_or(19.99),
        quantity: overrides.quantity.unwrap_or(10),
        is_active: overrides.is_active.unwrap_or(true),
        brand: brand.id.clone(),
        category: category.slug.clone(),
        image_url: String::new(),
        rating: overrides.rating.unwrap_or(4),
    };
    ctx.db().insert_product(&product)?;
    ctx.db().attach_product(&category.id, &product.id)?;

    Ok(SeededProduct {
        brand,
        category,
        product,
    })
}

//! Lifecycle guarantees of the ephemeral database fixture

use shopfront_e2e::seed::{
    seed_admin, seed_product, ProductOverrides, UserOverrides,
};
use shopfront_e2e::TestContext;

#[tokio::test]
async fn cleanup_empties_every_table() {
    let ctx = TestContext::start().expect("fixture");
    seed_admin(&ctx, UserOverrides::default()).expect("seed admin");
    seed_product(&ctx, ProductOverrides::default()).expect("seed product");

    let report = ctx.cleanup();
    assert!(!report.is_skipped());
    report.log();

    for table in ["users", "brands", "categories", "products"] {
        assert_eq!(ctx.db().table_count(table).unwrap(), 0, "table {}", table);
    }

    ctx.teardown();
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let ctx = TestContext::start().expect("fixture");
    seed_admin(&ctx, UserOverrides::default()).expect("seed admin");

    ctx.cleanup().log();
    // A second pass over already-empty tables is harmless
    let report = ctx.cleanup();
    assert!(!report.is_skipped());
    report.log();

    assert_eq!(ctx.db().table_count("users").unwrap(), 0);
    ctx.teardown();
}

#[tokio::test]
async fn cleanup_and_teardown_tolerate_severed_connection() {
    let ctx = TestContext::start().expect("fixture");
    seed_admin(&ctx, UserOverrides::default()).expect("seed admin");

    ctx.sever_connection();

    // Neither call may panic or surface an error
    assert!(ctx.cleanup().is_skipped());
    assert!(ctx.cleanup().is_skipped());
    ctx.teardown();
}

#[tokio::test]
async fn repeated_seeds_produce_independent_entities() {
    let ctx = TestContext::start().expect("fixture");

    let first = seed_product(&ctx, ProductOverrides::default()).expect("seed one");
    let second = seed_product(&ctx, ProductOverrides::default()).expect("seed two");

    assert_ne!(first.product.id, second.product.id);
    assert_ne!(first.product.sku, second.product.sku);
    assert_ne!(first.brand.id, second.brand.id);
    assert_ne!(first.category.slug, second.category.slug);

    assert_eq!(ctx.db().table_count("products").unwrap(), 2);

    ctx.cleanup().log();
    ctx.teardown();
}

#[tokio::test]
async fn context_exposes_connection_uri() {
    let ctx = TestContext::start().expect("fixture");
    assert!(ctx.db_uri().starts_with("sqlite://"));
    assert!(ctx.db().is_connected());
    ctx.teardown();
}

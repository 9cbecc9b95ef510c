//! SQLite store for the storefront catalog and accounts
//!
//! The connection is held behind `Option` so a test can sever it mid-suite
//! (outage simulation). Every operation against a severed handle returns
//! [`Error::ConnectionClosed`] instead of hanging.

use crate::error::{Error, Result};
use crate::types::{Brand, Category, Product, Provider, Role, User};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper shared between the backend and the test harness
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Option<Connection>>>,
}

/// Per-table outcome of a purge pass
#[derive(Debug, Default)]
pub struct PurgeReport {
    /// Tables whose rows were deleted, with the number of rows removed
    pub purged: Vec<(String, usize)>,
    /// Tables whose deletion failed, with the error text
    pub failures: Vec<(String, String)>,
}

/// Sort order for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    CreatedDesc,
    CreatedAsc,
    PriceDesc,
    PriceAsc,
    NameAsc,
}

impl ProductSort {
    /// Map a `sortOrder` key/direction pair onto a known sort.
    /// Unknown keys fall back to newest-first.
    pub fn from_key(key: &str, direction: i64) -> ProductSort {
        match (key, direction >= 0) {
            ("created", true) => ProductSort::CreatedAsc,
            ("created", false) => ProductSort::CreatedDesc,
            ("price", true) => ProductSort::PriceAsc,
            ("price", false) => ProductSort::PriceDesc,
            ("name", _) => ProductSort::NameAsc,
            _ => ProductSort::CreatedDesc,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            ProductSort::CreatedDesc => "created_at DESC",
            ProductSort::CreatedAsc => "created_at ASC",
            ProductSort::PriceDesc => "price DESC",
            ProductSort::PriceAsc => "price ASC",
            ProductSort::NameAsc => "name ASC",
        }
    }
}

/// One page of a product listing plus pagination metadata
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_pages: u64,
    pub current_page: u64,
    pub count: u64,
}

fn trace_sql(sql: &str) {
    debug!(target: "shopfront::sql", "{}", sql);
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        // Statement logging is a debugging aid; `shopfront::sql=debug` enables it
        conn.trace(Some(trace_sql));

        let db = Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        };
        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.trace(Some(trace_sql));
        let db = Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Whether the underlying connection is still live
    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Sever the connection. Subsequent operations return
    /// [`Error::ConnectionClosed`]. Calling this twice is harmless.
    pub fn close(&self) {
        let mut guard = self.conn.lock();
        if guard.take().is_some() {
            info!("Database connection closed");
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(Error::ConnectionClosed),
        }
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL,
                    provider TEXT NOT NULL,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

                CREATE TABLE IF NOT EXISTS brands (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS categories (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    products TEXT NOT NULL DEFAULT '[]',
                    created_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS products (
                    id TEXT PRIMARY KEY,
                    sku TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    price REAL NOT NULL,
                    quantity INTEGER NOT NULL DEFAULT 0,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    brand TEXT NOT NULL,
                    category TEXT NOT NULL,
                    image_url TEXT NOT NULL DEFAULT '',
                    rating INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand);
                CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
                "#,
            )?;
            Ok(())
        })?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Insert a user account
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().timestamp();
            conn.execute(
                "INSERT INTO users (id, email, password_hash, role, provider, first_name, last_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.provider.as_str(),
                    user.first_name,
                    user.last_name,
                    now,
                ],
            )?;
            debug!("Inserted user {}", user.email);
            Ok(())
        })
    }

    /// Look up a user by email
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, email, password_hash, role, provider, first_name, last_name
                     FROM users WHERE email = ?1",
                    params![email],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            password_hash: row.get(2)?,
                            role: Role::parse(&row.get::<_, String>(3)?),
                            provider: Provider::parse(&row.get::<_, String>(4)?),
                            first_name: row.get(5)?,
                            last_name: row.get(6)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Insert a brand
    pub fn insert_brand(&self, brand: &Brand) -> Result<()> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().timestamp();
            conn.execute(
                "INSERT INTO brands (id, name, slug, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![brand.id, brand.name, brand.slug, brand.is_active, now],
            )?;
            Ok(())
        })
    }

    /// Insert a category
    pub fn insert_category(&self, category: &Category) -> Result<()> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().timestamp();
            conn.execute(
                "INSERT INTO categories (id, name, slug, is_active, products, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    category.id,
                    category.name,
                    category.slug,
                    category.is_active,
                    serde_json::to_string(&category.products)?,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Insert a product
    pub fn insert_product(&self, product: &Product) -> Result<()> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().timestamp();
            conn.execute(
                "INSERT INTO products (id, sku, name, description, price, quantity, is_active,
                                       brand, category, image_url, rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    product.id,
                    product.sku,
                    product.name,
                    product.description,
                    product.price,
                    product.quantity,
                    product.is_active,
                    product.brand,
                    product.category,
                    product.image_url,
                    product.rating,
                    now,
                ],
            )?;
            debug!("Inserted product {} ({})", product.name, product.sku);
            Ok(())
        })
    }

    /// Append a product id to a category's back-reference list
    pub fn attach_product(&self, category_id: &str, product_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT products FROM categories WHERE id = ?1",
                    params![category_id],
                    |row| row.get(0),
                )
                .optional()?;

            let raw = raw.ok_or_else(|| Error::NotFound {
                kind: "category".into(),
                id: category_id.into(),
            })?;

            let mut products: Vec<String> = serde_json::from_str(&raw)?;
            if !products.iter().any(|p| p == product_id) {
                products.push(product_id.to_string());
            }

            conn.execute(
                "UPDATE categories SET products = ?1 WHERE id = ?2",
                params![serde_json::to_string(&products)?, category_id],
            )?;
            Ok(())
        })
    }

    /// List active products with pagination metadata
    pub fn list_products(&self, sort: ProductSort, page: u64, limit: u64) -> Result<ProductPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        self.with_conn(|conn| {
            let count: u64 = conn.query_row(
                "SELECT COUNT(*) FROM products WHERE is_active = 1",
                [],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT id, sku, name, description, price, quantity, is_active,
                        brand, category, image_url, rating
                 FROM products WHERE is_active = 1
                 ORDER BY {} LIMIT ?1 OFFSET ?2",
                sort.as_sql()
            ))?;

            let rows = stmt.query_map(params![limit, (page - 1) * limit], |row| {
                Ok(Product {
                    id: row.get(0)?,
                    sku: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    price: row.get(4)?,
                    quantity: row.get(5)?,
                    is_active: row.get(6)?,
                    brand: row.get(7)?,
                    category: row.get(8)?,
                    image_url: row.get(9)?,
                    rating: row.get(10)?,
                })
            })?;

            let mut products = Vec::new();
            for row in rows {
                products.push(row?);
            }

            Ok(ProductPage {
                products,
                total_pages: count.div_ceil(limit),
                current_page: page,
                count,
            })
        })
    }

    // ========================================================================
    // Fixture support
    // ========================================================================

    /// Names of all user tables in the schema
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut names = Vec::new();
            for row in rows {
                names.push(row?);
            }
            Ok(names)
        })
    }

    /// Number of rows currently in a table
    pub fn table_count(&self, table: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: u64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(count)
        })
    }

    /// Delete every row of every table. A failure in one table is recorded
    /// in the report and does not stop the pass over the remaining tables.
    pub fn purge_all(&self) -> Result<PurgeReport> {
        let tables = self.table_names()?;
        let mut report = PurgeReport::default();

        for table in tables {
            let outcome = self.with_conn(|conn| {
                let rows = conn.execute(&format!("DELETE FROM {}", table), [])?;
                Ok(rows)
            });
            match outcome {
                Ok(rows) => report.purged.push((table, rows)),
                Err(Error::ConnectionClosed) => return Err(Error::ConnectionClosed),
                Err(e) => report.failures.push((table, e.to_string())),
            }
        }

        Ok(report)
    }
}

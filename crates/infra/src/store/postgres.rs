//! Postgres-backed store.
//!
//! Implements the credential, franchise and order contracts over a single
//! connection pool. Role assignments reference franchises with
//! `ON DELETE CASCADE`, so deleting a franchise removes its admin
//! assignments in the same statement.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | Any other | `Unavailable` |
//! | PoolClosed / Io / Other | N/A | `Unavailable` |

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use slicehouse_auth::{CredentialStore, NewUser, Role, RoleAssignment, StoreError, TokenId, User, UserPatch};
use slicehouse_core::{FranchiseId, MenuItemId, OrderId, StoreId, UserId};
use slicehouse_franchises::{Franchise, FranchiseAdmin, FranchiseRepository, Store};
use slicehouse_orders::{MenuItem, NewMenuItem, NewOrder, Order, OrderItem, OrderRepository};

/// Schema statements, applied in order by [`PostgresStore::migrate`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS franchises (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        object_id BIGINT NULL REFERENCES franchises(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS user_roles_user_idx ON user_roles (user_id)",
    "CREATE INDEX IF NOT EXISTS user_roles_object_idx ON user_roles (object_id)",
    r#"
    CREATE TABLE IF NOT EXISTS stores (
        id BIGSERIAL PRIMARY KEY,
        franchise_id BIGINT NOT NULL REFERENCES franchises(id) ON DELETE CASCADE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_tokens (
        token_id UUID PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS auth_tokens_expiry_idx ON auth_tokens (expires_at)",
    r#"
    CREATE TABLE IF NOT EXISTS menu (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        image TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS diner_orders (
        id BIGSERIAL PRIMARY KEY,
        diner_id BIGINT NOT NULL,
        franchise_id BIGINT NOT NULL,
        store_id BIGINT NOT NULL,
        date TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS diner_orders_diner_idx ON diner_orders (diner_id)",
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id BIGSERIAL PRIMARY KEY,
        order_id BIGINT NOT NULL REFERENCES diner_orders(id) ON DELETE CASCADE,
        menu_id BIGINT NOT NULL,
        description TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )
    "#,
];

/// Postgres-backed implementation of every store contract.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is `Send + Sync`. Multi-row writes
/// (user + roles, order + items) run in one transaction each.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tracing::info!(statements = SCHEMA.len(), "database schema ensured");
        Ok(())
    }

    async fn roles_for(&self, user_ids: &[i64]) -> Result<HashMap<i64, Vec<RoleAssignment>>, StoreError> {
        let rows = sqlx::query(
            "SELECT user_id, role, object_id FROM user_roles WHERE user_id = ANY($1) ORDER BY id",
        )
        .bind(user_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("roles_for", e))?;

        let mut out: HashMap<i64, Vec<RoleAssignment>> = HashMap::new();
        for row in rows {
            let user_id: i64 = get(&row, "user_id")?;
            out.entry(user_id).or_default().push(role_from_row(&row)?);
        }
        Ok(out)
    }

    async fn user_from_row(&self, row: PgRow) -> Result<User, StoreError> {
        let id: i64 = get(&row, "id")?;
        let roles = self.roles_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(User {
            id: UserId::new(id),
            name: get(&row, "name")?,
            email: get(&row, "email")?,
            password_digest: get(&row, "password")?,
            roles,
        })
    }

    /// Load franchises (all when `ids` is `None`) with admins and stores.
    async fn load_franchises(&self, ids: Option<Vec<i64>>) -> Result<Vec<Franchise>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name FROM franchises WHERE ($1::BIGINT[] IS NULL OR id = ANY($1)) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_franchises", e))?;

        let mut franchises = Vec::with_capacity(rows.len());
        for row in &rows {
            franchises.push(Franchise {
                id: FranchiseId::new(get(row, "id")?),
                name: get(row, "name")?,
                admins: Vec::new(),
                stores: Vec::new(),
            });
        }
        if franchises.is_empty() {
            return Ok(franchises);
        }
        let loaded: Vec<i64> = franchises.iter().map(|f| f.id.get()).collect();

        let admin_rows = sqlx::query(
            r#"
            SELECT r.object_id, u.id, u.name, u.email
            FROM user_roles r JOIN users u ON u.id = r.user_id
            WHERE r.role = $1 AND r.object_id = ANY($2)
            ORDER BY r.id
            "#,
        )
        .bind(Role::FranchiseAdmin.as_str())
        .bind(&loaded)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_franchise_admins", e))?;

        let store_rows = sqlx::query(
            "SELECT id, franchise_id, name FROM stores WHERE franchise_id = ANY($1) ORDER BY id",
        )
        .bind(&loaded)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_stores", e))?;

        let index: HashMap<i64, usize> = loaded.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for row in &admin_rows {
            let franchise: i64 = get(row, "object_id")?;
            if let Some(&i) = index.get(&franchise) {
                franchises[i].admins.push(FranchiseAdmin {
                    id: UserId::new(get(row, "id")?),
                    name: get(row, "name")?,
                    email: get(row, "email")?,
                });
            }
        }
        for row in &store_rows {
            let store = store_from_row(row)?;
            if let Some(&i) = index.get(&store.franchise_id.get()) {
                franchises[i].stores.push(store);
            }
        }
        Ok(franchises)
    }

    async fn begin(&self, operation: &str) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool.begin().await.map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    #[instrument(skip(self, email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        match row {
            Some(row) => Ok(Some(self.user_from_row(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, password FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;
        match row {
            Some(row) => Ok(Some(self.user_from_row(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, user))]
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let roles = if user.roles.is_empty() {
            vec![RoleAssignment::diner()]
        } else {
            user.roles
        };

        let mut tx = self.begin("insert_user").await?;
        let id: i64 = sqlx::query_scalar("INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id")
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_digest)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;

        for role in &roles {
            insert_role(&mut tx, id, role).await?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(User {
            id: UserId::new(id),
            name: user.name,
            email: user.email,
            password_digest: user.password_digest,
            roles,
        })
    }

    #[instrument(skip(self, patch))]
    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password = COALESCE($4, password)
            WHERE id = $1
            RETURNING id, name, email, password
            "#,
        )
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.password)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?
        .ok_or(StoreError::NotFound("user"))?;

        self.user_from_row(row).await
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn register_token_active(
        &self,
        id: TokenId,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO auth_tokens (token_id, user_id, expires_at) VALUES ($1, $2, $3) ON CONFLICT (token_id) DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(user.get())
        .bind(expires_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("register_token_active", e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_token(&self, id: TokenId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM auth_tokens WHERE token_id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_token", e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_token_active(&self, id: TokenId) -> Result<bool, StoreError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM auth_tokens WHERE token_id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("is_token_active", e))
    }

    #[instrument(skip(self))]
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("purge_expired_tokens", e))?;
        Ok(result.rows_affected() as usize)
    }

    #[instrument(skip(self))]
    async fn find_franchise_admins(&self, franchise: FranchiseId) -> Result<HashSet<UserId>, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT user_id FROM user_roles WHERE role = $1 AND object_id = $2")
            .bind(Role::FranchiseAdmin.as_str())
            .bind(franchise.get())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_franchise_admins", e))?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }

    #[instrument(skip(self))]
    async fn find_store_franchise(&self, store: StoreId) -> Result<Option<FranchiseId>, StoreError> {
        let id: Option<i64> = sqlx::query_scalar("SELECT franchise_id FROM stores WHERE id = $1")
            .bind(store.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_store_franchise", e))?;
        Ok(id.map(FranchiseId::new))
    }
}

#[async_trait]
impl FranchiseRepository for PostgresStore {
    async fn list_franchises(&self) -> Result<Vec<Franchise>, StoreError> {
        self.load_franchises(None).await
    }

    async fn find_franchise(&self, id: FranchiseId) -> Result<Option<Franchise>, StoreError> {
        Ok(self.load_franchises(Some(vec![id.get()])).await?.pop())
    }

    async fn franchises_administered_by(&self, user: UserId) -> Result<Vec<Franchise>, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT object_id FROM user_roles WHERE user_id = $1 AND role = $2 AND object_id IS NOT NULL",
        )
        .bind(user.get())
        .bind(Role::FranchiseAdmin.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("franchises_administered_by", e))?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load_franchises(Some(ids)).await
    }

    #[instrument(skip(self))]
    async fn create_franchise(&self, name: &str, admins: &[UserId]) -> Result<Franchise, StoreError> {
        let mut tx = self.begin("create_franchise").await?;
        let id: i64 = sqlx::query_scalar("INSERT INTO franchises (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_franchise", e))?;

        let franchise = FranchiseId::new(id);
        for admin in admins {
            insert_role(&mut tx, admin.get(), &RoleAssignment::franchise_admin(franchise)).await?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("create_franchise", e))?;

        self.find_franchise(franchise)
            .await?
            .ok_or(StoreError::NotFound("franchise"))
    }

    #[instrument(skip(self))]
    async fn delete_franchise(&self, id: FranchiseId) -> Result<(), StoreError> {
        let mut tx = self.begin("delete_franchise").await?;
        sqlx::query("DELETE FROM franchises WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_franchise", e))?;

        // Users whose only assignments were scoped to this franchise.
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, object_id)
            SELECT u.id, $1, NULL FROM users u
            WHERE NOT EXISTS (SELECT 1 FROM user_roles r WHERE r.user_id = u.id)
            "#,
        )
        .bind(Role::Diner.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_franchise", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("delete_franchise", e))
    }

    #[instrument(skip(self))]
    async fn create_store(&self, franchise: FranchiseId, name: &str) -> Result<Store, StoreError> {
        let id: i64 = sqlx::query_scalar("INSERT INTO stores (franchise_id, name) VALUES ($1, $2) RETURNING id")
            .bind(franchise.get())
            .bind(name)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_store", e))?;
        Ok(Store {
            id: StoreId::new(id),
            franchise_id: franchise,
            name: name.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn delete_store(&self, franchise: FranchiseId, store: StoreId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM stores WHERE franchise_id = $1 AND id = $2")
            .bind(franchise.get())
            .bind(store.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_store", e))?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn menu(&self) -> Result<Vec<MenuItem>, StoreError> {
        let rows = sqlx::query("SELECT id, title, description, image, price FROM menu ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("menu", e))?;
        rows.iter().map(menu_item_from_row).collect()
    }

    async fn find_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError> {
        let row = sqlx::query("SELECT id, title, description, image, price FROM menu WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_menu_item", e))?;
        row.as_ref().map(menu_item_from_row).transpose()
    }

    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        let row = sqlx::query(
            "INSERT INTO menu (title, description, image, price) VALUES ($1, $2, $3, $4) RETURNING id, title, description, image, price",
        )
        .bind(item.title.unwrap_or_default())
        .bind(item.description.unwrap_or_default())
        .bind(item.image.unwrap_or_default())
        .bind(item.price.unwrap_or_default())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_menu_item", e))?;
        menu_item_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn orders_for_diner(&self, diner: UserId, offset: usize, limit: usize) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, diner_id, franchise_id, store_id, date FROM diner_orders
            WHERE diner_id = $1 ORDER BY id DESC OFFSET $2 LIMIT $3
            "#,
        )
        .bind(diner.get())
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_diner", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(Order {
                id: OrderId::new(get(row, "id")?),
                diner_id: UserId::new(get(row, "diner_id")?),
                franchise_id: FranchiseId::new(get(row, "franchise_id")?),
                store_id: StoreId::new(get(row, "store_id")?),
                date: get(row, "date")?,
                items: Vec::new(),
            });
        }
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id.get()).collect();
        let item_rows = sqlx::query(
            "SELECT id, order_id, menu_id, description, price FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_diner", e))?;

        let index: HashMap<i64, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for row in &item_rows {
            let order_id: i64 = get(row, "order_id")?;
            if let Some(&i) = index.get(&order_id) {
                orders[i].items.push(order_item_from_row(row)?);
            }
        }
        Ok(orders)
    }

    #[instrument(skip(self, order))]
    async fn add_order(&self, diner: UserId, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.begin("add_order").await?;
        let row = sqlx::query(
            "INSERT INTO diner_orders (diner_id, franchise_id, store_id, date) VALUES ($1, $2, $3, now()) RETURNING id, date",
        )
        .bind(diner.get())
        .bind(order.franchise_id.get())
        .bind(order.store_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("add_order", e))?;
        let order_id: i64 = get(&row, "id")?;
        let date: DateTime<Utc> = get(&row, "date")?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            let item_id: i64 = sqlx::query_scalar(
                "INSERT INTO order_items (order_id, menu_id, description, price) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(order_id)
            .bind(item.menu_id.get())
            .bind(&item.description)
            .bind(item.price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add_order", e))?;

            items.push(OrderItem {
                id: item_id,
                menu_id: item.menu_id,
                description: item.description,
                price: item.price,
            });
        }
        tx.commit().await.map_err(|e| map_sqlx_error("add_order", e))?;

        Ok(Order {
            id: OrderId::new(order_id),
            diner_id: diner,
            franchise_id: order.franchise_id,
            store_id: order.store_id,
            date,
            items,
        })
    }
}

async fn insert_role(
    tx: &mut Transaction<'static, Postgres>,
    user_id: i64,
    role: &RoleAssignment,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO user_roles (user_id, role, object_id) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(role.role.as_str())
        .bind(role.object_id.map(|f| f.get()))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_role", e))?;
    Ok(())
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(|e| map_sqlx_error(column, e))
}

fn role_from_row(row: &PgRow) -> Result<RoleAssignment, StoreError> {
    let role: String = get(row, "role")?;
    let object_id: Option<i64> = get(row, "object_id")?;
    let role: Role = role
        .parse()
        .map_err(|e: String| StoreError::Unavailable(format!("corrupt role row: {e}")))?;
    Ok(RoleAssignment {
        role,
        object_id: object_id.map(FranchiseId::new),
    })
}

fn store_from_row(row: &PgRow) -> Result<Store, StoreError> {
    Ok(Store {
        id: StoreId::new(get(row, "id")?),
        franchise_id: FranchiseId::new(get(row, "franchise_id")?),
        name: get(row, "name")?,
    })
}

fn menu_item_from_row(row: &PgRow) -> Result<MenuItem, StoreError> {
    Ok(MenuItem {
        id: MenuItemId::new(get(row, "id")?),
        title: get(row, "title")?,
        description: get(row, "description")?,
        image: get(row, "image")?,
        price: get(row, "price")?,
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    Ok(OrderItem {
        id: get(row, "id")?,
        menu_id: MenuItemId::new(get(row, "menu_id")?),
        description: get(row, "description")?,
        price: get(row, "price")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound("referenced record"),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {operation}")),
        other => StoreError::Unavailable(format!("{operation}: {other}")),
    }
}

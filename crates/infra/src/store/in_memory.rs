use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use slicehouse_auth::{CredentialStore, NewUser, RoleAssignment, StoreError, TokenId, User, UserPatch};
use slicehouse_core::{FranchiseId, MenuItemId, OrderId, StoreId, UserId};
use slicehouse_franchises::{Franchise, FranchiseAdmin, FranchiseRepository, Store};
use slicehouse_orders::{MenuItem, NewMenuItem, NewOrder, Order, OrderItem, OrderRepository};

#[derive(Debug, Clone, Copy)]
struct ActiveToken {
    user: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    tokens: HashMap<TokenId, ActiveToken>,
    franchises: BTreeMap<FranchiseId, String>,
    stores: BTreeMap<StoreId, Store>,
    menu: BTreeMap<MenuItemId, MenuItem>,
    orders: BTreeMap<OrderId, Order>,
    last_id: i64,
}

impl State {
    /// Ids are shared across tables; only uniqueness matters.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn franchise(&self, id: FranchiseId) -> Option<Franchise> {
        let name = self.franchises.get(&id)?;
        let admins = self
            .users
            .values()
            .filter(|u| u.administers(id))
            .map(|u| FranchiseAdmin {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .collect();
        let stores = self
            .stores
            .values()
            .filter(|s| s.franchise_id == id)
            .cloned()
            .collect();

        Some(Franchise {
            id,
            name: name.clone(),
            admins,
            stores,
        })
    }
}

/// In-memory store for tests/dev.
///
/// One `RwLock` guards all tables, so every operation is atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registry entries (active or not yet purged).
    pub fn registered_tokens(&self) -> usize {
        self.read().map(|s| s.tokens.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.write()?;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }

        let id = UserId::new(state.next_id());
        let user = User {
            id,
            name: user.name,
            email: user.email,
            password_digest: user.password_digest,
            roles: if user.roles.is_empty() {
                vec![RoleAssignment::diner()]
            } else {
                user.roles
            },
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, StoreError> {
        let mut state = self.write()?;
        if let Some(email) = &patch.email {
            if state.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict(format!("email {email} already registered")));
            }
        }

        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound("user"))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(digest) = patch.password {
            user.password_digest = digest;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.users.remove(&id).ok_or(StoreError::NotFound("user"))?;
        state.tokens.retain(|_, t| t.user != id);
        Ok(())
    }

    async fn register_token_active(
        &self,
        id: TokenId,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.write()?.tokens.insert(id, ActiveToken { user, expires_at });
        Ok(())
    }

    async fn revoke_token(&self, id: TokenId) -> Result<(), StoreError> {
        self.write()?.tokens.remove(&id);
        Ok(())
    }

    async fn is_token_active(&self, id: TokenId) -> Result<bool, StoreError> {
        Ok(self.read()?.tokens.contains_key(&id))
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut state = self.write()?;
        let before = state.tokens.len();
        state.tokens.retain(|_, t| t.expires_at > now);
        Ok(before - state.tokens.len())
    }

    async fn find_franchise_admins(&self, franchise: FranchiseId) -> Result<HashSet<UserId>, StoreError> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .filter(|u| u.administers(franchise))
            .map(|u| u.id)
            .collect())
    }

    async fn find_store_franchise(&self, store: StoreId) -> Result<Option<FranchiseId>, StoreError> {
        Ok(self.read()?.stores.get(&store).map(|s| s.franchise_id))
    }
}

#[async_trait]
impl FranchiseRepository for InMemoryStore {
    async fn list_franchises(&self) -> Result<Vec<Franchise>, StoreError> {
        let state = self.read()?;
        Ok(state
            .franchises
            .keys()
            .filter_map(|id| state.franchise(*id))
            .collect())
    }

    async fn find_franchise(&self, id: FranchiseId) -> Result<Option<Franchise>, StoreError> {
        Ok(self.read()?.franchise(id))
    }

    async fn franchises_administered_by(&self, user: UserId) -> Result<Vec<Franchise>, StoreError> {
        let state = self.read()?;
        let Some(user) = state.users.get(&user) else {
            return Ok(Vec::new());
        };
        Ok(user
            .administered_franchises()
            .into_iter()
            .filter_map(|id| state.franchise(id))
            .collect())
    }

    async fn create_franchise(&self, name: &str, admins: &[UserId]) -> Result<Franchise, StoreError> {
        let mut state = self.write()?;
        if admins.iter().any(|id| !state.users.contains_key(id)) {
            return Err(StoreError::NotFound("user"));
        }
        if state.franchises.values().any(|existing| existing == name) {
            return Err(StoreError::Conflict(format!("franchise {name} already exists")));
        }

        let id = FranchiseId::new(state.next_id());
        state.franchises.insert(id, name.to_string());
        for admin in admins {
            if let Some(user) = state.users.get_mut(admin) {
                user.roles.push(RoleAssignment::franchise_admin(id));
            }
        }

        state.franchise(id).ok_or(StoreError::NotFound("franchise"))
    }

    async fn delete_franchise(&self, id: FranchiseId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.franchises.remove(&id).is_none() {
            return Ok(());
        }
        state.stores.retain(|_, s| s.franchise_id != id);
        for user in state.users.values_mut() {
            user.roles.retain(|r| !r.administers(id));
            if user.roles.is_empty() {
                user.roles.push(RoleAssignment::diner());
            }
        }
        Ok(())
    }

    async fn create_store(&self, franchise: FranchiseId, name: &str) -> Result<Store, StoreError> {
        let mut state = self.write()?;
        if !state.franchises.contains_key(&franchise) {
            return Err(StoreError::NotFound("franchise"));
        }

        let store = Store {
            id: StoreId::new(state.next_id()),
            franchise_id: franchise,
            name: name.to_string(),
        };
        state.stores.insert(store.id, store.clone());
        Ok(store)
    }

    async fn delete_store(&self, franchise: FranchiseId, store: StoreId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.stores.get(&store).is_some_and(|s| s.franchise_id == franchise) {
            state.stores.remove(&store);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn menu(&self) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self.read()?.menu.values().cloned().collect())
    }

    async fn find_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.read()?.menu.get(&id).cloned())
    }

    async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        let mut state = self.write()?;
        let item = MenuItem {
            id: MenuItemId::new(state.next_id()),
            title: item.title.unwrap_or_default(),
            description: item.description.unwrap_or_default(),
            image: item.image.unwrap_or_default(),
            price: item.price.unwrap_or_default(),
        };
        state.menu.insert(item.id, item.clone());
        Ok(item)
    }

    async fn orders_for_diner(&self, diner: UserId, offset: usize, limit: usize) -> Result<Vec<Order>, StoreError> {
        let state = self.read()?;
        Ok(state
            .orders
            .values()
            .rev()
            .filter(|o| o.diner_id == diner)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn add_order(&self, diner: UserId, order: NewOrder) -> Result<Order, StoreError> {
        let mut state = self.write()?;
        let id = OrderId::new(state.next_id());
        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            items.push(OrderItem {
                id: state.next_id(),
                menu_id: item.menu_id,
                description: item.description,
                price: item.price,
            });
        }

        let order = Order {
            id,
            diner_id: diner,
            franchise_id: order.franchise_id,
            store_id: order.store_id,
            date: Utc::now(),
            items,
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "pizza diner".to_string(),
            email: email.to_string(),
            password_digest: "digest".to_string(),
            roles: vec![RoleAssignment::diner()],
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store.insert_user(new_user("d@jwt.com")).await.unwrap();

        let err = store.insert_user(new_user("d@jwt.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn purge_drops_only_expired_tokens() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("d@jwt.com")).await.unwrap();
        let now = Utc::now();

        let live = TokenId::new();
        let stale = TokenId::new();
        store.register_token_active(live, user.id, now + Duration::hours(1)).await.unwrap();
        store.register_token_active(stale, user.id, now - Duration::seconds(1)).await.unwrap();

        assert_eq!(store.purge_expired_tokens(now).await.unwrap(), 1);
        assert!(store.is_token_active(live).await.unwrap());
        assert!(!store.is_token_active(stale).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_franchise_cascades_stores_and_assignments() {
        let store = InMemoryStore::new();
        let admin = store.insert_user(new_user("f@jwt.com")).await.unwrap();

        let franchise = store.create_franchise("pizzaPocket", &[admin.id]).await.unwrap();
        let shop = store.create_store(franchise.id, "SLC").await.unwrap();
        assert_eq!(store.find_store_franchise(shop.id).await.unwrap(), Some(franchise.id));
        assert!(store.find_franchise_admins(franchise.id).await.unwrap().contains(&admin.id));

        store.delete_franchise(franchise.id).await.unwrap();

        assert_eq!(store.find_store_franchise(shop.id).await.unwrap(), None);
        let reloaded = store.find_user_by_id(admin.id).await.unwrap().unwrap();
        assert_eq!(reloaded.roles, vec![RoleAssignment::diner()]);
    }

    #[tokio::test]
    async fn sole_franchise_admin_falls_back_to_diner() {
        let store = InMemoryStore::new();
        let mut seeded = new_user("only@jwt.com");
        seeded.roles = vec![];
        let user = store.insert_user(seeded).await.unwrap();
        assert_eq!(user.roles, vec![RoleAssignment::diner()]);

        let franchise = store.create_franchise("solo", &[user.id]).await.unwrap();
        store.write().unwrap().users.get_mut(&user.id).unwrap().roles =
            vec![RoleAssignment::franchise_admin(franchise.id)];

        store.delete_franchise(franchise.id).await.unwrap();
        let reloaded = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.roles, vec![RoleAssignment::diner()]);
    }

    #[tokio::test]
    async fn store_delete_ignores_foreign_franchise() {
        let store = InMemoryStore::new();
        let a = store.create_franchise("a", &[]).await.unwrap();
        let b = store.create_franchise("b", &[]).await.unwrap();
        let shop = store.create_store(a.id, "A1").await.unwrap();

        store.delete_store(b.id, shop.id).await.unwrap();
        assert_eq!(store.find_store_franchise(shop.id).await.unwrap(), Some(a.id));
    }
}

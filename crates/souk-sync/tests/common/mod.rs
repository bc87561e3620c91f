//! Scripted provider and in-memory store for reconciliation tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use souk_core::Role;
use souk_db::models::User;
use souk_db::store::{IdentityStore, StoreError, StoreResult};
use souk_provider::{
    IdentityProvider, NewProviderUser, ProviderError, ProviderResult, ProviderUser,
    ProviderUserUpdate, UserSignals,
};
use uuid::Uuid;

#[derive(Default)]
struct MockState {
    users: Vec<ProviderUser>,
    /// Scripted effective-role responses per user; the last entry repeats.
    effective: HashMap<String, VecDeque<Vec<String>>>,
    assignable: HashMap<String, Vec<String>>,
    signals: HashMap<String, UserSignals>,
    conflict_usernames: HashSet<String>,
    unavailable: bool,
    next_id: u32,
    created: Vec<NewProviderUser>,
    updates: Vec<(String, ProviderUserUpdate)>,
    credentials: Vec<(String, String, bool)>,
    assigned_roles: Vec<(String, String)>,
    removed_roles: Vec<(String, Vec<String>)>,
    deleted: Vec<String>,
}

/// Scripted identity provider.
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
    /// Artificial latency on `list_users`, for in-flight guard tests.
    pub list_delay: Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: &str, username: &str, email: &str, first: &str, last: &str) {
        self.state.lock().unwrap().users.push(ProviderUser {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            enabled: true,
        });
    }

    pub fn remove_user(&self, id: &str) {
        self.state.lock().unwrap().users.retain(|u| u.id != id);
    }

    pub fn set_email(&self, id: &str, email: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.email = email.to_string();
        }
    }

    /// Steady effective-role response.
    pub fn set_effective(&self, id: &str, roles: &[&str]) {
        self.script_effective(id, vec![roles.iter().map(|r| r.to_string()).collect()]);
    }

    /// Scripted effective-role responses; the last one repeats.
    pub fn script_effective(&self, id: &str, responses: Vec<Vec<String>>) {
        self.state
            .lock()
            .unwrap()
            .effective
            .insert(id.to_string(), responses.into_iter().collect());
    }

    pub fn set_assignable(&self, id: &str, roles: &[&str]) {
        self.state.lock().unwrap().assignable.insert(
            id.to_string(),
            roles.iter().map(|r| r.to_string()).collect(),
        );
    }

    pub fn set_groups(&self, id: &str, groups: &[&str]) {
        let signals = UserSignals {
            attributes: HashMap::new(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        };
        self.state.lock().unwrap().signals.insert(id.to_string(), signals);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn set_conflict_username(&self, username: &str) {
        self.state
            .lock()
            .unwrap()
            .conflict_usernames
            .insert(username.to_string());
    }

    pub fn created_usernames(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .created
            .iter()
            .map(|u| u.username.clone())
            .collect()
    }

    pub fn credentials(&self) -> Vec<(String, String, bool)> {
        self.state.lock().unwrap().credentials.clone()
    }

    pub fn assigned_roles(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().assigned_roles.clone()
    }

    pub fn removed_roles(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().removed_roles.clone()
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates.len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn has_user(&self, id: &str) -> bool {
        self.state.lock().unwrap().users.iter().any(|u| u.id == id)
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn list_users(&self) -> ProviderResult<Vec<ProviderUser>> {
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(ProviderError::Unavailable("connection refused".into()));
        }
        Ok(state.users.clone())
    }

    async fn list_effective_roles(&self, provider_id: &str) -> ProviderResult<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        let Some(queue) = state.effective.get_mut(provider_id) else {
            return Ok(Vec::new());
        };
        let response = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(response)
    }

    async fn list_assignable_roles(&self, provider_id: &str) -> ProviderResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.assignable.get(provider_id).cloned().unwrap_or_default())
    }

    async fn get_attributes_and_groups(&self, provider_id: &str) -> ProviderResult<UserSignals> {
        let state = self.state.lock().unwrap();
        Ok(state.signals.get(provider_id).cloned().unwrap_or_default())
    }

    async fn create_user(&self, user: &NewProviderUser) -> ProviderResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.conflict_usernames.contains(&user.username) {
            return Err(ProviderError::Conflict("username exists".into()));
        }
        state.next_id += 1;
        let id = format!("mock-{}", state.next_id);
        state.created.push(user.clone());
        state.users.push(ProviderUser {
            id: id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            enabled: true,
        });
        Ok(id)
    }

    async fn update_user(
        &self,
        provider_id: &str,
        update: &ProviderUserUpdate,
    ) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == provider_id) {
            user.first_name = update.first_name.clone();
            user.last_name = update.last_name.clone();
            user.email = update.email.clone();
        }
        state.updates.push((provider_id.to_string(), update.clone()));
        Ok(())
    }

    async fn set_credential(
        &self,
        provider_id: &str,
        password: &str,
        temporary: bool,
    ) -> ProviderResult<()> {
        self.state.lock().unwrap().credentials.push((
            provider_id.to_string(),
            password.to_string(),
            temporary,
        ));
        Ok(())
    }

    async fn assign_realm_role(&self, provider_id: &str, role_name: &str) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .assigned_roles
            .push((provider_id.to_string(), role_name.to_string()));
        // Grants land in the assigned set immediately; effective-set
        // propagation stays under test control.
        state
            .assignable
            .entry(provider_id.to_string())
            .or_default()
            .push(role_name.to_string());
        Ok(())
    }

    async fn remove_realm_roles(
        &self,
        provider_id: &str,
        role_names: &[String],
    ) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(current) = state.assignable.get_mut(provider_id) {
            current.retain(|name| !role_names.contains(name));
        }
        state
            .removed_roles
            .push((provider_id.to_string(), role_names.to_vec()));
        Ok(())
    }

    async fn search_user_by_username(
        &self,
        username: &str,
    ) -> ProviderResult<Option<ProviderUser>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn delete_user(&self, provider_id: &str) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.id != provider_id);
        if state.users.len() == before {
            return Err(ProviderError::NotFound("no such user".into()));
        }
        state.deleted.push(provider_id.to_string());
        Ok(())
    }
}

/// In-memory identity store counting every write.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<Uuid, User>>,
    saves: AtomicUsize,
    deletes: AtomicUsize,
    fail_save_usernames: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make saves for this username fail with a uniqueness conflict.
    pub fn fail_saves_for(&self, username: &str) {
        self.fail_save_usernames
            .lock()
            .unwrap()
            .insert(username.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_save_usernames.lock().unwrap().clear();
    }

    /// Total writes (saves plus deletes) since the last reset.
    pub fn writes(&self) -> usize {
        self.saves.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.saves.store(0, Ordering::SeqCst);
        self.deletes.store(0, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get_by_username(&self, username: &str) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.provider_id == provider_id)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.get_by_username(username))
    }

    async fn find_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    async fn save(&self, user: &User) -> StoreResult<()> {
        if self
            .fail_save_usernames
            .lock()
            .unwrap()
            .contains(&user.username)
        {
            return Err(StoreError::Conflict {
                field: "username".to_string(),
            });
        }
        self.rows.lock().unwrap().insert(user.id, user.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let removed = self.rows.lock().unwrap().remove(&id).is_some();
        if removed {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.get_by_username(username).is_some())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .any(|u| u.email == email))
    }
}

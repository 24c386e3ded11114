/**
 * In-Memory Stores
 *
 * Process-local implementations of every repository contract. They back the
 * server when `DATABASE_URL` is unset and drive the engine tests.
 *
 * Each store guards its rows with a `std::sync::Mutex`; no lock is held
 * across an `.await`. A poisoned lock is recovered rather than propagated,
 * since every critical section leaves the rows consistent.
 */

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::backend::auth::ledger::{LoginAttempt, LoginAttemptLedger, RevokedToken, TokenLedger};
use crate::backend::auth::users::{NewUser, User, UserRepository};
use crate::backend::content::files::FileStore;
use crate::backend::content::{ContentRecord, ContentStore, ContentType, NewContent};
use crate::backend::invites::model::{Invite, InviteRepository, NewInvite};
use crate::backend::store::{ContentId, InviteId, StoreError, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Table<T> {
    next_id: i64,
    rows: HashMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: HashMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Users keyed by id
#[derive(Default)]
pub struct MemoryUserRepository {
    table: Mutex<Table<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        lock(&self.table).rows.values().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.table).rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find(|u| u.email == email))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find(|u| u.username == username))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = lock(&self.table);
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        if table.rows.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }

        let now = user.created_at;
        let mut created = User {
            id: table.allocate(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: String::new(),
            last_name: String::new(),
            university: String::new(),
            department: String::new(),
            class: String::new(),
            created_at: now,
            updated_at: now,
        };
        created.apply_profile(user.profile);
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut table = lock(&self.table);
        let clash = table.rows.values().any(|u| {
            u.id != user.id && (u.email == user.email || u.username == user.username)
        });
        if clash {
            return Err(StoreError::Conflict("users".to_string()));
        }
        if let Some(row) = table.rows.get_mut(&user.id) {
            *row = user.clone();
        }
        Ok(())
    }
}

/// Revoked tokens keyed by the token string
#[derive(Default)]
pub struct MemoryTokenLedger {
    rows: Mutex<HashMap<String, RevokedToken>>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenLedger for MemoryTokenLedger {
    async fn revoke(&self, token: &RevokedToken) -> Result<(), StoreError> {
        lock(&self.rows)
            .entry(token.token.clone())
            .or_insert_with(|| token.clone());
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.rows).contains_key(token))
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = lock(&self.rows);
        let len = rows.len();
        rows.retain(|_, row| row.expires_at >= before);
        Ok((len - rows.len()) as u64)
    }
}

/// Append-only login audit log
#[derive(Default)]
pub struct MemoryLoginAttemptLedger {
    rows: Mutex<Vec<LoginAttempt>>,
}

impl MemoryLoginAttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> Vec<LoginAttempt> {
        lock(&self.rows).clone()
    }
}

#[async_trait]
impl LoginAttemptLedger for MemoryLoginAttemptLedger {
    async fn record(&self, attempt: &LoginAttempt) -> Result<(), StoreError> {
        lock(&self.rows).push(attempt.clone());
        Ok(())
    }

    async fn count_failures_since(
        &self,
        ip: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count = lock(&self.rows)
            .iter()
            .filter(|a| a.ip == ip && a.email == email && !a.successful && a.created_at > since)
            .count();
        Ok(count as u64)
    }

    async fn delete_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut rows = lock(&self.rows);
        let len = rows.len();
        rows.retain(|a| a.created_at >= before);
        Ok((len - rows.len()) as u64)
    }
}

/// Invites keyed by id
#[derive(Default)]
pub struct MemoryInviteRepository {
    table: Mutex<Table<Invite>>,
}

impl MemoryInviteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InviteRepository for MemoryInviteRepository {
    async fn find_by_id(&self, id: InviteId) -> Result<Option<Invite>, StoreError> {
        Ok(lock(&self.table).rows.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invite>, StoreError> {
        Ok(lock(&self.table)
            .rows
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn find_by_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<Vec<Invite>, StoreError> {
        let mut invites: Vec<Invite> = lock(&self.table)
            .rows
            .values()
            .filter(|i| i.content_id == content_id && i.content_type == content_type)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(invites)
    }

    async fn create(&self, invite: NewInvite) -> Result<Invite, StoreError> {
        let mut table = lock(&self.table);
        if table.rows.values().any(|i| i.token == invite.token) {
            return Err(StoreError::Conflict("invites_token_key".to_string()));
        }

        let created = Invite {
            id: table.allocate(),
            content_id: invite.content_id,
            content_type: invite.content_type,
            token: invite.token,
            created_by: invite.created_by,
            expires_at: invite.expires_at,
            is_active: true,
            created_at: invite.created_at,
            updated_at: invite.created_at,
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, invite: &Invite) -> Result<(), StoreError> {
        if let Some(row) = lock(&self.table).rows.get_mut(&invite.id) {
            row.is_active = invite.is_active;
            row.expires_at = invite.expires_at;
            row.updated_at = invite.updated_at;
        }
        Ok(())
    }

    async fn delete(&self, id: InviteId) -> Result<(), StoreError> {
        lock(&self.table).rows.remove(&id);
        Ok(())
    }

    async fn delete_by_content(
        &self,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<u64, StoreError> {
        let mut table = lock(&self.table);
        let len = table.rows.len();
        table
            .rows
            .retain(|_, i| !(i.content_id == content_id && i.content_type == content_type));
        Ok((len - table.rows.len()) as u64)
    }
}

/// Notes or PDFs keyed by id
pub struct MemoryContentStore {
    content_type: ContentType,
    table: Mutex<Table<ContentRecord>>,
}

impl MemoryContentStore {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            table: Mutex::new(Table::default()),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn find_by_id(&self, id: ContentId) -> Result<Option<ContentRecord>, StoreError> {
        Ok(lock(&self.table).rows.get(&id).cloned())
    }

    async fn create(&self, content: NewContent) -> Result<ContentRecord, StoreError> {
        let mut table = lock(&self.table);
        let (file_path, file_size) = match content.file {
            Some(file) => (Some(file.path), Some(file.size)),
            None => (None, None),
        };
        let created = ContentRecord {
            id: table.allocate(),
            content_type: self.content_type,
            owner_id: content.owner_id,
            title: content.title,
            body: content.body,
            is_public: content.is_public,
            file_size,
            file_path,
            created_at: content.created_at,
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete(&self, id: ContentId) -> Result<bool, StoreError> {
        Ok(lock(&self.table).rows.remove(&id).is_some())
    }
}

/// Uploaded files keyed by the path handed out on save
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let path = format!("memory://{name}");
        lock(&self.files).insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        lock(&self.files).remove(path);
        Ok(())
    }
}

//! Accounts loaded from storage.

use std::collections::BTreeMap;

use rusqlite::params;
use warble_types::{Account, AccountName, CredentialsStatus, OriginId, UserId};

use crate::{Database, PersistentOrigins, StorageError};

#[derive(Debug, Clone, Default)]
pub struct PersistentAccounts {
    accounts: BTreeMap<AccountName, Account>,
    current: Option<AccountName>,
}

impl PersistentAccounts {
    /// Placeholder used by contexts that are not (yet) backed by storage.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every account. `preferred_current` (from preferences) wins when it
    /// names a known account; otherwise the first verified account is current.
    pub fn initialize(
        &mut self,
        db: &Database,
        origins: &PersistentOrigins,
        preferred_current: Option<&str>,
    ) -> Result<(), StorageError> {
        let conn = db.conn();
        let mut stmt =
            conn.prepare("SELECT name, user_id, origin_id, credentials FROM account ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut accounts = BTreeMap::new();
        for row in rows {
            let (name, user_id, origin_id, credentials) = row?;
            let name = match AccountName::parse(&name) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Skipping stored account: {e}");
                    continue;
                }
            };
            let Some(origin) = origins.from_id(OriginId::new(origin_id)) else {
                tracing::warn!(account = %name, origin_id, "Skipping account of unknown origin");
                continue;
            };
            let account = Account::new(
                name.clone(),
                UserId::new(user_id),
                origin.clone(),
                CredentialsStatus::parse(&credentials),
            );
            accounts.insert(name, account);
        }

        self.accounts = accounts;
        self.current = preferred_current
            .and_then(|raw| AccountName::parse(raw).ok())
            .filter(|name| self.accounts.contains_key(name))
            .or_else(|| {
                self.accounts
                    .values()
                    .find(|a| a.credentials_verified() == CredentialsStatus::Succeeded)
                    .map(|a| a.account_name().clone())
            });
        tracing::debug!(
            count = self.accounts.len(),
            current = ?self.current,
            "Accounts loaded"
        );
        Ok(())
    }

    /// Insert or update `account` in storage and in this cache.
    pub fn save(&mut self, db: &Database, account: Account) -> Result<(), StorageError> {
        db.conn().execute(
            "INSERT INTO account (name, user_id, origin_id, credentials) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                user_id = excluded.user_id,
                origin_id = excluded.origin_id,
                credentials = excluded.credentials",
            params![
                account.account_name().as_str(),
                account.user_id().value(),
                account.origin().id.value(),
                account.credentials_verified().as_str()
            ],
        )?;
        if self.current.is_none() && account.credentials_verified() == CredentialsStatus::Succeeded
        {
            self.current = Some(account.account_name().clone());
        }
        self.accounts
            .insert(account.account_name().clone(), account);
        Ok(())
    }

    #[must_use]
    pub fn from_account_name(&self, name: &str) -> Option<&Account> {
        let name = AccountName::parse(name).ok()?;
        self.accounts.get(&name)
    }

    #[must_use]
    pub fn from_user_id(&self, user_id: UserId) -> Option<&Account> {
        self.accounts.values().find(|a| a.user_id() == user_id)
    }

    #[must_use]
    pub fn current_account(&self) -> Option<&Account> {
        self.current.as_ref().and_then(|name| self.accounts.get(name))
    }

    /// Make `name` the current account. Returns false for unknown accounts.
    pub fn set_current(&mut self, name: &AccountName) -> bool {
        if self.accounts.contains_key(name) {
            self.current = Some(name.clone());
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

use crate::{
    errors::{CasinoError, CasinoResult},
    storage::{Storage, Txn},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const USER_PREFIX: &str = "user:tg:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub coins: u64,
    /// Lifetime game winnings, the withdrawable figure shown to the player
    pub total_winnings: u64,
    pub referral_count: u64,
    #[serde(default)]
    pub referred_by: Option<i64>,
    #[serde(default)]
    pub channel_bonus_claimed: bool,
    #[serde(default)]
    pub last_wheel_spin_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(telegram_id: i64, starting_coins: u64, now: DateTime<Utc>) -> Self {
        Self {
            telegram_id,
            username: None,
            first_name: None,
            last_name: None,
            coins: starting_coins,
            total_winnings: 0,
            referral_count: 0,
            referred_by: None,
            channel_bonus_claimed: false,
            last_wheel_spin_ms: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn user_key(telegram_id: i64) -> Vec<u8> {
    format!("{}{}", USER_PREFIX, telegram_id).into_bytes()
}

pub fn load_user(storage: &Storage, telegram_id: i64) -> CasinoResult<Option<User>> {
    storage.get(&user_key(telegram_id))
}

pub fn txn_load_user(txn: &Txn<'_>, telegram_id: i64) -> CasinoResult<Option<User>> {
    txn.get(&user_key(telegram_id))
}

/// Load inside a write section, failing with 404 semantics when absent
pub fn require_user(txn: &Txn<'_>, telegram_id: i64) -> CasinoResult<User> {
    txn_load_user(txn, telegram_id)?.ok_or_else(|| CasinoError::not_found("User", telegram_id))
}

pub fn store_user(txn: &mut Txn<'_>, user: &User) -> CasinoResult<()> {
    txn.put(&user_key(user.telegram_id), user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_storage;

    #[test]
    fn test_store_and_load_user() {
        let (_dir, storage) = temp_storage();
        let user = User::new(1001, 5, Utc::now());
        storage.atomic(|txn| store_user(txn, &user)).unwrap();

        assert_eq!(load_user(&storage, 1001).unwrap(), Some(user));
        assert_eq!(load_user(&storage, 1002).unwrap(), None);
    }

    #[test]
    fn test_require_missing_user() {
        let (_dir, storage) = temp_storage();
        let err = storage.atomic(|txn| require_user(txn, 7)).unwrap_err();
        assert!(matches!(err, CasinoError::NotFound { .. }));
    }

    #[test]
    fn test_negative_ids_do_not_collide() {
        let (_dir, storage) = temp_storage();
        storage
            .atomic(|txn| {
                store_user(txn, &User::new(-5, 1, Utc::now()))?;
                store_user(txn, &User::new(5, 2, Utc::now()))
            })
            .unwrap();
        assert_eq!(load_user(&storage, -5).unwrap().unwrap().coins, 1);
        assert_eq!(load_user(&storage, 5).unwrap().unwrap().coins, 2);
    }
}

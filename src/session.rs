//! Session store
//!
//! Holds the bearer token and the cached user profile in a key-value medium
//! (browser `localStorage` in the frontend, memory in tests). The store is an
//! explicit context object shared by the API client and the controller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glycowatch_shared::User;
use tracing::warn;

use crate::config::{ClientConfig, DEFAULT_TOKEN_KEY, DEFAULT_USER_KEY};

/// Persistent string storage.
///
/// Implementations must not panic when no medium is available: reads return
/// `None` and writes report `false`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn delete(&self, key: &str) -> bool;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> bool {
        (**self).delete(key)
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.map
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.map.borrow_mut().remove(key).is_some()
    }
}

/// Storage for environments without a persistence medium.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> bool {
        false
    }

    fn delete(&self, _key: &str) -> bool {
        false
    }
}

pub struct SessionStore<S> {
    store: S,
    token_key: String,
    user_key: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Uses the default key names.
    pub fn new(store: S) -> Self {
        Self::with_keys(store, DEFAULT_TOKEN_KEY, DEFAULT_USER_KEY)
    }

    pub fn from_config(store: S, config: &ClientConfig) -> Self {
        Self::with_keys(store, &config.token_key, &config.user_key)
    }

    pub fn with_keys(store: S, token_key: &str, user_key: &str) -> Self {
        Self {
            store,
            token_key: token_key.to_string(),
            user_key: user_key.to_string(),
        }
    }

    pub fn set_token(&self, token: &str) {
        if !self.store.set(&self.token_key, token) {
            warn!("session token could not be persisted");
        }
    }

    pub fn get_token(&self) -> Option<String> {
        self.store.get(&self.token_key).filter(|t| !t.is_empty())
    }

    /// Drops the token together with the cached profile.
    pub fn remove_token(&self) {
        self.store.delete(&self.token_key);
        self.store.delete(&self.user_key);
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if !self.store.set(&self.user_key, &raw) {
                    warn!("user profile could not be persisted");
                }
            }
            Err(e) => warn!(error = %e, "user profile could not be serialized"),
        }
    }

    /// Reads the cached profile.
    ///
    /// A value that does not deserialize is deleted and reported as absent.
    pub fn get_user(&self) -> Option<User> {
        let raw = self.store.get(&self.user_key)?;
        if raw.is_empty() || raw == "undefined" || raw == "null" {
            return None;
        }

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "discarding corrupted user profile");
                self.store.delete(&self.user_key);
                None
            }
        }
    }

    pub fn clear(&self) {
        self.remove_token();
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: "1".to_string(),
            username: "alice".to_string(),
            height: 1.7,
            weight: 65.0,
            age: 30,
        }
    }

    #[test]
    fn token_round_trip() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(!session.is_authenticated());

        session.set_token("abc");
        assert_eq!(session.get_token().as_deref(), Some("abc"));
        assert!(session.is_authenticated());

        session.remove_token();
        assert_eq!(session.get_token(), None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn user_round_trip_and_clear() {
        let session = SessionStore::new(MemoryStore::new());
        session.set_token("abc");
        session.set_user(&alice());
        assert_eq!(session.get_user(), Some(alice()));

        session.clear();
        assert_eq!(session.get_user(), None);
        assert_eq!(session.get_token(), None);
    }

    #[test]
    fn corrupted_profile_is_discarded() {
        let store = Rc::new(MemoryStore::new());
        let session = SessionStore::new(store.clone());
        store.set(DEFAULT_USER_KEY, "{not json");

        assert_eq!(session.get_user(), None);
        assert_eq!(store.get(DEFAULT_USER_KEY), None);
    }

    #[test]
    fn placeholder_strings_are_absent() {
        let store = Rc::new(MemoryStore::new());
        let session = SessionStore::new(store.clone());
        for raw in ["undefined", "null", ""] {
            store.set(DEFAULT_USER_KEY, raw);
            assert_eq!(session.get_user(), None);
        }
    }

    #[test]
    fn null_store_never_fails() {
        let session = SessionStore::new(NullStore);
        session.set_token("abc");
        session.set_user(&alice());

        assert_eq!(session.get_token(), None);
        assert_eq!(session.get_user(), None);
        assert!(!session.is_authenticated());
        session.clear();
    }

    #[test]
    fn custom_keys_are_respected() {
        let store = Rc::new(MemoryStore::new());
        let config = ClientConfig {
            token_key: "tk".to_string(),
            user_key: "uk".to_string(),
            ..ClientConfig::default()
        };
        let session = SessionStore::from_config(store.clone(), &config);
        session.set_token("abc");

        assert_eq!(store.get("tk").as_deref(), Some("abc"));
        assert_eq!(store.get(DEFAULT_TOKEN_KEY), None);
    }
}

//! In-memory credential store.
//!
//! Login credentials are a fixed list loaded from configuration at startup
//! and never written afterwards, so concurrent lookups need no
//! synchronization. The store sits behind the [`CredentialStore`] trait so a
//! persisted or hashed-credential backend could be swapped in without
//! touching the login handler.

use subtle::ConstantTimeEq;

/// A login identity.
///
/// The credential list is a fixed development fixture, not a user
/// database, so passwords are held in plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable numeric id, embedded in issued tokens as the subject.
    pub user_id: i64,

    /// Login name, unique within the store.
    pub username: String,

    /// Plaintext password.
    pub password: String,
}

/// Read-only lookup over login credentials.
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by exact username.
    fn find_by_username(&self, username: &str) -> Option<&User>;

    /// Verifies a username/password pair, returning the user on match.
    ///
    /// The password comparison is constant-time for equal-length inputs;
    /// only the length is leaked.
    fn verify(&self, username: &str, password: &str) -> Option<&User> {
        let user = self.find_by_username(username)?;
        let matches: bool = user
            .password
            .as_bytes()
            .ct_eq(password.as_bytes())
            .into();
        if matches {
            Some(user)
        } else {
            None
        }
    }
}

/// The fixed in-memory credential list.
///
/// User ids are assigned from list position, starting at 1, matching the
/// order the pairs appear in configuration.
#[derive(Debug, Clone, Default)]
pub struct FixedCredentials {
    users: Vec<User>,
}

impl FixedCredentials {
    /// Builds the store from (username, password) pairs in declaration order.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let users = pairs
            .iter()
            .enumerate()
            .map(|(index, (username, password))| User {
                user_id: index as i64 + 1,
                username: username.clone(),
                password: password.clone(),
            })
            .collect();

        Self { users }
    }

    /// Number of users in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if the store holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for FixedCredentials {
    fn find_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }
}

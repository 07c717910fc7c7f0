//! Authorization list editor.
//!
//! Maintains the set of user accounts permitted to act on behalf of a
//! vendor. All operations are pure and in-memory; the surrounding edit
//! session persists the final list on save, and cancelling simply drops the
//! editor.

use crate::models::{AuthorizedUser, User};
use crate::text::matches_search;

/// Set of authorized-user entries keyed by `user_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationList {
    entries: Vec<AuthorizedUser>,
}

impl AuthorizationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<AuthorizedUser>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            list.add(entry);
        }
        list
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.user_id == user_id)
    }

    /// Appends the entry unless one with the same `user_id` is already
    /// present. Returns whether the list changed.
    pub fn add(&mut self, entry: AuthorizedUser) -> bool {
        if self.contains(&entry.user_id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes the entry with the given `user_id`. Returns whether the list
    /// changed.
    pub fn remove(&mut self, user_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.user_id != user_id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AuthorizedUser] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AuthorizedUser> {
        self.entries
    }
}

impl From<&User> for AuthorizedUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// Candidate accounts for authorization: dealers not already on the list,
/// narrowed by a case- and accent-insensitive substring search over username
/// and full name.
pub fn filter_candidates<'a>(
    users: &'a [User],
    authorized: &AuthorizationList,
    search: &str,
) -> Vec<&'a User> {
    users
        .iter()
        .filter(|user| user.is_dealer())
        .filter(|user| !authorized.contains(&user.id))
        .filter(|user| {
            search.trim().is_empty()
                || matches_search(&user.username, search)
                || matches_search(&user.full_name, search)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn entry(id: &str) -> AuthorizedUser {
        AuthorizedUser {
            user_id: id.to_string(),
            username: format!("{id}@dealerdesk.dev"),
            full_name: format!("User {id}"),
        }
    }

    fn user(id: &str, role: Role, full_name: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            username: format!("{id}@dealerdesk.dev"),
            full_name: full_name.to_string(),
            phone: String::new(),
            address: String::new(),
            role,
            avatar: String::new(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn add_is_idempotent_per_user_id() {
        let mut list = AuthorizationList::new();
        assert!(list.add(entry("u1")));
        assert!(!list.add(entry("u1")));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_filters_by_user_id() {
        let mut list = AuthorizationList::from_entries(vec![entry("u1"), entry("u2")]);
        assert!(list.remove("u1"));
        assert!(!list.remove("u1"));
        assert!(!list.contains("u1"));
        assert!(list.contains("u2"));
    }

    #[test]
    fn from_entries_dedupes() {
        let list = AuthorizationList::from_entries(vec![entry("u1"), entry("u1"), entry("u2")]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn candidates_are_dealers_not_yet_authorized() {
        let users = vec![
            user("u1", Role::Dealer, "Nguyễn Văn A"),
            user("u2", Role::Dealer, "Trần Thị B"),
            user("u3", Role::Manager, "Lê Văn C"),
        ];
        let authorized = AuthorizationList::from_entries(vec![entry("u2")]);

        let candidates = filter_candidates(&users, &authorized, "");
        assert_eq!(
            candidates.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            vec!["u1"]
        );
    }

    #[test]
    fn candidate_search_is_accent_insensitive() {
        let users = vec![
            user("u1", Role::Dealer, "Nguyễn Văn Đức"),
            user("u2", Role::Dealer, "Trần Thị Hồng"),
        ];
        let authorized = AuthorizationList::new();

        let candidates = filter_candidates(&users, &authorized, "duc");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "u1");

        let candidates = filter_candidates(&users, &authorized, "HỒNG");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "u2");
    }
}

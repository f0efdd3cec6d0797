// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user directory for the identity service.
//!
//! Ids are assigned sequentially from 1. Email and nickname are unique.

use std::collections::HashMap;

use crate::models::User;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("nickname is already taken")]
    DuplicateNickname,
}

#[derive(Debug, Default)]
pub struct UserStore {
    users: HashMap<u64, User>,
    next_id: u64,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_id(&self, id: u64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|user| user.email == email)
    }

    pub fn find_by_nickname(&self, nickname: &str) -> Option<&User> {
        self.users.values().find(|user| user.nickname == nickname)
    }

    /// Insert a new user and return it with its assigned id.
    pub fn insert(
        &mut self,
        email: String,
        nickname: String,
        password_hash: String,
    ) -> Result<User, StoreError> {
        if self.find_by_email(&email).is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        if self.find_by_nickname(&nickname).is_some() {
            return Err(StoreError::DuplicateNickname);
        }

        self.next_id += 1;
        let user = User {
            id: self.next_id,
            email,
            nickname,
            password_hash,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

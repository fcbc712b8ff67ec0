use std::sync::Arc;

use anyhow::Context;

use crate::users::{repo::UserStore, services::UserService, validation::Validator};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub validator: Arc<Validator>,
}

impl AppState {
    pub fn from_parts(store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let validator = Validator::new().context("compile validation patterns")?;
        Ok(Self {
            users: UserService::new(store),
            validator: Arc::new(validator),
        })
    }
}

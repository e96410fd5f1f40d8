use crate::error::DatastoreError;
use crate::filter::{Filter, SelectOptions};
use crate::types::{RecordId, Row};

use super::entities::{NewUser, User};
use super::{DomainData, tables};

impl DomainData {
    pub async fn create_user(&self, user: NewUser) -> Result<User, DatastoreError> {
        self.stamped_insert(tables::USERS, &user, Row::new()).await
    }

    pub async fn get_user_by_id(&self, id: &RecordId) -> Result<Option<User>, DatastoreError> {
        self.find_by_id(tables::USERS, id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatastoreError> {
        let options = SelectOptions::new().filter(Filter::new().eq("email", email));
        self.backend().select_one(tables::USERS, options).await
    }

    /// Patch arbitrary profile columns; the caller knows the table shape.
    pub async fn update_user(
        &self,
        id: &RecordId,
        patch: Row,
    ) -> Result<Option<User>, DatastoreError> {
        let filter = Filter::new().eq("id", id.to_json());
        self.stamped_update(tables::USERS, patch, &filter).await
    }
}

//! Native object storage on the managed platform.

use crate::error::DatastoreError;

use super::adapter::PlatformAdapter;
use super::executor::{expect_success, transport_error};

impl PlatformAdapter {
    pub(crate) fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url())
    }

    pub(crate) fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.base_url()
        )
    }

    pub(crate) async fn storage_upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DatastoreError> {
        let response = self
            .http()
            .post(self.object_url(bucket, path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport_error("storage upload", &e))?;
        expect_success(response, "storage upload").await?;
        Ok(self.public_object_url(bucket, path))
    }

    pub(crate) async fn storage_delete(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<(), DatastoreError> {
        let response = self
            .http()
            .delete(self.object_url(bucket, path))
            .send()
            .await
            .map_err(|e| transport_error("storage delete", &e))?;
        expect_success(response, "storage delete").await
    }
}

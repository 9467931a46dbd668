//! Resource calls over the authenticated pipeline

use super::endpoints::{self, item, working_hours};
use super::models::{
    Article, ArticleInput, Category, CategoryInput, Doctor, DoctorInput, Prediction,
    PredictionRecord, User, WorkingHour,
};
use crate::http::{ApiClient, ApiRequest, ClientError, FileUpload};

/// Everything a list or detail screen fetches. Lists come back whole; the
/// collection view model pages them client-side.
#[derive(Clone)]
pub struct LungoraApi {
    client: ApiClient,
}

impl LungoraApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        self.client.get(endpoints::USERS).await
    }

    pub async fn user(&self, id: &str) -> Result<User, ClientError> {
        self.client.get(&item(endpoints::USERS, id)).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&item(endpoints::USERS, id)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Doctors
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn doctors(&self) -> Result<Vec<Doctor>, ClientError> {
        self.client.get(endpoints::DOCTORS).await
    }

    pub async fn doctor(&self, id: &str) -> Result<Doctor, ClientError> {
        self.client.get(&item(endpoints::DOCTORS, id)).await
    }

    pub async fn create_doctor(&self, input: &DoctorInput) -> Result<Doctor, ClientError> {
        self.client.post(endpoints::DOCTORS, input).await
    }

    pub async fn update_doctor(&self, id: &str, input: &DoctorInput) -> Result<Doctor, ClientError> {
        self.client.put(&item(endpoints::DOCTORS, id), input).await
    }

    pub async fn delete_doctor(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&item(endpoints::DOCTORS, id)).await
    }

    pub async fn working_hours(&self, doctor_id: &str) -> Result<Vec<WorkingHour>, ClientError> {
        self.client.get(&working_hours(doctor_id)).await
    }

    pub async fn set_working_hours(
        &self,
        doctor_id: &str,
        hours: &[WorkingHour],
    ) -> Result<Vec<WorkingHour>, ClientError> {
        self.client.put(&working_hours(doctor_id), hours).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Categories and articles
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.client.get(endpoints::CATEGORIES).await
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, ClientError> {
        self.client.post(endpoints::CATEGORIES, input).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> Result<Category, ClientError> {
        self.client.put(&item(endpoints::CATEGORIES, id), input).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&item(endpoints::CATEGORIES, id)).await
    }

    pub async fn articles(&self) -> Result<Vec<Article>, ClientError> {
        self.client.get(endpoints::ARTICLES).await
    }

    pub async fn article(&self, id: &str) -> Result<Article, ClientError> {
        self.client.get(&item(endpoints::ARTICLES, id)).await
    }

    pub async fn create_article(&self, input: &ArticleInput) -> Result<Article, ClientError> {
        self.client.post(endpoints::ARTICLES, input).await
    }

    pub async fn update_article(&self, id: &str, input: &ArticleInput) -> Result<Article, ClientError> {
        self.client.put(&item(endpoints::ARTICLES, id), input).await
    }

    pub async fn delete_article(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&item(endpoints::ARTICLES, id)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Predictions
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn history(&self) -> Result<Vec<PredictionRecord>, ClientError> {
        self.client.get(endpoints::HISTORY).await
    }

    pub async fn history_entry(&self, id: &str) -> Result<PredictionRecord, ClientError> {
        self.client.get(&item(endpoints::HISTORY, id)).await
    }

    pub async fn delete_history_entry(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&item(endpoints::HISTORY, id)).await
    }

    /// Run the classifier on one image
    pub async fn predict(&self, image: FileUpload) -> Result<Prediction, ClientError> {
        if image.bytes.is_empty() {
            return Err(ClientError::InvalidRequest("image is empty".to_string()));
        }
        tracing::debug!(file = %image.file_name, bytes = image.bytes.len(), "Submitting image for inference");
        self.client
            .send(ApiRequest::post(endpoints::PREDICT).upload(image))
            .await
    }
}

// Backend entities
//
// The backend is loose about shapes: ids come as numbers or strings, dates
// with or without an offset, optional fields as null or missing. The
// deserializers below absorb that so the rest of the crate sees one form.

use crate::collection::{FieldValue, Record};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image_user: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for User {
    const SEARCH_FIELDS: &'static [&'static str] = &["userName", "email"];

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "userName" | "name" => text(&self.user_name),
            "email" => text(&self.email),
            "role" => opt_text(&self.role),
            "createdAt" => self.created_at.map(FieldValue::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHour {
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

impl FromStr for WorkingHour {
    type Err = String;

    /// `Monday=09:00-17:00`
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parsed = raw.split_once('=').and_then(|(day, span)| {
            let (start, end) = span.split_once('-')?;
            let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
            let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
            let day = day.trim();
            (!day.is_empty() && start < end).then(|| (day.to_string(), start, end))
        });

        match parsed {
            Some((day_of_week, start, end)) => Ok(Self {
                day_of_week,
                start_time: start.format("%H:%M").to_string(),
                end_time: end.format("%H:%M").to_string(),
            }),
            None => Err(format!("expected Day=HH:MM-HH:MM with start before end, got '{}'", raw)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub image_doctor: Option<String>,
    #[serde(default)]
    pub working_hours: Vec<WorkingHour>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Doctor {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["name", "email", "specialization", "location"];

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "email" => text(&self.email),
            "phone" => opt_text(&self.phone),
            "specialization" => opt_text(&self.specialization),
            "location" => opt_text(&self.location),
            "experienceYears" => self
                .experience_years
                .map(|years| FieldValue::Number(f64::from(years))),
            "createdAt" => self.created_at.map(FieldValue::Date),
            _ => None,
        }
    }
}

/// Create / update body for doctors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
}

/// Edit form prefilled from the stored doctor
impl From<&Doctor> for DoctorInput {
    fn from(doctor: &Doctor) -> Self {
        Self {
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            phone: doctor.phone.clone(),
            specialization: doctor.specialization.clone(),
            location: doctor.location.clone(),
            about: doctor.about.clone(),
            experience_years: doctor.experience_years,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Category {
    const SEARCH_FIELDS: &'static [&'static str] = &["categoryName"];

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "categoryName" | "name" => text(&self.category_name),
            "createdAt" => self.created_at.map(FieldValue::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Article {
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "description", "categoryName"];

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "title" => text(&self.title),
            "description" => opt_text(&self.description),
            "categoryId" => opt_text(&self.category_id),
            "categoryName" | "category" => opt_text(&self.category_name),
            "createdAt" => self.created_at.map(FieldValue::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: String,
}

impl From<&Article> for ArticleInput {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            description: article.description.clone().unwrap_or_default(),
            content: article.content.clone().unwrap_or_default(),
            category_id: article.category_id.clone().unwrap_or_default(),
        }
    }
}

/// One stored inference, as listed on the history screen
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prediction: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for PredictionRecord {
    const SEARCH_FIELDS: &'static [&'static str] = &["prediction", "userName"];

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => text(&self.id),
            "userName" | "user" => opt_text(&self.user_name),
            "prediction" => text(&self.prediction),
            // Percent, one decimal, as shown on the history screen
            "confidence" => self
                .confidence
                .map(|c| FieldValue::Number((c * 1000.0).round() / 10.0)),
            "createdAt" => self.created_at.map(FieldValue::Date),
            _ => None,
        }
    }
}

/// Result of a single-image inference
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub prediction: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
}

fn text(value: &str) -> Option<FieldValue<'_>> {
    if value.is_empty() {
        None
    } else {
        Some(FieldValue::Text(Cow::Borrowed(value)))
    }
}

fn opt_text(value: &Option<String>) -> Option<FieldValue<'_>> {
    value.as_deref().and_then(text)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn lenient_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// RFC 3339, or a naive timestamp taken as UTC. Unparseable dates become None.
fn lenient_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_lenient_ids_and_dates() {
        let user: User = serde_json::from_value(json!({
            "id": 17,
            "userName": "amal",
            "email": "amal@lungora.test",
            "createdAt": "2024-05-02T10:30:00.123"
        }))
        .unwrap();

        assert_eq!(user.id, "17");
        let created = user.created_at.unwrap();
        assert_eq!((created.month(), created.day(), created.hour()), (5, 2, 10));

        let article: Article = serde_json::from_value(json!({
            "id": "a-1",
            "title": "Early signs",
            "categoryId": 3,
            "createdAt": "not a date"
        }))
        .unwrap();
        assert_eq!(article.category_id.as_deref(), Some("3"));
        assert_eq!(article.created_at, None);
    }

    #[test]
    fn test_rfc3339_offset_normalized() {
        let date = parse_date("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(date.hour(), 0);
    }

    #[test]
    fn test_doctor_fields() {
        let doctor: Doctor = serde_json::from_value(json!({
            "id": 1,
            "name": "Dr. Sara Nabil",
            "email": "sara@lungora.test",
            "specialization": "",
            "workingHours": [
                { "dayOfWeek": "Monday", "startTime": "09:00", "endTime": "17:00" }
            ]
        }))
        .unwrap();

        assert_eq!(doctor.working_hours.len(), 1);
        assert!(doctor.field("specialization").is_none());
        assert!(doctor.field("unknown").is_none());
        assert_eq!(
            doctor.field("name"),
            Some(FieldValue::Text(Cow::Borrowed("Dr. Sara Nabil")))
        );
    }

    #[test]
    fn test_numeric_fields_filter_exactly() {
        use crate::collection::{view, CollectionState};

        let doctors: Vec<Doctor> = serde_json::from_value(json!([
            { "id": 1, "name": "Dr. Amal", "experienceYears": 12 },
            { "id": 2, "name": "Dr. John", "experienceYears": 5 }
        ]))
        .unwrap();
        let mut state = CollectionState::new(6);
        state.set_filter("experienceYears", "5");
        let result = view(&doctors, &state);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.page[0].name, "Dr. John");

        let record: PredictionRecord = serde_json::from_value(json!({
            "id": 9, "prediction": "Pneumonia", "confidence": 0.9347
        }))
        .unwrap();
        assert_eq!(record.field("confidence"), Some(FieldValue::Number(93.5)));
        assert_eq!(record.field("confidence").unwrap().to_string(), "93.5");
    }

    #[test]
    fn test_working_hour_from_str() {
        let hour: WorkingHour = "Monday = 9:00-17:30".parse().unwrap();
        assert_eq!(
            hour,
            WorkingHour {
                day_of_week: "Monday".to_string(),
                start_time: "09:00".to_string(),
                end_time: "17:30".to_string(),
            }
        );
        assert!("Monday=17:00-09:00".parse::<WorkingHour>().is_err());
        assert!("Monday=9-5".parse::<WorkingHour>().is_err());
        assert!("=09:00-10:00".parse::<WorkingHour>().is_err());
    }

    #[test]
    fn test_edit_forms_prefill_from_entity() {
        let article: Article = serde_json::from_value(json!({
            "id": 4, "title": "Reading an X-ray", "content": "...", "categoryId": 2
        }))
        .unwrap();
        let input = ArticleInput::from(&article);
        assert_eq!(input.category_id, "2");
        assert_eq!(input.description, "");

        let doctor: Doctor = serde_json::from_value(json!({
            "id": 1, "name": "Dr. Amal", "email": "amal@lungora.test", "experienceYears": 7
        }))
        .unwrap();
        assert_eq!(DoctorInput::from(&doctor).experience_years, Some(7));
    }

    #[test]
    fn test_input_skips_unset_fields() {
        let input = DoctorInput {
            name: "Dr. Omar".to_string(),
            email: "omar@lungora.test".to_string(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "name": "Dr. Omar", "email": "omar@lungora.test" })
        );
    }
}

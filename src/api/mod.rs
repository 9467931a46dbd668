//! Typed backend API
//!
//! - `endpoints`: every path the console talks to
//! - `models`: entities as the backend serializes them
//! - `resources`: CRUD and inference calls over the authenticated client

pub mod models;
mod resources;

pub use models::{
    Article, ArticleInput, Category, CategoryInput, Doctor, DoctorInput, Prediction,
    PredictionRecord, User, WorkingHour,
};
pub use resources::LungoraApi;

/// Backend routes, relative to the configured base URL
pub mod endpoints {
    pub const LOGIN: &str = "/api/Auth/Login";
    pub const REGISTER: &str = "/api/Auth/Register";
    pub const LOGOUT: &str = "/api/Auth/Logout";
    pub const REFRESH_TOKEN: &str = "/api/Auth/RefreshToken";
    pub const CHANGE_PASSWORD: &str = "/api/Auth/ChangePassword";
    pub const CURRENT_USER: &str = "/api/Auth/GetUser";

    pub const USERS: &str = "/api/Users";
    pub const DOCTORS: &str = "/api/Doctors";
    pub const CATEGORIES: &str = "/api/Categories";
    pub const ARTICLES: &str = "/api/Articles";
    pub const HISTORY: &str = "/api/History";
    pub const PREDICT: &str = "/api/Model/Predict";

    /// `collection/{id}`, with the id percent-encoded as a path segment
    pub fn item(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, encode_segment(id))
    }

    pub fn working_hours(doctor_id: &str) -> String {
        format!("{}/WorkingHours", item(DOCTORS, doctor_id))
    }

    fn encode_segment(segment: &str) -> String {
        let mut out = String::with_capacity(segment.len());
        for byte in segment.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                other => out.push_str(&format!("%{:02X}", other)),
            }
        }
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_item_paths() {
            assert_eq!(item(USERS, "42"), "/api/Users/42");
            assert_eq!(item(HISTORY, "a b/c"), "/api/History/a%20b%2Fc");
            assert_eq!(
                working_hours("d-7"),
                "/api/Doctors/d-7/WorkingHours"
            );
        }
    }
}

/**
 * Wire Types Module
 *
 * Request and response payloads exchanged with the LiftLog backend.
 */

use crate::shared::models::{Exercise, WorkoutSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Email/password login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Google sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAuthRequest {
    pub id_token: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response from server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub refresh_token: String,
}

/// Error body the backend attaches to non-2xx responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// One set in a workout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPayload {
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub notes: String,
}

/// One exercise in a workout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercisePayload {
    pub exercise_id: i64,
    pub name: String,
    pub sets: Vec<SetPayload>,
}

/// Create/update payload for a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPayload {
    pub title: String,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub exercises: Vec<WorkoutExercisePayload>,
}

impl WorkoutPayload {
    /// Build a payload from the current local session.
    pub fn from_session(session: &WorkoutSession, completed: bool) -> Self {
        Self {
            title: session.title.clone(),
            started_at: session.start_time,
            completed,
            exercises: session.exercises.iter().map(exercise_payload).collect(),
        }
    }
}

fn exercise_payload(exercise: &Exercise) -> WorkoutExercisePayload {
    WorkoutExercisePayload {
        exercise_id: exercise.id,
        name: exercise.name.clone(),
        sets: exercise
            .sets
            .iter()
            .map(|s| SetPayload {
                weight: s.weight,
                reps: s.reps,
                notes: s.notes.clone(),
            })
            .collect(),
    }
}

/// Workout as returned by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutResponse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Query parameters for the exercise catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub body_part: Option<String>,
    pub equipment: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CatalogQuery {
    /// Render the query as key/value pairs for the request URL.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(body_part) = &self.body_part {
            pairs.push(("body_part", body_part.clone()));
        }
        if let Some(equipment) = &self.equipment {
            pairs.push(("equipment", equipment.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ExerciseSet, WorkoutSession};

    #[test]
    fn test_workout_payload_from_session() {
        let mut session = WorkoutSession::new();
        session.title = "Leg day".into();
        session.exercises = vec![Exercise {
            id: 7,
            name: "Squat".into(),
            sets: vec![ExerciseSet {
                weight: 100.0,
                reps: 5,
                notes: "belt on".into(),
            }],
        }];

        let payload = WorkoutPayload::from_session(&session, true);
        assert_eq!(payload.title, "Leg day");
        assert!(payload.completed);
        assert_eq!(payload.exercises.len(), 1);
        assert_eq!(payload.exercises[0].exercise_id, 7);
        assert_eq!(payload.exercises[0].sets[0].reps, 5);
    }

    #[test]
    fn test_catalog_query_pairs() {
        let query = CatalogQuery {
            search: Some("press".into()),
            body_part: Some("chest".into()),
            equipment: None,
            limit: Some(20),
            offset: Some(40),
        };

        let pairs = query.to_pairs();
        assert_eq!(pairs.len(), 4);
        assert!(pairs.contains(&("search", "press".to_string())));
        assert!(pairs.contains(&("limit", "20".to_string())));
    }

    #[test]
    fn test_error_body_tolerates_missing_fields() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.detail.is_none());
        assert!(body.error_code.is_none());

        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"nope","error_code":"VALIDATION_ERROR"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("nope"));
        assert_eq!(body.error_code.as_deref(), Some("VALIDATION_ERROR"));
    }

    #[test]
    fn test_auth_response_roundtrip() {
        let json = r#"{"access_token":"abc","token_type":"bearer","expires_in":3600,"refresh_token":"def"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "abc");
        assert_eq!(response.expires_in, 3600);
    }
}

//! In-memory auto-apply sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, AppState};

#[derive(Clone, Debug)]
pub struct Session {
    pub apply_url: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct StartBody {
    pub apply_url: String,
}

#[derive(Deserialize)]
pub struct AnswerFile {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

#[derive(Deserialize)]
pub struct Answer {
    pub field_id: String,
    pub value: Option<String>,
    pub values: Option<Vec<String>>,
    pub files: Option<Vec<AnswerFile>>,
}

#[derive(Deserialize)]
pub struct SetAnswersBody {
    pub session_id: Uuid,
    pub answers: Vec<Answer>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldValidations {
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub pattern: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub placeholder: Option<String>,
    pub options: Option<Vec<FieldOption>>,
    pub validations: Option<FieldValidations>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldError {
    pub field_id: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub provider_id: Option<String>,
    pub provider_display_name: Option<String>,
    pub success: bool,
    pub status: String,
    pub is_terminal: bool,
    pub error: Option<String>,
    pub current_url: Option<String>,
    pub validation_errors: Vec<FieldError>,
    pub fields: Vec<FormField>,
}

fn provider_for(apply_url: &str) -> (&'static str, &'static str) {
    if apply_url.contains("greenhouse") {
        ("greenhouse", "Greenhouse")
    } else if apply_url.contains("lever") {
        ("lever", "Lever")
    } else {
        ("generic", "Generic Form")
    }
}

pub fn application_form() -> Vec<FormField> {
    vec![
        FormField {
            id: "full_name".to_string(),
            field_type: "text".to_string(),
            label: "Full name".to_string(),
            required: true,
            placeholder: Some("Jane Doe".to_string()),
            options: None,
            validations: Some(FieldValidations {
                min_length: Some(2),
                max_length: Some(120),
                pattern: None,
            }),
        },
        FormField {
            id: "email".to_string(),
            field_type: "email".to_string(),
            label: "Email".to_string(),
            required: true,
            placeholder: None,
            options: None,
            validations: Some(FieldValidations {
                min_length: None,
                max_length: Some(254),
                pattern: Some("^[^@]+@[^@]+$".to_string()),
            }),
        },
        FormField {
            id: "work_authorization".to_string(),
            field_type: "select".to_string(),
            label: "Are you authorized to work in this country?".to_string(),
            required: false,
            placeholder: None,
            options: Some(vec![
                FieldOption {
                    label: "Yes".to_string(),
                    value: "yes".to_string(),
                },
                FieldOption {
                    label: "No".to_string(),
                    value: "no".to_string(),
                },
            ]),
            validations: None,
        },
        FormField {
            id: "resume".to_string(),
            field_type: "file".to_string(),
            label: "Resume".to_string(),
            required: false,
            placeholder: None,
            options: None,
            validations: None,
        },
    ]
}

fn session_response(id: Uuid, session: &Session) -> SessionResponse {
    let (provider_id, provider_name) = provider_for(&session.apply_url);
    SessionResponse {
        session_id: id,
        provider_id: Some(provider_id.to_string()),
        provider_display_name: Some(provider_name.to_string()),
        success: true,
        status: "awaiting_answers".to_string(),
        is_terminal: false,
        error: None,
        current_url: Some(session.apply_url.clone()),
        validation_errors: Vec::new(),
        fields: application_form(),
    }
}

fn validate_answers(answers: &[Answer]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for field in application_form().iter().filter(|f| f.required) {
        let answered = answers.iter().find(|a| a.field_id == field.id).is_some_and(|a| {
            a.value.as_deref().is_some_and(|v| !v.trim().is_empty())
                || a.values.as_ref().is_some_and(|v| !v.is_empty())
                || a.files.as_ref().is_some_and(|f| !f.is_empty())
        });
        if !answered {
            errors.push(FieldError {
                field_id: field.id.clone(),
                message: format!("{} is required", field.label),
            });
        }
    }
    if let Some(email) = answers
        .iter()
        .find(|a| a.field_id == "email")
        .and_then(|a| a.value.as_deref())
        .filter(|v| !v.trim().is_empty())
    {
        if !email.contains('@') {
            errors.push(FieldError {
                field_id: "email".to_string(),
                message: "Email is not a valid address".to_string(),
            });
        }
    }
    for answer in answers {
        for file in answer.files.iter().flatten() {
            if file.file_name.is_empty() || file.content_type.is_empty() || file.data.is_empty() {
                errors.push(FieldError {
                    field_id: answer.field_id.clone(),
                    message: "Attached file is incomplete".to_string(),
                });
            }
        }
    }
    errors
}

pub async fn start(
    State(state): State<AppState>,
    Json(body): Json<StartBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    if !(body.apply_url.starts_with("http://") || body.apply_url.starts_with("https://")) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "apply_url must be an absolute http(s) URL"));
    }
    let id = Uuid::new_v4();
    let session = Session {
        apply_url: body.apply_url,
        completed: false,
    };
    let response = session_response(id, &session);
    state.sessions.write().await.insert(id, session);
    info!(session_id = %id, "auto-apply session started");
    Ok(Json(response))
}

pub async fn set_answers(
    State(state): State<AppState>,
    Json(body): Json<SetAnswersBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&body.session_id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Session not found"))?;
    if session.completed {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Session already completed"));
    }

    let mut response = session_response(body.session_id, session);
    let errors = validate_answers(&body.answers);
    if !errors.is_empty() {
        response.success = false;
        response.validation_errors = errors;
        return Ok(Json(response));
    }

    session.completed = true;
    info!(session_id = %body.session_id, "auto-apply session submitted");
    response.status = "submitted".to_string();
    response.is_terminal = true;
    response.fields = Vec::new();
    Ok(Json(response))
}

pub async fn end(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .map(|_| Json(serde_json::json!({ "session_id": id, "ended": true })))
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Session not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(field_id: &str, value: &str) -> Answer {
        Answer {
            field_id: field_id.to_string(),
            value: Some(value.to_string()),
            values: None,
            files: None,
        }
    }

    #[test]
    fn required_fields_are_enforced() {
        let errors = validate_answers(&[answer("full_name", "Ada Lovelace")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_id, "email");
    }

    #[test]
    fn malformed_email_is_rejected() {
        let errors = validate_answers(&[answer("full_name", "Ada"), answer("email", "ada.example.com")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Email is not a valid address");
    }

    #[test]
    fn complete_answers_pass() {
        let errors = validate_answers(&[answer("full_name", "Ada"), answer("email", "ada@example.com")]);
        assert!(errors.is_empty());
    }

    #[test]
    fn provider_detection() {
        assert_eq!(provider_for("https://boards.greenhouse.io/acme/1").0, "greenhouse");
        assert_eq!(provider_for("https://jobs.lever.co/acme/1").0, "lever");
        assert_eq!(provider_for("https://acme.example.com/careers/1").0, "generic");
    }
}

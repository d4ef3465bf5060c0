use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 400 BAD REQUEST
    ValidationError,
    DuplicateUsername,
    DuplicateEmail,
    InvalidCredentials,
    InvalidStatus,
    InvalidRole,
    EmptyComment,
    NotRefreshToken,
    InvalidRefreshToken,

    // 401 UNAUTHORIZED
    AuthenticationFailed,
    ExpiredAuthToken,
    InvalidAuthToken,

    // 403 FORBIDDEN
    NotEnoughPermission,

    // 404 NOT FOUND
    UserNotFound,
    DefectNotFound,
    AssigneeNotFound,

    // 500 SERVER ERRORS
    StorageFailure,
    DatabaseError,
    InternalError,
    TokenGenerationFailed,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Проверка данных не пройдена",
            ErrorCode::DuplicateUsername => "Пользователь с таким логином уже существует",
            ErrorCode::DuplicateEmail => "Пользователь с таким email уже существует",
            ErrorCode::InvalidCredentials => "Неверный логин или пароль",
            ErrorCode::InvalidStatus => "Недопустимое значение статуса",
            ErrorCode::InvalidRole => "Недопустимая роль пользователя",
            ErrorCode::EmptyComment => "Комментарий не может быть пустым",
            ErrorCode::NotRefreshToken => "Передан не refresh-токен",
            ErrorCode::InvalidRefreshToken => "Refresh-токен недействителен",

            ErrorCode::AuthenticationFailed => "Ошибка аутентификации",
            ErrorCode::ExpiredAuthToken => "Срок действия токена истёк",
            ErrorCode::InvalidAuthToken => "Недействительный токен",

            ErrorCode::NotEnoughPermission => "У вас нет прав для этого действия",

            ErrorCode::UserNotFound => "Пользователь не найден",
            ErrorCode::DefectNotFound => "Дефект не найден",
            ErrorCode::AssigneeNotFound => "Исполнитель не найден",

            ErrorCode::StorageFailure => "Ошибка при сохранении файла",
            ErrorCode::DatabaseError => "Ошибка базы данных",
            ErrorCode::InternalError => "Внутренняя ошибка сервера",
            ErrorCode::TokenGenerationFailed => "Не удалось выпустить токен",
        }
    }

    pub fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            ErrorCode::ValidationError
            | ErrorCode::DuplicateUsername
            | ErrorCode::DuplicateEmail
            | ErrorCode::InvalidCredentials
            | ErrorCode::InvalidStatus
            | ErrorCode::InvalidRole
            | ErrorCode::EmptyComment
            | ErrorCode::NotRefreshToken
            | ErrorCode::InvalidRefreshToken => StatusCode::BAD_REQUEST,

            ErrorCode::AuthenticationFailed
            | ErrorCode::ExpiredAuthToken
            | ErrorCode::InvalidAuthToken => StatusCode::UNAUTHORIZED,

            ErrorCode::NotEnoughPermission => StatusCode::FORBIDDEN,

            ErrorCode::UserNotFound | ErrorCode::DefectNotFound | ErrorCode::AssigneeNotFound => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::StorageFailure
            | ErrorCode::DatabaseError
            | ErrorCode::InternalError
            | ErrorCode::TokenGenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ApiError(ErrorCode, Option<String>),
    #[error("Проверка данных не пройдена")]
    ValidationError(Vec<ValidationFieldError>),
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: String) -> Self {
        AppError::ApiError(code, Some(detail))
    }

    pub fn bad_request(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn unauthorized(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn forbidden(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn not_found(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn internal_error(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        log::error!("ошибка запроса к базе данных: {}", err);
        AppError::new(ErrorCode::DatabaseError)
    }
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<ValidationFieldError>>,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::ApiError(code, detail) => {
                let response = ErrorResponse {
                    code: format!("{:?}", code),
                    message: code.message().to_string(),
                    detail: detail.clone(),
                    errors: None,
                };

                HttpResponse::build(code.status_code()).json(response)
            }
            AppError::ValidationError(errors) => {
                let response = ErrorResponse {
                    code: format!("{:?}", ErrorCode::ValidationError),
                    message: ErrorCode::ValidationError.message().to_string(),
                    detail: None,
                    errors: Some(errors.clone()),
                };

                HttpResponse::build(ErrorCode::ValidationError.status_code()).json(response)
            }
        }
    }
}

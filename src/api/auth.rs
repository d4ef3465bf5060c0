use actix_web::{HttpResponse, get, post, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::auth::CurrentUser;
use crate::auth::jwt::{
    JwtUtils, TokenVerifyResult, build_access_token_cookie, build_refresh_token_cookie,
    build_removal_cookie,
};
use crate::entity::user::{self, Entity as UserEntity, Role};
use crate::model::auth::{LoginRequest, RegisterRequest, UserResponse};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};

#[post("/auth/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    validate_register_request(&body)?;

    let role = match body.role.as_deref().filter(|r| !r.is_empty()) {
        None => Role::Engineer,
        Some(raw) => Role::parse(raw).ok_or_else(|| AppError::bad_request(ErrorCode::InvalidRole))?,
    };

    let txn = db.begin().await?;

    // Duplicate checks run inside the transaction so the unique indexes
    // are the last line of defense, not the first.
    let username_taken = UserEntity::find()
        .filter(user::Column::Username.eq(&body.username))
        .one(&txn)
        .await?
        .is_some();
    if username_taken {
        return Err(AppError::bad_request(ErrorCode::DuplicateUsername));
    }

    let email_taken = UserEntity::find()
        .filter(user::Column::Email.eq(&body.email))
        .one(&txn)
        .await?
        .is_some();
    if email_taken {
        return Err(AppError::bad_request(ErrorCode::DuplicateEmail));
    }

    let hashed_password = hash(&body.password, DEFAULT_COST)
        .map_err(|_| AppError::internal_error(ErrorCode::InternalError))?;

    let new_user = user::ActiveModel {
        username: Set(body.username.clone()),
        email: Set(body.email.clone()),
        password_hash: Set(hashed_password),
        role: Set(role),
        full_name: Set(body.full_name.trim().to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let user = new_user.insert(&txn).await?;

    let access_token = JwtUtils::generate_token(user.id, user.role.as_str())
        .map_err(|_| AppError::internal_error(ErrorCode::TokenGenerationFailed))?;
    let refresh_token_str = JwtUtils::generate_refresh_token(user.id)
        .map_err(|_| AppError::internal_error(ErrorCode::TokenGenerationFailed))?;

    txn.commit().await?;

    Ok(HttpResponse::Created()
        .cookie(build_access_token_cookie(&access_token))
        .cookie(build_refresh_token_cookie(&refresh_token_str))
        .json(UserResponse::from(user)))
}

#[post("/auth/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserEntity::find()
        .filter(user::Column::Username.eq(&body.username))
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::bad_request(ErrorCode::InvalidCredentials))?;

    let is_valid = verify(&body.password, &user.password_hash)
        .map_err(|_| AppError::internal_error(ErrorCode::InternalError))?;

    if !is_valid || !user.is_active {
        return Err(AppError::bad_request(ErrorCode::InvalidCredentials));
    }

    let access_token = JwtUtils::generate_token(user.id, user.role.as_str())
        .map_err(|_| AppError::internal_error(ErrorCode::TokenGenerationFailed))?;
    let refresh_token_str = JwtUtils::generate_refresh_token(user.id)
        .map_err(|_| AppError::internal_error(ErrorCode::TokenGenerationFailed))?;

    Ok(HttpResponse::Ok()
        .cookie(build_access_token_cookie(&access_token))
        .cookie(build_refresh_token_cookie(&refresh_token_str))
        .json(UserResponse::from(user)))
}

#[post("/auth/refresh")]
pub async fn refresh_token(
    req: actix_web::HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let refresh_token_cookie = req
        .cookie("refreshToken")
        .ok_or_else(|| AppError::unauthorized(ErrorCode::InvalidAuthToken))?;

    match JwtUtils::verify_token(refresh_token_cookie.value()) {
        TokenVerifyResult::Valid(claims) => {
            if claims.role != "refresh" {
                return Err(AppError::unauthorized(ErrorCode::NotRefreshToken));
            }

            let user_id = claims
                .sub
                .parse::<i32>()
                .map_err(|_| AppError::internal_error(ErrorCode::InternalError))?;

            let user = UserEntity::find_by_id(user_id)
                .one(db.get_ref())
                .await?
                .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound))?;

            let new_access_token = JwtUtils::generate_token(user.id, user.role.as_str())
                .map_err(|_| AppError::internal_error(ErrorCode::TokenGenerationFailed))?;

            Ok(HttpResponse::Ok()
                .cookie(build_access_token_cookie(&new_access_token))
                .finish())
        }
        TokenVerifyResult::Expired | TokenVerifyResult::Invalid => {
            Err(AppError::unauthorized(ErrorCode::InvalidRefreshToken))
        }
    }
}

#[post("/auth/logout")]
pub async fn logout() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok()
        .cookie(build_removal_cookie("accessToken"))
        .cookie(build_removal_cookie("refreshToken"))
        .finish())
}

#[get("/auth/me")]
pub async fn get_me(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
) -> Result<HttpResponse, AppError> {
    let user = UserEntity::find_by_id(current_user.id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

fn validate_register_request(body: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if body.username.trim().is_empty() {
        errors.push(ValidationFieldError {
            field: "username".to_string(),
            message: "Логин обязателен".to_string(),
        });
    }

    if body.email.trim().is_empty() {
        errors.push(ValidationFieldError {
            field: "email".to_string(),
            message: "Email обязателен".to_string(),
        });
    } else if !body.email.contains('@') {
        errors.push(ValidationFieldError {
            field: "email".to_string(),
            message: "Неверный формат email".to_string(),
        });
    }

    if body.password.len() < 8 {
        errors.push(ValidationFieldError {
            field: "password".to_string(),
            message: "Пароль должен содержать не менее 8 символов".to_string(),
        });
    }

    if body.full_name.trim().is_empty() {
        errors.push(ValidationFieldError {
            field: "full_name".to_string(),
            message: "Имя обязательно".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str, full_name: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            role: None,
        }
    }

    #[test]
    fn register_validation_collects_all_errors() {
        let err =
            validate_register_request(&request("", "not-an-email", "short", " ")).unwrap_err();
        match err {
            AppError::ValidationError(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["username", "email", "password", "full_name"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn register_validation_accepts_complete_request() {
        let ok = request("ivanov", "ivanov@example.com", "secret-password", "Иванов И. И.");
        assert!(validate_register_request(&ok).is_ok());
    }
}

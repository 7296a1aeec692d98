//! Login, registration and profile commands.

use secrecy::SecretString;

use marketstall_storefront::models::{ProfilePatch, Registration};
use marketstall_storefront::services::{AuthService, UserCatalog};
use marketstall_storefront::{AppError, AppState, Notice};

use super::notify;

/// Log in and persist the session.
///
/// # Errors
///
/// Returns an error for bad credentials or a storage failure.
pub async fn login(state: &AppState, email: &str, password: &SecretString) -> Result<(), AppError> {
    let user = AuthService::new(state).login(email, password).await?;
    notify(&Notice::success(format!("{}님, 환영합니다.", user.nickname)));
    Ok(())
}

/// Log out and clear session-scoped state.
pub async fn logout(state: &AppState) {
    AuthService::new(state).logout().await;
    notify(&Notice::success("로그아웃되었습니다."));
}

/// Create an account. The new user still has to log in.
///
/// # Errors
///
/// Returns an error for invalid or duplicate fields, or a storage failure.
pub async fn register(state: &AppState, registration: &Registration) -> Result<(), AppError> {
    let user = AuthService::new(state).register(registration).await?;
    notify(&Notice::success(format!("회원가입이 완료되었습니다. ({})", user.id)));
    Ok(())
}

/// Print the logged-in user.
pub async fn whoami(state: &AppState) {
    match AuthService::new(state).current_user().await {
        Some(user) => {
            println!("{} <{}> [{}]", user.nickname, user.email, user.id);
            if !user.name.is_empty() {
                println!("  name:    {}", user.name);
            }
            if !user.basic_address.is_empty() {
                println!(
                    "  address: ({}) {} {}",
                    user.postal_code, user.basic_address, user.detail_address
                );
            }
        }
        None => notify(&Notice::info("로그인하지 않았습니다.")),
    }
}

/// Report whether `password` matches the logged-in user's.
pub async fn check_password(state: &AppState, password: &SecretString) {
    if AuthService::new(state).check_password(password).await {
        notify(&Notice::success("비밀번호가 확인되었습니다."));
    } else {
        notify(&Notice::error("비밀번호가 일치하지 않습니다."));
    }
}

/// Report whether an email is free to register.
pub async fn check_email(state: &AppState, email: &str) {
    if UserCatalog::new(state).check_email_availability(email).await {
        notify(&Notice::success("사용 가능한 이메일입니다."));
    } else {
        notify(&Notice::warning("이미 사용 중인 이메일입니다."));
    }
}

/// Report whether a nickname is free to register.
pub async fn check_nickname(state: &AppState, nickname: &str) {
    if UserCatalog::new(state).check_nickname_availability(nickname).await {
        notify(&Notice::success("사용 가능한 닉네임입니다."));
    } else {
        notify(&Notice::warning("이미 사용 중인 닉네임입니다."));
    }
}

/// Apply a profile patch to the logged-in user.
///
/// # Errors
///
/// Returns an error if not logged in or storage fails.
pub async fn update_profile(state: &AppState, patch: &ProfilePatch) -> Result<(), AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("변경할 항목이 없습니다.".to_string()));
    }
    AuthService::new(state).update_user_profile(patch).await?;
    notify(&Notice::success("회원 정보가 수정되었습니다."));
    Ok(())
}

//! Unified error handling.
//!
//! Provides a unified `AppError` type and its mapping onto user-facing
//! [`Notice`]s. Front ends should return `Result<T, AppError>` and show
//! `err.notice()` rather than the error's `Display` output.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::fixtures::FixtureError;
use crate::image::ImageError;
use crate::services::{AuthError, CartError, CatalogError};
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Bad input from the front end.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Storage,
    Session,
    Internal,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient message for the user (a toast in a browser front end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

impl AppError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(err) => auth_kind(err),
            Self::Catalog(err) => catalog_kind(err),
            Self::Cart(err) => match err {
                CartError::AlreadyInCart(_) | CartError::NothingSelected => ErrorKind::Validation,
                CartError::NotInCart(_) => ErrorKind::NotFound,
                CartError::Auth(err) => auth_kind(err),
                CartError::Catalog(err) => catalog_kind(err),
                CartError::Storage(_) => ErrorKind::Storage,
            },
            Self::Storage(_) | Self::Fixture(_) => ErrorKind::Storage,
            Self::Image(_) | Self::BadRequest(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// User-facing notice. Storage and fixture details are not exposed.
    #[must_use]
    pub fn notice(&self) -> Notice {
        let message = match self {
            Self::Auth(err) => auth_message(err),
            Self::Catalog(err) => catalog_message(err),
            Self::Cart(err) => match err {
                CartError::AlreadyInCart(_) => "이미 장바구니에 담긴 상품입니다.".to_string(),
                CartError::NotInCart(_) => "장바구니에 없는 상품입니다.".to_string(),
                CartError::NothingSelected => "구매할 상품을 선택해주세요.".to_string(),
                CartError::Auth(err) => auth_message(err),
                CartError::Catalog(err) => catalog_message(err),
                CartError::Storage(_) => STORAGE_MESSAGE.to_string(),
            },
            Self::Storage(_) | Self::Fixture(_) => STORAGE_MESSAGE.to_string(),
            Self::Image(err) => match err {
                ImageError::TooLarge { .. } => "이미지 크기가 너무 큽니다.".to_string(),
                ImageError::Io(_) => "이미지를 읽을 수 없습니다.".to_string(),
                ImageError::Empty | ImageError::UnsupportedType(_) => {
                    "지원하지 않는 이미지 형식입니다.".to_string()
                }
            },
            Self::Config(_) => "설정을 불러오지 못했습니다.".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        match self.kind() {
            ErrorKind::Storage | ErrorKind::Internal => Notice::error(message),
            ErrorKind::NotFound | ErrorKind::Validation | ErrorKind::Session => {
                Notice::warning(message)
            }
        }
    }
}

const STORAGE_MESSAGE: &str = "데이터를 처리하는 중 문제가 발생했습니다.";

const fn auth_kind(err: &AuthError) -> ErrorKind {
    match err {
        AuthError::NotLoggedIn => ErrorKind::Session,
        AuthError::UserNotFound => ErrorKind::NotFound,
        AuthError::Storage(_) => ErrorKind::Storage,
        AuthError::InvalidEmail(_)
        | AuthError::InvalidCredentials
        | AuthError::EmailTaken
        | AuthError::NicknameTaken
        | AuthError::InvalidNickname
        | AuthError::WeakPassword => ErrorKind::Validation,
    }
}

const fn catalog_kind(err: &CatalogError) -> ErrorKind {
    match err {
        CatalogError::NotFound(_) => ErrorKind::NotFound,
        CatalogError::NotOwner(_) | CatalogError::ReadOnly(_) | CatalogError::InvalidProduct(_) => {
            ErrorKind::Validation
        }
        CatalogError::Auth(err) => auth_kind(err),
        CatalogError::Storage(_) => ErrorKind::Storage,
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidEmail(_) => "올바른 이메일 형식이 아닙니다.".to_string(),
        AuthError::InvalidCredentials => "이메일 또는 비밀번호가 일치하지 않습니다.".to_string(),
        AuthError::EmailTaken => "이미 사용 중인 이메일입니다.".to_string(),
        AuthError::NicknameTaken => "이미 사용 중인 닉네임입니다.".to_string(),
        AuthError::InvalidNickname => "닉네임을 입력해주세요.".to_string(),
        AuthError::WeakPassword => "비밀번호를 입력해주세요.".to_string(),
        AuthError::NotLoggedIn => "로그인이 필요합니다.".to_string(),
        AuthError::UserNotFound => "사용자 정보를 찾을 수 없습니다.".to_string(),
        AuthError::Storage(_) => STORAGE_MESSAGE.to_string(),
    }
}

fn catalog_message(err: &CatalogError) -> String {
    match err {
        CatalogError::NotFound(_) => "상품을 찾을 수 없습니다.".to_string(),
        CatalogError::NotOwner(_) => "판매자만 수정할 수 있습니다.".to_string(),
        CatalogError::ReadOnly(_) => "기본 상품은 수정할 수 없습니다.".to_string(),
        CatalogError::InvalidProduct(msg) => msg.clone(),
        CatalogError::Auth(err) => auth_message(err),
        CatalogError::Storage(_) => STORAGE_MESSAGE.to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

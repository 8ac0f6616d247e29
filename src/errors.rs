use thiserror::Error;

use crate::domain::errors::DomainError;

/// What the user gets told. Validation problems keep their detail; remote
/// and storage failures collapse into one generic notice and the detail
/// stays in the logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please sign in to continue")]
    SignInRequired,

    #[error("You are not allowed to do that")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Rejected(String),

    #[error("Something went wrong, please try again")]
    Failure,
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotAuthenticated => AppError::SignInRequired,
            DomainError::Forbidden(_) => AppError::Forbidden,
            DomainError::NotFound => AppError::NotFound,
            DomainError::InvalidInput(msg) => AppError::Rejected(msg),
            e @ (DomainError::InvalidTransition { .. }
            | DomainError::EmptyCart
            | DomainError::CheckoutRejected(_)
            | DomainError::InvalidLineItems(_)) => AppError::Rejected(e.to_string()),
            e @ (DomainError::Remote { .. } | DomainError::Storage(_)) => {
                log::error!("{}", e);
                AppError::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn failure_display_is_generic() {
        assert_eq!(
            AppError::Failure.to_string(),
            "Something went wrong, please try again"
        );
    }

    #[test]
    fn remote_errors_collapse_to_failure() {
        let app_err: AppError = DomainError::Remote {
            status: Some(500),
            message: "stack trace".to_string(),
        }
        .into();
        assert!(matches!(app_err, AppError::Failure));

        let app_err: AppError = DomainError::Storage("disk full".to_string()).into();
        assert!(matches!(app_err, AppError::Failure));
    }

    #[test]
    fn invalid_input_keeps_its_message() {
        let app_err: AppError =
            DomainError::InvalidInput("passwords do not match".to_string()).into();
        assert_eq!(app_err.to_string(), "passwords do not match");
    }

    #[test]
    fn transition_errors_are_rejections() {
        let app_err: AppError = DomainError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Canceled,
        }
        .into();
        assert_eq!(app_err.to_string(), "Cannot move order from completed to canceled");
    }

    #[test]
    fn auth_errors_map_directly() {
        assert!(matches!(
            AppError::from(DomainError::NotAuthenticated),
            AppError::SignInRequired
        ));
        assert!(matches!(
            AppError::from(DomainError::Forbidden("admin only".to_string())),
            AppError::Forbidden
        ));
        assert!(matches!(AppError::from(DomainError::NotFound), AppError::NotFound));
    }
}

use super::app_error::AppError;

pub(super) fn map_database_error(code: Option<&str>, message: &str) -> Option<AppError> {
    match code {
        Some("23505") => Some(AppError::Conflict("request already exists".to_string())),
        Some("23502") => Some(AppError::validation_error(
            required_field_message_from_db(message)
                .unwrap_or_else(|| "required field is missing".to_string()),
        )),
        Some("23503") => Some(AppError::BadRequest(
            "referenced request does not exist".to_string(),
        )),
        Some("23514") => Some(AppError::validation_error(
            "request violates validation rules",
        )),
        Some("22P02") | Some("22003") => Some(AppError::validation_error("invalid input format")),
        Some("40001") | Some("40P01") => Some(AppError::Conflict(
            "Request queue changed concurrently. Please try again.".to_string(),
        )),
        Some("55P03") => Some(AppError::Conflict(
            "Request is currently locked. Please try again.".to_string(),
        )),
        Some("08000") | Some("08001") | Some("08003") | Some("08006") => {
            Some(AppError::store_unavailable(
                "Unable to connect to database. Please try again later.",
            ))
        }
        Some("53300") | Some("57P01") => Some(AppError::store_unavailable(
            "Service temporarily unavailable. Please try again later.",
        )),
        _ => None,
    }
}

fn required_field_message_from_db(message: &str) -> Option<String> {
    let marker = "column \"";
    let start = message.find(marker)?;
    let rest = &message[start + marker.len()..];
    let end = rest.find('"')?;
    let field = &rest[..end];
    Some(format!("{field} is required"))
}

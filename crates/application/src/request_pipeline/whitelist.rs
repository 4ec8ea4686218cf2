use super::*;

/// Rejects payload fields the model does not declare as writable.
///
/// `_id` and `code` are identity, not content, and always pass. Every
/// offending field is reported along with the allowed list.
pub fn whitelist_fields(payload: &Map<String, Value>, model: &ModelDescriptor) -> AppResult<()> {
    let allowed = model.writable_fields();
    let invalid = payload
        .keys()
        .map(String::as_str)
        .filter(|field| !matches!(*field, "_id" | "code") && !allowed.contains(field))
        .collect::<Vec<_>>();

    if invalid.is_empty() {
        return Ok(());
    }

    Err(AppError::Validation(
        Rejection::new(Message::new(MessageKey::InvalidFields).with("allowed", allowed.join(", ")))
            .with_invalid(InvalidKind::Fields, json!(invalid)),
    ))
}

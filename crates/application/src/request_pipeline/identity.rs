use super::*;

impl RequestPipeline {
    /// Checks the identity fields of a PATCH or DELETE body and resolves the target.
    ///
    /// All body problems are reported together as `invalidIdentity` (400)
    /// before any lookup. A missing target is `modelNotFound` (404); a stored
    /// `mandatory_field` value that differs from the body is
    /// `mandatoryKeyMismatch` (400) with the stored document attached.
    pub async fn resolve_identity(
        &self,
        model: &ModelDescriptor,
        body: &Map<String, Value>,
        path_key: &str,
        mandatory_field: Option<&str>,
    ) -> AppResult<Document> {
        let body_id = body.get("_id").map(scalar_text);
        let body_code = body.get("code").map(scalar_text);
        let mut messages = Vec::new();

        if body_id.is_none() && body_code.is_none() {
            messages.push(Message::new(MessageKey::KeyNotFound));
        }
        if body_id.is_some() && body_code.is_some() {
            messages.push(Message::new(MessageKey::BothKeysProvided));
        }
        if let Some(body_id) = body_id.as_deref()
            && body_id != path_key
        {
            messages.push(
                Message::new(MessageKey::IdMismatch)
                    .with("bodyId", body_id)
                    .with("pathKey", path_key),
            );
        }
        if let Some(body_code) = body_code.as_deref()
            && body_code != path_key
        {
            messages.push(
                Message::new(MessageKey::CodeMismatch)
                    .with("bodyCode", body_code)
                    .with("pathKey", path_key),
            );
        }
        if body_id.is_some() && !EntityId::is_well_formed(path_key) {
            messages.push(Message::new(MessageKey::InvalidId).with("id", path_key));
        }
        if let Some(field) = mandatory_field
            && !is_truthy(body.get(field))
        {
            messages.push(Message::new(MessageKey::MandatoryKeyMissing).with("field", field));
        }

        if !messages.is_empty() {
            return Err(AppError::Validation(
                Rejection::new(Message::new(MessageKey::InvalidIdentity)).with_messages(messages),
            ));
        }

        let (key_kind, lookup) = match EntityId::parse(path_key) {
            Some(id) if body_id.is_some() => ("_id", Filter::eq("_id", id.as_str())),
            _ => ("code", Filter::eq("code", path_key)),
        };
        let document = self
            .store
            .find_one(model.collection, &lookup)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    Message::new(MessageKey::ModelNotFound)
                        .with("model", model.name)
                        .with("keyKind", key_kind)
                        .with("key", path_key),
                )
            })?;

        if let Some(field) = mandatory_field {
            let stored = document.get(field).map(scalar_text);
            let supplied = body.get(field).map(scalar_text);
            if stored.as_deref().map(str::trim) != supplied.as_deref().map(str::trim) {
                return Err(AppError::Validation(
                    Rejection::new(
                        Message::new(MessageKey::MandatoryKeyMismatch)
                            .with("field", field)
                            .with("model", model.name),
                    )
                    .with_attachment(model.name, model.public_document(document.fields())),
                ));
            }
        }

        Ok(document)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|number| number != 0.0),
        Some(_) => true,
    }
}

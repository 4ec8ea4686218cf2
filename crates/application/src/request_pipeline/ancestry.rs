use super::*;

impl RequestPipeline {
    /// Resolves an ancestor named in a request path.
    ///
    /// An unknown key is `relatedNotFound` (404).
    pub async fn resolve_related(
        &self,
        ancestor: &ModelDescriptor,
        key: &str,
    ) -> AppResult<Document> {
        self.store
            .find_one(ancestor.collection, &key_filter(key))
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    Message::new(MessageKey::RelatedNotFound)
                        .with("model", ancestor.name)
                        .with("key", key),
                )
            })
    }

    /// Resolves the ancestor keys of a nested path, root first, and returns the
    /// nearest ancestor.
    ///
    /// `ancestor_keys` addresses the closest ancestors of `model`: one key names
    /// the parent, two keys name the grandparent then the parent. Every hop
    /// after the first must belong to the previous one.
    pub async fn resolve_lineage(
        &self,
        model: &ModelDescriptor,
        ancestor_keys: &[&str],
    ) -> AppResult<Option<Document>> {
        let mut links = Vec::new();
        let mut current = model;
        while let Some(link) = current.parent {
            links.push(link);
            current = link.model;
        }
        if ancestor_keys.len() > links.len() {
            return Err(AppError::Internal(format!(
                "{} has {} ancestors but {} keys were given",
                model.name,
                links.len(),
                ancestor_keys.len()
            )));
        }

        // `links[i]` is the edge whose parent is the i-th closest ancestor.
        let depth = ancestor_keys.len();
        let mut resolved: Option<Document> = None;
        for (index, key) in ancestor_keys.iter().enumerate() {
            let link = links[depth - 1 - index];
            let ancestor = self.resolve_related(link.model, key).await?;
            if let Some(previous) = resolved.as_ref()
                && let Some(upward) = link.model.parent
            {
                self.verify_ownership(link.model, &ancestor, &upward, previous)
                    .await?;
            }
            resolved = Some(ancestor);
        }

        Ok(resolved)
    }

    /// Checks that `child` belongs to `ancestor` through `link`.
    ///
    /// A mismatch is `relatedMismatch` (404) carrying the ancestor the child
    /// actually belongs to as `expected` and the requested one as `provided`.
    pub async fn verify_ownership(
        &self,
        child_model: &ModelDescriptor,
        child: &Document,
        link: &ParentLink,
        ancestor: &Document,
    ) -> AppResult<()> {
        let owner = child.get(link.foreign_key).and_then(Value::as_str);
        if owner.is_some() && owner == ancestor.id() {
            return Ok(());
        }

        let expected = match owner {
            Some(owner) => self
                .store
                .find_one(link.model.collection, &Filter::eq("_id", owner))
                .await?
                .map(|document| link.model.public_document(document.fields()))
                .unwrap_or_else(|| json!({ "_id": owner })),
            None => Value::Null,
        };

        Err(AppError::NotFound(
            Rejection::new(
                Message::new(MessageKey::RelatedMismatch)
                    .with("model", child_model.name)
                    .with("key", child.id().unwrap_or_default())
                    .with("ancestor", link.model.name),
            )
            .with_attachment("expected", expected)
            .with_attachment("provided", link.model.public_document(ancestor.fields())),
        ))
    }
}
